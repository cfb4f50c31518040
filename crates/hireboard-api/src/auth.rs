//! Session token service and authentication/authorization gates.

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use hireboard_models::{Role, UserAccount, UserId};
use hireboard_store::UserRepository;

use crate::error::ApiError;
use crate::state::AppState;

/// Name of the session cookie.
pub const TOKEN_COOKIE: &str = "token";

/// Signed session claims.
///
/// `organizations` is denormalized at issuance and informational only;
/// authorization always re-checks ownership from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Names of companies owned at issuance
    #[serde(default)]
    pub organizations: Vec<String>,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// HS256 session token service with a process-wide secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

impl TokenService {
    pub fn new(secret: &str, expiry: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry,
        }
    }

    /// Issue a signed token for a user.
    pub fn issue(&self, user_id: &UserId, organizations: Vec<String>) -> Result<String, ApiError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.as_str().to_string(),
            organizations,
            iat: now,
            exp: now + self.expiry.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::upstream(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token's signature and expiry.
    ///
    /// Every failure collapses to a generic `Unauthenticated`; the
    /// cryptographic detail is logged at debug level, never returned.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                debug!("Token verification failed: {}", e);
                Err(ApiError::unauthenticated("Invalid or expired token"))
            }
        }
    }
}

/// Extract the raw session token from request headers.
///
/// The `token` cookie is preferred; a `Bearer` authorization header is the
/// fallback for non-browser clients.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Authenticated account attached to the request.
///
/// Loading is read-only and idempotent; a valid token whose subject no
/// longer exists is treated as unauthenticated, not as a missing resource.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserAccount);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthenticated("Authentication required"))?;

        let claims = state.tokens.verify(&token)?;

        let users = UserRepository::new(state.store.clone());
        let user = users
            .get(&UserId::from_string(claims.sub))
            .await?
            .ok_or_else(|| ApiError::unauthenticated("Invalid or expired token"))?;

        Ok(CurrentUser(user))
    }
}

/// Pure role membership test. Single role per account, no hierarchy.
pub fn authorize(role: Role, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Your account role is not allowed to perform this action",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn issued_tokens_verify_and_carry_claims() {
        let svc = service();
        let user_id = UserId::from_string("user-1");
        let token = svc
            .issue(&user_id, vec!["Acme".to_string(), "Globex".to_string()])
            .unwrap();

        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.organizations, vec!["Acme", "Globex"]);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_tokens_are_rejected_generically() {
        // Zero lifetime makes the token expired at issuance (jsonwebtoken
        // applies default leeway, so push iat/exp well into the past).
        let svc = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            organizations: vec![],
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let err = svc.verify(&token).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let svc = service();
        let other = TokenService::new("other-secret", Duration::from_secs(3600));
        let token = other.issue(&UserId::from_string("user-1"), vec![]).unwrap();

        assert!(matches!(
            svc.verify(&token),
            Err(ApiError::Unauthenticated(_))
        ));
        assert!(matches!(
            svc.verify("not-a-token"),
            Err(ApiError::Unauthenticated(_))
        ));
    }

    #[test]
    fn cookie_is_preferred_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("token=cookie-token; other=x"),
        );
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));

        assert_eq!(extract_token(&headers).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn bearer_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
        assert_eq!(extract_token(&headers).as_deref(), Some("header-token"));

        let empty = HeaderMap::new();
        assert_eq!(extract_token(&empty), None);

        let mut malformed = HeaderMap::new();
        malformed.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&malformed), None);
    }

    #[test]
    fn authorize_is_exact_membership() {
        assert!(authorize(Role::Recruiter, &[Role::Recruiter]).is_ok());
        assert!(authorize(Role::Seeker, &[Role::Seeker, Role::Recruiter]).is_ok());
        assert!(matches!(
            authorize(Role::Seeker, &[Role::Recruiter]),
            Err(ApiError::Forbidden(_))
        ));
    }
}
