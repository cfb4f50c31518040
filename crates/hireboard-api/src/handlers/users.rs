//! User account handlers: registration, login/logout, profile.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;
use validator::{Validate, ValidateEmail};

use hireboard_models::{
    ArtifactRef, CompanyId, Profile, Role, UserAccount, UserId,
};
use hireboard_store::{CompanyRepository, ProfilePatch, UserRepository};

use crate::auth::{CurrentUser, TOKEN_COOKIE};
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::uploads::{read_file_field, read_text_field, IMAGE_CONTENT_TYPES, RESUME_CONTENT_TYPES};

/// Account view returned to API clients. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub profile: Profile,
    pub company_ids: Vec<CompanyId>,
    pub created_at: String,
}

impl From<&UserAccount> for UserView {
    fn from(user: &UserAccount) -> Self {
        Self {
            id: user.id.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            profile: user.profile.clone(),
            company_ids: user.company_ids.clone(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "full_name must be 1-100 characters"))]
    pub full_name: String,

    #[validate(email(message = "email must be a valid address"))]
    pub email: String,

    #[validate(length(min = 5, max = 20, message = "phone must be 5-20 characters"))]
    pub phone: String,

    #[validate(length(min = 8, max = 72, message = "password must be 8-72 characters"))]
    pub password: String,

    pub role: String,
}

/// Register a new account.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserView>>)> {
    request
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let role = Role::parse(&request.role)
        .ok_or_else(|| ApiError::validation("role must be 'seeker' or 'recruiter'"))?;

    let password_hash = hash_password(request.password, state.config.bcrypt_cost).await?;

    let now = Utc::now();
    let user = UserAccount {
        id: UserId::new(),
        full_name: request.full_name,
        email: request.email.trim().to_lowercase(),
        phone: request.phone,
        password_hash,
        role,
        profile: Profile::default(),
        company_ids: Vec::new(),
        saved_job_ids: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    UserRepository::new(state.store.clone()).create(&user).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            "Account registered successfully",
            UserView::from(&user),
        )),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub user: UserView,
    /// Also usable as a bearer token by non-browser clients.
    pub token: String,
}

/// Authenticate and open a session.
///
/// Sets an httpOnly, SameSite=Strict session cookie; the token is also
/// returned in the body for bearer use.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<ApiResponse<LoginData>>)> {
    let role = Role::parse(&request.role)
        .ok_or_else(|| ApiError::validation("role must be 'seeker' or 'recruiter'"))?;

    let users = UserRepository::new(state.store.clone());
    let user = users
        .find_by_email(request.email.trim().to_lowercase().as_str())
        .await?
        .ok_or_else(|| ApiError::unauthenticated("Incorrect email or password"))?;

    let matches = verify_password(request.password, user.password_hash.clone()).await?;
    if !matches {
        return Err(ApiError::unauthenticated("Incorrect email or password"));
    }

    if user.role != role {
        return Err(ApiError::unauthenticated(
            "No account exists with this email for the selected role",
        ));
    }

    // Denormalize owned company names into the token (informational only).
    let companies = CompanyRepository::new(state.store.clone())
        .get_many(&user.company_ids)
        .await?;
    let organizations = companies.into_iter().map(|c| c.name).collect();

    let token = state.tokens.issue(&user.id, organizations)?;

    let mut cookie = Cookie::new(TOKEN_COOKIE, token.clone());
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookie.set_secure(state.config.is_production());
    cookie.set_max_age(time::Duration::seconds(
        state.config.token_expiry.as_secs() as i64,
    ));

    let data = LoginData {
        user: UserView::from(&user),
        token,
    };

    Ok((
        jar.add(cookie),
        Json(ApiResponse::ok_with_message(
            format!("Welcome back, {}", data.user.full_name),
            data,
        )),
    ))
}

/// Close the session by clearing the cookie.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<()>>) {
    let mut cookie = Cookie::from(TOKEN_COOKIE);
    cookie.set_path("/");

    (
        jar.remove(cookie),
        Json(ApiResponse::message("Logged out successfully")),
    )
}

/// Get the authenticated account's profile.
pub async fn get_profile(
    CurrentUser(user): CurrentUser,
) -> Json<ApiResponse<UserView>> {
    Json(ApiResponse::ok(UserView::from(&user)))
}

/// Update the authenticated account's profile (multipart).
///
/// Text fields: `full_name`, `email`, `phone`, `bio`, `skills` (comma
/// separated). File fields: `resume` (PDF), `photo` (image). Replacing a
/// stored artifact releases the previous object.
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<Json<ApiResponse<UserView>>> {
    let mut patch = ProfilePatch::default();
    let mut replaced: Vec<ArtifactRef> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("full_name") => patch.full_name = Some(read_text_field(field).await?),
            Some("email") => {
                let email = read_text_field(field).await?.trim().to_lowercase();
                if !email.validate_email() {
                    return Err(ApiError::validation("email must be a valid address"));
                }
                patch.email = Some(email);
            }
            Some("phone") => patch.phone = Some(read_text_field(field).await?),
            Some("bio") => patch.bio = Some(read_text_field(field).await?),
            Some("skills") => {
                let raw = read_text_field(field).await?;
                patch.skills = Some(
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                );
            }
            Some("resume") => {
                let file = read_file_field(field, RESUME_CONTENT_TYPES).await?;
                let artifact = state
                    .storage
                    .upload_artifact(file.bytes, "resumes", &file.content_type)
                    .await?;
                if let Some(ref old) = user.profile.resume {
                    replaced.push(old.clone());
                }
                patch.resume = Some(artifact);
                patch.resume_original_name = file.file_name;
            }
            Some("photo") => {
                let file = read_file_field(field, IMAGE_CONTENT_TYPES).await?;
                let artifact = state
                    .storage
                    .upload_artifact(file.bytes, "photos", &file.content_type)
                    .await?;
                if let Some(ref old) = user.profile.photo {
                    replaced.push(old.clone());
                }
                patch.photo = Some(artifact);
            }
            _ => continue,
        }
    }

    let updated = UserRepository::new(state.store.clone())
        .update_profile(&user.id, patch)
        .await?
        .ok_or_else(|| ApiError::unauthenticated("Account no longer exists"))?;

    // Release replaced artifacts only after the update is durable.
    for artifact in replaced {
        if let Err(e) = state.storage.delete_object(&artifact.public_id).await {
            warn!("Failed to release replaced artifact {}: {}", artifact.public_id, e);
        }
    }

    Ok(Json(ApiResponse::ok_with_message(
        "Profile updated",
        UserView::from(&updated),
    )))
}

async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::upstream(format!("Hashing task failed: {}", e)))?
        .map_err(|e| ApiError::upstream(format!("Password hashing failed: {}", e)))
}

async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::upstream(format!("Hashing task failed: {}", e)))?
        .map_err(|e| ApiError::upstream(format!("Password verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_view_never_carries_the_password_hash() {
        let now = Utc::now();
        let user = UserAccount {
            id: UserId::from_string("u-1"),
            full_name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: "123456".to_string(),
            password_hash: "$2b$10$secret".to_string(),
            role: Role::Seeker,
            profile: Profile::default(),
            company_ids: vec![],
            saved_job_ids: vec![],
            created_at: now,
            updated_at: now,
        };

        let rendered = serde_json::to_string(&UserView::from(&user)).unwrap();
        assert!(!rendered.contains("password"));
        assert!(!rendered.contains("$2b$10$secret"));
        assert!(rendered.contains("ada@example.com"));
    }

    #[test]
    fn register_request_validation_catches_bad_input() {
        let bad_email = RegisterRequest {
            full_name: "Ada".to_string(),
            email: "not-an-email".to_string(),
            phone: "123456".to_string(),
            password: "long-enough".to_string(),
            role: "seeker".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            full_name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: "123456".to_string(),
            password: "short".to_string(),
            role: "seeker".to_string(),
        };
        assert!(short_password.validate().is_err());
    }

    #[tokio::test]
    async fn password_hash_round_trip() {
        // Cost 4 keeps the test fast; production cost comes from config.
        let hash = hash_password("hunter22".to_string(), 4).await.unwrap();
        assert!(verify_password("hunter22".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
    }
}
