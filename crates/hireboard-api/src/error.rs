//! API error types and the JSON error envelope.

use std::sync::OnceLock;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Whether the process runs in development mode. Controls error detail
/// exposure; set once at startup.
static DEV_MODE: OnceLock<bool> = OnceLock::new();

/// Record the development flag. Called from `main` before serving.
pub fn init(dev: bool) {
    let _ = DEV_MODE.set(dev);
}

fn is_dev() -> bool {
    *DEV_MODE.get().unwrap_or(&false)
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, invalid, or expired credentials. 401.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated but not allowed. 403.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness invariant rejected the request. 409.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed or out-of-range request input. 400.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A backing service failed. Detail is hidden outside development. 500.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl ApiError {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<hireboard_store::StoreError> for ApiError {
    fn from(err: hireboard_store::StoreError) -> Self {
        use hireboard_store::StoreError;
        match err {
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::Duplicate(msg) => ApiError::Conflict(msg),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<hireboard_storage::StorageError> for ApiError {
    fn from(err: hireboard_storage::StorageError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    #[serde(rename = "statusCode")]
    status_code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            ApiError::Upstream(_) if !is_dev() => "An internal error occurred".to_string(),
            ApiError::Unauthenticated(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Validation(msg)
            | ApiError::Upstream(msg) => msg.clone(),
        };

        let stack = if is_dev() {
            Some(format!("{:?}", self))
        } else {
            None
        };

        let body = ErrorBody {
            success: false,
            message: message.clone(),
            error: ErrorDetail {
                status_code: status.as_u16(),
                message,
                stack,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hireboard_store::StoreError;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            ApiError::unauthenticated("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::upstream("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_map_onto_the_taxonomy() {
        assert!(matches!(
            ApiError::from(StoreError::not_found("job")),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::duplicate("email already registered")),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::config_error("bad uri")),
            ApiError::Upstream(_)
        ));
    }
}
