//! Axum HTTP API server.
//!
//! This crate provides:
//! - Cookie/bearer token authentication and role authorization
//! - User, company, job, and application REST endpoints
//! - Rate limiting and security headers
//! - The uniform success/error response envelope

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
pub mod uploads;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
