//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::applications::{
    applications_for_job, apply, get_application, my_applications, update_status,
};
use crate::handlers::companies::{get_company, my_companies, register_company, update_company};
use crate::handlers::health::{health, ready};
use crate::handlers::jobs::{
    create_job, delete_job, job_details, list_jobs, my_jobs, search_jobs, update_job,
};
use crate::handlers::users::{get_profile, login, logout, register, update_profile};
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_logging, security_headers, RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/profile", get(get_profile))
        .route("/profile/update", post(update_profile));

    let company_routes = Router::new()
        .route("/register", post(register_company))
        .route("/get", get(my_companies))
        .route("/get/:company_id", get(get_company))
        .route("/update/:company_id", put(update_company));

    let job_routes = Router::new()
        .route("/", get(list_jobs))
        .route("/search", get(search_jobs))
        .route("/details/:job_id", get(job_details))
        .route("/create-job", post(create_job))
        .route("/:job_id", put(update_job))
        .route("/:job_id", delete(delete_job))
        .route("/company/my-jobs", get(my_jobs));

    let application_routes = Router::new()
        .route("/apply", post(apply))
        .route("/my-applications", get(my_applications))
        .route("/job/:job_id", get(applications_for_job))
        .route("/:application_id", get(get_application))
        .route("/:application_id/status", patch(update_status));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .nest("/user", user_routes)
        .nest("/company", company_routes)
        .nest("/jobs", job_routes)
        .nest("/applications", application_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(health_routes)
        // Request body size limit; multipart uploads are also capped per file
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
