//! API configuration.

use std::time::Duration;

use anyhow::Context;

/// API server configuration.
///
/// Built once from the environment in `main` and passed by injection;
/// handlers and services never read ambient environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second (per client IP)
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// HS256 signing secret for session tokens
    pub token_secret: String,
    /// Session token lifetime
    pub token_expiry: Duration,
    /// Bcrypt work factor for password hashing
    pub bcrypt_cost: u32,
}

impl AppConfig {
    /// Create config from environment variables.
    ///
    /// `TOKEN_SECRET` is required; everything else has a default.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10 * 1024 * 1024),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            token_secret: std::env::var("TOKEN_SECRET").context("TOKEN_SECRET not set")?,
            token_expiry: Duration::from_secs(
                std::env::var("TOKEN_EXPIRY_HOURS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(24)
                    * 3600,
            ),
            bcrypt_cost: std::env::var("BCRYPT_COST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        })
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
