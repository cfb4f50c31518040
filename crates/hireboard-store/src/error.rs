//! Store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur against the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to configure store client: {0}")]
    ConfigError(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    /// A unique index rejected the write (duplicate email, company name, or
    /// application for the same posting).
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

impl StoreError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }

    /// Map a driver error into `Duplicate` when a unique index rejected the
    /// write, keeping the race closed at the store level.
    pub fn from_write(err: mongodb::error::Error, context: &str) -> Self {
        if is_duplicate_key(&err) {
            Self::Duplicate(context.to_string())
        } else {
            Self::Database(err)
        }
    }
}

/// True if the driver error is a unique-index violation (code 11000).
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == 11000,
        ErrorKind::Command(ce) => ce.code == 11000,
        _ => false,
    }
}
