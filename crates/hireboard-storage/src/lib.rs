//! S3-compatible object store client.
//!
//! This crate provides:
//! - Artifact upload (resumes, profile photos, company logos)
//! - Artifact deletion when a stored file is replaced
//! - Connectivity checks for readiness probes

pub mod client;
pub mod error;

pub use client::{ObjectStoreClient, ObjectStoreConfig};
pub use error::{StorageError, StorageResult};
