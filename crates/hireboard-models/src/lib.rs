//! Shared data models for the HireBoard backend.
//!
//! This crate provides Serde-serializable types for:
//! - User accounts (seekers and recruiters) and their profiles
//! - Companies and job postings
//! - Applications and their status lifecycle
//! - Artifact references into the external object store

pub mod application;
pub mod artifact;
pub mod company;
pub mod job;
pub mod user;

// Re-export common types
pub use application::{Application, ApplicationId, ApplicationStatus};
pub use artifact::ArtifactRef;
pub use company::{Company, CompanyId};
pub use job::{Job, JobId, JobType};
pub use user::{Profile, Role, UserAccount, UserId};
