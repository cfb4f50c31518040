//! Typed MongoDB repositories for the HireBoard backend.
//!
//! This crate provides:
//! - A thin client wrapper with index bootstrap
//! - The job search query builder (filter document + pagination math)
//! - Per-collection repositories (users, companies, jobs, applications)

pub mod applications;
pub mod client;
pub mod companies;
pub mod error;
pub mod jobs;
pub mod query;
pub mod users;

pub use applications::ApplicationRepository;
pub use client::{StoreClient, StoreConfig};
pub use companies::{CompanyPatch, CompanyRepository};
pub use error::{StoreError, StoreResult};
pub use jobs::{JobPatch, JobRepository};
pub use query::{JobFilters, Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use users::{ProfilePatch, UserRepository};
