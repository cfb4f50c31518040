//! Store client wrapper and index bootstrap.

use bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::info;

use hireboard_models::{Application, Company, Job, UserAccount};

use crate::error::{StoreError, StoreResult};

/// Configuration for the store client.
///
/// Built once at process start and passed by injection; repositories never
/// read the ambient environment.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// MongoDB connection string.
    pub uri: String,
    /// Database name.
    pub database: String,
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Ok(Self {
            uri: std::env::var("MONGO_URI")
                .map_err(|_| StoreError::config_error("MONGO_URI not set"))?,
            database: std::env::var("MONGO_DATABASE").unwrap_or_else(|_| "hireboard".to_string()),
        })
    }
}

/// Thin wrapper around the MongoDB database handle.
///
/// Cheap to clone; repositories take a clone per use.
#[derive(Clone)]
pub struct StoreClient {
    db: Database,
}

impl StoreClient {
    /// Connect to the store.
    pub async fn connect(config: StoreConfig) -> StoreResult<Self> {
        let client = Client::with_uri_str(&config.uri).await?;
        let db = client.database(&config.database);
        info!("Connected to document store: {}", config.database);
        Ok(Self { db })
    }

    pub fn users(&self) -> Collection<UserAccount> {
        self.db.collection("users")
    }

    pub fn companies(&self) -> Collection<Company> {
        self.db.collection("companies")
    }

    pub fn jobs(&self) -> Collection<Job> {
        self.db.collection("jobs")
    }

    pub fn applications(&self) -> Collection<Application> {
        self.db.collection("applications")
    }

    /// Create the unique and sort indexes the repositories rely on.
    ///
    /// Uniqueness invariants (email, company name, one application per
    /// posting/applicant pair) are enforced here so the store itself rejects
    /// the second concurrent writer.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let unique = IndexOptions::builder().unique(true).build();

        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await?;

        self.companies()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await?;

        self.applications()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "job_id": 1, "applicant_id": 1 })
                    .options(unique)
                    .build(),
            )
            .await?;

        // Newest-first listing and search ordering.
        self.jobs()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "created_at": -1, "_id": -1 })
                    .build(),
            )
            .await?;

        info!("Store indexes ensured");
        Ok(())
    }

    /// Readiness check.
    pub async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
