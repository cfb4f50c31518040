//! S3-compatible object store client.

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};
use uuid::Uuid;

use hireboard_models::ArtifactRef;

use crate::error::{StorageError, StorageResult};

/// Configuration for the object store client.
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region (usually "auto" for S3-compatible stores)
    pub region: String,
    /// Public base URL objects are served from
    pub public_base_url: String,
}

impl ObjectStoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("STORAGE_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("STORAGE_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("STORAGE_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("STORAGE_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("STORAGE_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("STORAGE_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("STORAGE_BUCKET_NAME")
                .map_err(|_| StorageError::config_error("STORAGE_BUCKET_NAME not set"))?,
            region: std::env::var("STORAGE_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("STORAGE_PUBLIC_BASE_URL")
                .map_err(|_| StorageError::config_error("STORAGE_PUBLIC_BASE_URL not set"))?,
        })
    }
}

/// Object store client for uploaded artifacts (resumes, photos, logos).
#[derive(Clone)]
pub struct ObjectStoreClient {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl ObjectStoreClient {
    /// Create a new client from configuration.
    pub async fn new(config: ObjectStoreConfig) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "object-store",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = Client::from_conf(sdk_config);

        Ok(Self {
            client,
            bucket: config.bucket_name,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = ObjectStoreConfig::from_env()?;
        Self::new(config).await
    }

    /// Upload an artifact under a generated key and return its handle.
    ///
    /// The key is `<folder>/<uuid>` so uploads never collide; replacing an
    /// artifact means uploading the new one and deleting the old key.
    pub async fn upload_artifact(
        &self,
        data: Vec<u8>,
        folder: &str,
        content_type: &str,
    ) -> StorageResult<ArtifactRef> {
        let key = format!("{}/{}", folder.trim_matches('/'), Uuid::new_v4());
        debug!("Uploading {} bytes to {}", data.len(), key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        let url = format!("{}/{}", self.public_base_url, key);
        info!("Uploaded artifact {}", key);

        Ok(ArtifactRef {
            public_id: key,
            url,
        })
    }

    /// Delete an object by its key.
    pub async fn delete_object(&self, key: &str) -> StorageResult<()> {
        debug!("Deleting {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;

        Ok(())
    }

    /// Check connectivity by performing a head bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("connectivity check failed: {}", e)))?;
        Ok(())
    }
}
