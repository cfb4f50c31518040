//! Application state.

use std::sync::Arc;

use hireboard_storage::ObjectStoreClient;
use hireboard_store::{StoreClient, StoreConfig};

use crate::auth::TokenService;
use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: StoreClient,
    pub storage: Arc<ObjectStoreClient>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    /// Create new application state and bootstrap store indexes.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store = StoreClient::connect(StoreConfig::from_env()?).await?;
        store.ensure_indexes().await?;

        let storage = ObjectStoreClient::from_env().await?;
        let tokens = TokenService::new(&config.token_secret, config.token_expiry);

        Ok(Self {
            config,
            store,
            storage: Arc::new(storage),
            tokens: Arc::new(tokens),
        })
    }
}
