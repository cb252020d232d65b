//! Embeddings Gateway Library
//!
//! HTTP façade for embedding generation, Qdrant vector storage and token
//! counting. Small batches run on cached local models, larger ones are
//! delegated to a remote inference endpoint.

pub mod api;
pub mod core;
pub mod generators;
pub mod models;
pub mod storage;
pub mod tokenizer;

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::core::{Config, Result, ServerConfig, VectorSearchService};
use crate::generators::BatchGenerator;
use crate::models::{default_loader, ModelLoader, ModelManager};
use crate::storage::{QdrantStore, VectorStore};
use crate::tokenizer::TokenCounter;

// Application state for Axum
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub model_manager: Arc<ModelManager>,
    pub generator: Arc<BatchGenerator>,
    pub tokens: Arc<TokenCounter>,
    pub vectors: Arc<VectorSearchService>,
}

impl AppState {
    /// Assemble state from explicit parts. The model cache starts empty.
    pub fn new(
        config: Config,
        loader: Arc<dyn ModelLoader>,
        store: Option<Arc<dyn VectorStore>>,
    ) -> Result<Self> {
        let model_manager = Arc::new(ModelManager::new(
            config.models.available_models.clone(),
            config.models.max_cached_models,
            loader,
        ));
        let tokens = Arc::new(TokenCounter::new());
        let generator = Arc::new(BatchGenerator::new(
            model_manager.clone(),
            config.remote.clone(),
            tokens.clone(),
            config.models.max_local_texts,
        )?);
        let vectors = Arc::new(VectorSearchService::new(
            store,
            config.qdrant.default_collection.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            model_manager,
            generator,
            tokens,
            vectors,
        })
    }
}

pub struct EmbeddingsService {
    state: AppState,
}

impl EmbeddingsService {
    pub async fn new(config: Config) -> Result<Self> {
        let store = if config.qdrant.enabled {
            connect_qdrant(&config).await
        } else {
            info!("Qdrant disabled, vector routes will report the store as unavailable");
            None
        };

        let loader = default_loader(&config.models.models_dir);
        let state = AppState::new(config, loader, store)?;
        Ok(Self { state })
    }

    /// Check every allow-listed model once. Failure must stop startup.
    pub async fn validate_models(&self) -> Result<()> {
        if cfg!(not(feature = "fastembed")) {
            warn!("Built without the `fastembed` feature, skipping model validation");
            return Ok(());
        }

        info!(
            "Validating models: {:?}",
            self.state.model_manager.allowed()
        );
        self.state.model_manager.validate().await
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    pub fn app_state(self) -> AppState {
        self.state
    }
}

/// Bind the HTTP listener. `host` may be an IP address or a resolvable name
/// such as `localhost`.
pub async fn bind_listener(server: &ServerConfig) -> Result<TcpListener> {
    Ok(TcpListener::bind((server.host.as_str(), server.port)).await?)
}

/// Build the Qdrant client and probe it. A failed probe leaves the store
/// unavailable instead of aborting startup.
async fn connect_qdrant(config: &Config) -> Option<Arc<dyn VectorStore>> {
    let url = config.qdrant.url();
    let store = match QdrantStore::new(&config.qdrant) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to configure Qdrant client: {}", e);
            return None;
        }
    };

    match store.list_collections().await {
        Ok(collections) => {
            info!(
                "Connected to Qdrant at {} ({} collections)",
                url,
                collections.len()
            );
            Some(Arc::new(store))
        }
        Err(e) => {
            error!("Failed to connect to Qdrant at {}: {}", url, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_listener_accepts_hostnames() {
        let server = ServerConfig {
            host: "localhost".to_string(),
            port: 0,
        };
        let listener = bind_listener(&server).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn test_bind_listener_accepts_ip_addresses() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let listener = bind_listener(&server).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
