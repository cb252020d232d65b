//! Model management for the embeddings gateway

pub mod manager;
pub mod mock;
pub mod remote;
#[cfg(feature = "fastembed")]
pub mod fastembed;

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{EmbeddingError, Result};

pub use manager::ModelManager;
pub use mock::{MockLoader, MockModel};
pub use remote::{RemoteClient, RemoteReply};
#[cfg(feature = "fastembed")]
pub use self::fastembed::{FastEmbedLoader, FastEmbedModel};

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    fn name(&self) -> &str;
    fn dimension(&self) -> usize;
    async fn generate(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// Creates model handles on cache misses.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Model names this loader is able to instantiate.
    fn supported_models(&self) -> Vec<String>;

    async fn load(&self, name: &str) -> Result<Arc<dyn EmbeddingModel>>;
}

/// Loader used when the crate is built without a local inference runtime.
pub struct DisabledLoader;

#[async_trait]
impl ModelLoader for DisabledLoader {
    fn supported_models(&self) -> Vec<String> {
        Vec::new()
    }

    async fn load(&self, name: &str) -> Result<Arc<dyn EmbeddingModel>> {
        Err(EmbeddingError::ModelLoadError {
            name: name.to_string(),
            cause: "local inference requires the `fastembed` feature".to_string(),
        })
    }
}

/// Loader for the current build: fastembed when compiled in, otherwise
/// [`DisabledLoader`].
pub fn default_loader(models_dir: &str) -> Arc<dyn ModelLoader> {
    #[cfg(feature = "fastembed")]
    {
        Arc::new(FastEmbedLoader::new(models_dir))
    }
    #[cfg(not(feature = "fastembed"))]
    {
        let _ = models_dir;
        Arc::new(DisabledLoader)
    }
}
