//! Bounded cache of loaded embedding models
//!
//! Models are keyed by name and restricted to a configured allow-list. The
//! cache keeps at most `max_cached` handles; when an insert pushes it over
//! that bound the oldest *inserted* entry is dropped. Hits do not refresh an
//! entry's position, so eviction is FIFO rather than LRU.
//!
//! The cache map is only locked for lookups and inserts. Loads run outside
//! it behind a per-name gate, so a slow download never blocks hits on other
//! models or readers such as the health endpoint.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::core::{EmbeddingError, Result};
use crate::models::{EmbeddingModel, ModelLoader};

#[derive(Default)]
struct ModelCache {
    entries: HashMap<String, Arc<dyn EmbeddingModel>>,
    order: VecDeque<String>,
}

impl ModelCache {
    fn get(&self, name: &str) -> Option<Arc<dyn EmbeddingModel>> {
        self.entries.get(name).cloned()
    }

    fn insert(&mut self, name: &str, model: Arc<dyn EmbeddingModel>) {
        if self.entries.insert(name.to_string(), model).is_none() {
            self.order.push_back(name.to_string());
        }
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let oldest = self.order.pop_front()?;
        self.entries.remove(&oldest);
        Some(oldest)
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

type LoadGate = Arc<tokio::sync::Mutex<()>>;

pub struct ModelManager {
    cache: Mutex<ModelCache>,
    loading: Mutex<HashMap<String, LoadGate>>,
    allowed: Vec<String>,
    max_cached: usize,
    loader: Arc<dyn ModelLoader>,
}

impl ModelManager {
    pub fn new(allowed: Vec<String>, max_cached: usize, loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            cache: Mutex::new(ModelCache::default()),
            loading: Mutex::new(HashMap::new()),
            allowed,
            max_cached,
            loader,
        }
    }

    pub fn is_allowed(&self, model_name: &str) -> bool {
        self.allowed.iter().any(|m| m == model_name)
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn max_cached(&self) -> usize {
        self.max_cached
    }

    /// Return the cached handle for `model_name`, loading it on a miss.
    ///
    /// Concurrent misses for the same name wait on one gate and load once.
    pub async fn get_or_load(&self, model_name: &str) -> Result<Arc<dyn EmbeddingModel>> {
        if !self.is_allowed(model_name) {
            error!(
                "Requested model '{}' is not in allowed models: {:?}",
                model_name, self.allowed
            );
            return Err(EmbeddingError::ModelNotAllowed {
                name: model_name.to_string(),
                allowed: self.allowed.clone(),
            });
        }

        let cached = self.cache.lock().get(model_name);
        if let Some(model) = cached {
            info!("Using cached model: {}", model_name);
            return Ok(model);
        }

        let gate = self
            .loading
            .lock()
            .entry(model_name.to_string())
            .or_default()
            .clone();
        let _guard = gate.lock().await;

        // Another caller may have finished the load while we waited.
        let cached = self.cache.lock().get(model_name);
        if let Some(model) = cached {
            info!("Using cached model: {}", model_name);
            return Ok(model);
        }

        info!("Loading new model: {}", model_name);
        let loaded = self.loader.load(model_name).await;
        self.loading.lock().remove(model_name);

        let model = loaded.map_err(|e| {
            error!("Failed to load model '{}': {}", model_name, e);
            match e {
                EmbeddingError::ModelLoadError { .. } => e,
                other => EmbeddingError::ModelLoadError {
                    name: model_name.to_string(),
                    cause: other.to_string(),
                },
            }
        })?;

        let mut cache = self.cache.lock();
        cache.insert(model_name, model.clone());
        if cache.len() > self.max_cached {
            if let Some(evicted) = cache.evict_oldest() {
                warn!("Removed oldest model from cache: {}", evicted);
            }
        }

        Ok(model)
    }

    /// Names currently cached, oldest first.
    pub fn loaded(&self) -> Vec<String> {
        self.cache.lock().order.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that every allow-listed model is supported by the loader and can
    /// be instantiated. Validation loads are discarded, not cached.
    pub async fn validate(&self) -> Result<()> {
        let supported = self.loader.supported_models();
        info!("Supported models from loader: {:?}", supported);

        for model_name in &self.allowed {
            if !supported.iter().any(|s| s == model_name) {
                error!("Model '{}' is not supported by the local runtime.", model_name);
                return Err(EmbeddingError::ConfigError(format!(
                    "Model '{}' is not supported by the local runtime.",
                    model_name
                )));
            }

            info!("Validating model '{}'...", model_name);
            self.loader.load(model_name).await.map_err(|e| {
                error!("Model '{}' cannot be loaded: {}", model_name, e);
                EmbeddingError::ConfigError(format!(
                    "Invalid model '{}' in AVAILABLE_MODELS: {}",
                    model_name, e
                ))
            })?;
            info!("Model '{}' is valid and ready.", model_name);
        }

        Ok(())
    }
}
