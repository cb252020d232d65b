//! Deterministic in-process models for tests and offline runs.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::core::{EmbeddingError, Result};
use crate::models::{EmbeddingModel, ModelLoader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Embed,
    Fail,
    /// Returns one embedding fewer than requested.
    Truncate,
}

/// Produces a fixed-size vector derived from the bytes of each text.
pub struct MockModel {
    name: String,
    dimension: usize,
    behavior: Behavior,
}

impl MockModel {
    pub fn new(name: &str, dimension: usize) -> Self {
        Self {
            name: name.to_string(),
            dimension,
            behavior: Behavior::Embed,
        }
    }

    /// A model whose every `generate` call fails.
    pub fn failing(name: &str, dimension: usize) -> Self {
        Self {
            behavior: Behavior::Fail,
            ..Self::new(name, dimension)
        }
    }

    /// A model that drops the last embedding of every batch.
    pub fn truncating(name: &str, dimension: usize) -> Self {
        Self {
            behavior: Behavior::Truncate,
            ..Self::new(name, dimension)
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let bytes = text.as_bytes();
        (0..self.dimension)
            .map(|i| match bytes.get(i % bytes.len().max(1)) {
                Some(b) => f32::from(*b) / 255.0,
                None => 0.0,
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingModel for MockModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn generate(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let mut embeddings: Vec<Vec<f32>> = texts.iter().map(|t| self.embed_text(t)).collect();
        match self.behavior {
            Behavior::Embed => {}
            Behavior::Fail => {
                return Err(EmbeddingError::GenerationError(format!(
                    "mock inference failure in '{}'",
                    self.name
                )))
            }
            Behavior::Truncate => {
                embeddings.pop();
            }
        }
        Ok(embeddings)
    }
}

/// Loader that counts loads and can be told to fail, stall or hand out
/// broken models for specific names.
pub struct MockLoader {
    dimension: usize,
    supported: Option<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    broken: Mutex<HashMap<String, Behavior>>,
    delays: Mutex<HashMap<String, Duration>>,
    loads: AtomicUsize,
}

impl MockLoader {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            supported: None,
            failing: Mutex::new(HashSet::new()),
            broken: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Restrict the names reported by `supported_models`. By default
    /// `model-0` through `model-15` are reported.
    pub fn with_supported(mut self, supported: Vec<String>) -> Self {
        self.supported = Some(supported);
        self
    }

    pub fn fail_on(&self, name: &str) {
        self.failing.lock().insert(name.to_string());
    }

    /// Load `name` normally but make its inference fail.
    pub fn fail_generation_on(&self, name: &str) {
        self.broken.lock().insert(name.to_string(), Behavior::Fail);
    }

    /// Load `name` normally but make it return too few embeddings.
    pub fn truncate_on(&self, name: &str) {
        self.broken.lock().insert(name.to_string(), Behavior::Truncate);
    }

    /// Make loads of `name` take `delay`.
    pub fn slow_on(&self, name: &str, delay: Duration) {
        self.delays.lock().insert(name.to_string(), delay);
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelLoader for MockLoader {
    fn supported_models(&self) -> Vec<String> {
        match &self.supported {
            Some(list) => list.clone(),
            None => (0..16).map(|i| format!("model-{i}")).collect(),
        }
    }

    async fn load(&self, name: &str) -> Result<Arc<dyn EmbeddingModel>> {
        // Yield so concurrent callers actually interleave in tests.
        tokio::task::yield_now().await;
        let delay = self.delays.lock().get(name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.loads.fetch_add(1, Ordering::SeqCst);

        if self.failing.lock().contains(name) {
            return Err(EmbeddingError::ModelLoadError {
                name: name.to_string(),
                cause: "mock load failure".to_string(),
            });
        }

        let behavior = self.broken.lock().get(name).copied();
        let model = match behavior {
            Some(Behavior::Fail) => MockModel::failing(name, self.dimension),
            Some(Behavior::Truncate) => MockModel::truncating(name, self.dimension),
            _ => MockModel::new(name, self.dimension),
        };
        Ok(Arc::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_model_is_deterministic() {
        let model = MockModel::new("mock", 4);
        let a = model.generate(vec!["hello".into()]).await.unwrap();
        let b = model.generate(vec!["hello".into()]).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 4);
    }

    #[tokio::test]
    async fn test_mock_model_handles_empty_text() {
        let model = MockModel::new("mock", 3);
        let out = model.generate(vec![String::new()]).await.unwrap();
        assert_eq!(out[0], vec![0.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_broken_models() {
        let failing = MockModel::failing("mock", 2);
        assert!(matches!(
            failing.generate(vec!["a".into()]).await,
            Err(EmbeddingError::GenerationError(_))
        ));

        let truncating = MockModel::truncating("mock", 2);
        let out = truncating.generate(vec!["a".into(), "b".into()]).await.unwrap();
        assert_eq!(out.len(), 1);
    }
}
