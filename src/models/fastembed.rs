//! Local ONNX inference through fastembed
//!
//! fastembed publishes its ONNX exports under `Xenova/` and `Qdrant/`
//! namespaces. Configurations written against the Hugging Face names
//! (`sentence-transformers/...`) are accepted and resolved to the export
//! with the same model name.

use async_trait::async_trait;
use fastembed::{EmbeddingModel as FastEmbedKind, InitOptions, ModelInfo, TextEmbedding};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task;

use crate::core::{EmbeddingError, Result};
use crate::models::{EmbeddingModel, ModelLoader};

const HF_NAMESPACE: &str = "sentence-transformers/";
const EXPORT_NAMESPACES: [&str; 2] = ["Xenova/", "Qdrant/"];

pub struct FastEmbedModel {
    name: String,
    dimension: usize,
    inner: Arc<TextEmbedding>,
}

#[async_trait]
impl EmbeddingModel for FastEmbedModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn generate(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let inner = self.inner.clone();

        // Inference is CPU bound
        task::spawn_blocking(move || {
            inner
                .embed(texts, None)
                .map_err(|e| EmbeddingError::GenerationError(e.to_string()))
        })
        .await
        .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?
    }
}

/// `sentence-transformers/<name>` for fastembed exports that have one.
fn hf_alias(model_code: &str) -> Option<String> {
    EXPORT_NAMESPACES
        .iter()
        .find_map(|ns| model_code.strip_prefix(ns))
        .map(|name| format!("{HF_NAMESPACE}{name}"))
}

/// Find the fastembed model for `name`, by exact code or by Hugging Face
/// alias.
fn resolve(name: &str) -> Option<ModelInfo<FastEmbedKind>> {
    let models = TextEmbedding::list_supported_models();
    let position = models
        .iter()
        .position(|info| info.model_code == name)
        .or_else(|| {
            models
                .iter()
                .position(|info| hf_alias(&info.model_code).as_deref() == Some(name))
        })?;
    models.into_iter().nth(position)
}

/// Instantiates fastembed models, downloading weights into `cache_dir` on
/// first use.
pub struct FastEmbedLoader {
    cache_dir: PathBuf,
}

impl FastEmbedLoader {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }
}

#[async_trait]
impl ModelLoader for FastEmbedLoader {
    fn supported_models(&self) -> Vec<String> {
        let mut names = Vec::new();
        for info in TextEmbedding::list_supported_models() {
            if let Some(alias) = hf_alias(&info.model_code) {
                if !names.contains(&alias) {
                    names.push(alias);
                }
            }
            names.push(info.model_code);
        }
        names
    }

    async fn load(&self, name: &str) -> Result<Arc<dyn EmbeddingModel>> {
        let info = resolve(name).ok_or_else(|| EmbeddingError::ModelLoadError {
            name: name.to_string(),
            cause: "not supported by fastembed".to_string(),
        })?;

        let options = InitOptions::new(info.model.clone())
            .with_cache_dir(self.cache_dir.clone())
            .with_show_download_progress(false);

        let model_name = name.to_string();
        let embedding = task::spawn_blocking(move || TextEmbedding::try_new(options))
            .await
            .map_err(|e| EmbeddingError::ModelLoadError {
                name: model_name.clone(),
                cause: e.to_string(),
            })?
            .map_err(|e| EmbeddingError::ModelLoadError {
                name: model_name.clone(),
                cause: e.to_string(),
            })?;

        Ok(Arc::new(FastEmbedModel {
            name: model_name,
            dimension: info.dim,
            inner: Arc::new(embedding),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;

    #[test]
    fn test_hf_alias() {
        assert_eq!(
            hf_alias("Xenova/paraphrase-multilingual-MiniLM-L12-v2").as_deref(),
            Some("sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2")
        );
        assert_eq!(hf_alias("BAAI/bge-small-en-v1.5"), None);
    }

    #[test]
    fn test_default_model_is_resolvable() {
        let default_model = Config::default().models.default_model;
        let loader = FastEmbedLoader::new("./models");

        assert!(loader.supported_models().contains(&default_model));
        let info = resolve(&default_model).unwrap();
        assert_eq!(info.model_code, "Xenova/paraphrase-multilingual-MiniLM-L12-v2");
        assert_eq!(info.dim, 384);
    }

    #[test]
    fn test_text_embedding_is_shared_without_lock() {
        fn shareable<T: Send + Sync>() {}
        shareable::<TextEmbedding>();
        shareable::<FastEmbedModel>();
    }

    #[test]
    fn test_exact_codes_still_resolve() {
        let info = resolve("Xenova/paraphrase-multilingual-MiniLM-L12-v2").unwrap();
        assert_eq!(info.dim, 384);
        assert!(resolve("sentence-transformers/no-such-model").is_none());
    }
}
