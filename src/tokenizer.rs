//! Token counting
//!
//! OpenAI model names (`gpt-*`) are counted exactly with the tiktoken BPE
//! for that model. Anything else gets a four-characters-per-token estimate.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

use crate::core::{EmbeddingError, Result};

pub const DEFAULT_TOKEN_MODEL: &str = "gpt-4";

const AVG_CHARS_PER_TOKEN: usize = 4;

/// Whether counts for `model` come from a real tokenizer.
pub fn is_exact(model: &str) -> bool {
    model.starts_with("gpt-")
}

/// Caches one BPE per model name; building a BPE is expensive.
#[derive(Default)]
pub struct TokenCounter {
    encoders: Mutex<HashMap<String, Arc<CoreBPE>>>,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, text: &str, model: &str) -> Result<usize> {
        if !is_exact(model) {
            return Ok(text.chars().count() / AVG_CHARS_PER_TOKEN);
        }

        let bpe = self.encoder(model)?;
        Ok(bpe.encode_ordinary(text).len())
    }

    /// Sum of per-text counts under the default model.
    pub fn count_all(&self, texts: &[String]) -> Result<usize> {
        texts
            .iter()
            .map(|t| self.count(t, DEFAULT_TOKEN_MODEL))
            .sum()
    }

    fn encoder(&self, model: &str) -> Result<Arc<CoreBPE>> {
        let mut encoders = self.encoders.lock();
        if let Some(bpe) = encoders.get(model) {
            return Ok(bpe.clone());
        }

        let bpe = Arc::new(
            tiktoken_rs::get_bpe_from_model(model)
                .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?,
        );
        encoders.insert(model.to_string(), bpe.clone());
        Ok(bpe)
    }
}
