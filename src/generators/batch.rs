//! Batch embedding generation
//!
//! Applies the routing policy to a batch: small batches run on a cached
//! local model, larger ones are forwarded to the remote inference service.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::core::config::RemoteConfig;
use crate::core::{plan_route, EmbeddingError, Result, Route};
use crate::models::{ModelManager, RemoteClient};
use crate::tokenizer::TokenCounter;

#[derive(Debug, Clone)]
pub struct BatchEmbeddingRequest {
    pub texts: Vec<String>,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddingData {
    pub object: String,
    pub embedding: Vec<f32>,
    pub index: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Usage {
    pub input_text_count: usize,
    pub prompt_tokens: usize,
    pub total_tokens: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchEmbeddingResponse {
    pub object: String,
    pub data: Vec<EmbeddingData>,
    pub model: String,
    pub usage: Usage,
}

#[derive(Debug)]
pub enum EmbeddingOutcome {
    Local(BatchEmbeddingResponse),
    /// Remote reply passed through untouched.
    Remote { status: StatusCode, body: Value },
}

pub struct BatchGenerator {
    model_manager: Arc<ModelManager>,
    remote_client: RemoteClient,
    remote_config: RemoteConfig,
    tokens: Arc<TokenCounter>,
    max_local_texts: usize,
}

impl BatchGenerator {
    pub fn new(
        model_manager: Arc<ModelManager>,
        remote_config: RemoteConfig,
        tokens: Arc<TokenCounter>,
        max_local_texts: usize,
    ) -> Result<Self> {
        let remote_client = RemoteClient::new(remote_config.timeout)?;
        Ok(Self {
            model_manager,
            remote_client,
            remote_config,
            tokens,
            max_local_texts,
        })
    }

    pub async fn generate(&self, request: BatchEmbeddingRequest) -> Result<EmbeddingOutcome> {
        match plan_route(request.texts.len(), self.max_local_texts, &self.remote_config)? {
            Route::Remote { url, api_key } => {
                let reply = self
                    .remote_client
                    .forward(&url, &api_key, &request.model, &request.texts)
                    .await?;
                Ok(EmbeddingOutcome::Remote {
                    status: reply.status,
                    body: reply.body,
                })
            }
            Route::Local => self.generate_local(request).await.map(EmbeddingOutcome::Local),
        }
    }

    async fn generate_local(&self, request: BatchEmbeddingRequest) -> Result<BatchEmbeddingResponse> {
        let start_time = Instant::now();
        let model = self.model_manager.get_or_load(&request.model).await?;

        let prompt_tokens = self.tokens.count_all(&request.texts)?;
        let input_text_count = request.texts.len();

        info!("Generating embeddings using model: {}", request.model);
        let embeddings = model.generate(request.texts).await.map_err(|e| match e {
            EmbeddingError::GenerationError(_) => e,
            other => EmbeddingError::GenerationError(other.to_string()),
        })?;

        if embeddings.len() != input_text_count {
            return Err(EmbeddingError::GenerationError(format!(
                "expected {} embeddings, model returned {}",
                input_text_count,
                embeddings.len()
            )));
        }

        info!(
            "Embeddings generated successfully in {} ms",
            start_time.elapsed().as_millis()
        );

        Ok(BatchEmbeddingResponse {
            object: "list".to_string(),
            data: embeddings
                .into_iter()
                .enumerate()
                .map(|(index, embedding)| EmbeddingData {
                    object: "embedding".to_string(),
                    embedding,
                    index,
                })
                .collect(),
            model: request.model,
            usage: Usage {
                input_text_count,
                prompt_tokens,
                total_tokens: prompt_tokens,
            },
        })
    }
}
