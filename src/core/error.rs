//! Error types for the embeddings gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Model '{name}' is not available. Allowed models: {allowed:?}")]
    ModelNotAllowed { name: String, allowed: Vec<String> },

    #[error("Failed to load model '{name}': {cause}")]
    ModelLoadError { name: String, cause: String },

    #[error("Failed to generate embedding: {0}")]
    GenerationError(String),

    #[error("RunPod is disabled and cannot process multiple texts")]
    RemoteDisabled,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Invalid upstream response: {0}")]
    UpstreamProtocol(String),

    #[error("Failed to calculate tokens: {0}")]
    Tokenizer(String),

    #[error("Qdrant client not initialized.")]
    StoreUnavailable,

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;

impl EmbeddingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidInput(_) | Self::ModelNotAllowed { .. } | Self::RemoteDisabled => {
                StatusCode::BAD_REQUEST
            }
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::CollectionNotFound(_) => StatusCode::NOT_FOUND,
            Self::ConfigError(_)
            | Self::UpstreamProtocol(_)
            | Self::ModelLoadError { .. }
            | Self::GenerationError(_)
            | Self::Tokenizer(_)
            | Self::StoreUnavailable
            | Self::VectorStore(_)
            | Self::HttpError(_)
            | Self::SerializationError(_)
            | Self::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable kind, used as the `message` companion of `error`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidInput(_) => "invalid_input",
            Self::ModelNotAllowed { .. } => "model_not_allowed",
            Self::ModelLoadError { .. } => "model_load_failed",
            Self::GenerationError(_) => "generation_failed",
            Self::RemoteDisabled => "remote_disabled",
            Self::ConfigError(_) => "configuration_error",
            Self::Upstream(_) => "upstream_error",
            Self::UpstreamProtocol(_) => "upstream_protocol_error",
            Self::Tokenizer(_) => "tokenizer_error",
            Self::StoreUnavailable => "store_unavailable",
            Self::CollectionNotFound(_) => "collection_not_found",
            Self::VectorStore(_) | Self::HttpError(_) => "vector_store_error",
            Self::SerializationError(_) | Self::IoError(_) => "internal_error",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<&EmbeddingError> for ErrorResponse {
    fn from(err: &EmbeddingError) -> Self {
        Self {
            error: err.to_string(),
            message: err.kind().to_string(),
        }
    }
}

impl IntoResponse for EmbeddingError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::from(&self))).into_response()
    }
}
