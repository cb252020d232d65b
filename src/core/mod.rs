//! Core functionality for the embeddings gateway

pub mod config;
pub mod error;
pub mod routing;
pub mod vector_search;

pub use config::{AuthConfig, Config, ModelConfig, QdrantConfig, RemoteConfig, ServerConfig};
pub use error::{EmbeddingError, ErrorResponse, Result};
pub use routing::{plan_route, Route};
pub use vector_search::VectorSearchService;
