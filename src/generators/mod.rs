//! Embedding generation functionality

pub mod batch;

pub use batch::{BatchEmbeddingRequest, BatchEmbeddingResponse, BatchGenerator, EmbeddingOutcome};
