//! Vector storage backends

pub mod filter;
pub mod memory;
pub mod qdrant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::Result;

pub use filter::{build_filter, Condition, Filter, RangeOp};
pub use memory::InMemoryStore;
pub use qdrant::QdrantStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub vector: Vec<f32>,
    pub limit: usize,
    pub filter: Option<Filter>,
    pub with_vector: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub payload: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

/// Operations the gateway needs from a vector database. Every collection
/// uses cosine distance.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn create_collection(&self, name: &str, vector_size: usize) -> Result<()>;

    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Fails with `CollectionNotFound` when the collection does not exist.
    async fn collection_info(&self, name: &str) -> Result<Value>;

    async fn delete_collection(&self, name: &str) -> Result<()>;

    async fn upsert_point(&self, collection: &str, point: VectorPoint) -> Result<()>;

    /// Hits ordered by descending similarity.
    async fn search(&self, collection: &str, query: SearchQuery) -> Result<Vec<SearchHit>>;

    /// Absent ids are ignored.
    async fn delete_points(&self, collection: &str, ids: &[String]) -> Result<()>;
}
