//! Vector storage operations exposed by the gateway
//!
//! Wraps an optional [`VectorStore`]. When the store was never configured
//! or failed its startup probe every operation fails with
//! `StoreUnavailable`.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::{EmbeddingError, Result};
use crate::storage::{build_filter, SearchHit, SearchQuery, VectorPoint, VectorStore};

pub struct VectorSearchService {
    store: Option<Arc<dyn VectorStore>>,
    default_collection: String,
}

impl VectorSearchService {
    pub fn new(store: Option<Arc<dyn VectorStore>>, default_collection: impl Into<String>) -> Self {
        Self {
            store,
            default_collection: default_collection.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    pub fn default_collection(&self) -> &str {
        &self.default_collection
    }

    fn store(&self) -> Result<&Arc<dyn VectorStore>> {
        self.store.as_ref().ok_or(EmbeddingError::StoreUnavailable)
    }

    /// Create `name` with cosine distance unless it already exists.
    pub async fn ensure_collection(&self, name: &str, vector_size: usize) -> Result<()> {
        let store = self.store()?;
        match store.collection_info(name).await {
            Ok(_) => Ok(()),
            Err(EmbeddingError::CollectionNotFound(_)) => {
                info!("Creating collection '{}'...", name);
                store.create_collection(name, vector_size).await
            }
            Err(e) => Err(e),
        }
    }

    /// Upsert one point, creating the collection on first use. Returns the
    /// point id, generated when not supplied.
    pub async fn save_vector(
        &self,
        vector: Vec<f32>,
        payload: Map<String, Value>,
        collection: &str,
        point_id: Option<String>,
    ) -> Result<String> {
        let store = self.store()?;
        self.ensure_collection(collection, vector.len()).await?;

        let id = point_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        store
            .upsert_point(
                collection,
                VectorPoint {
                    id: id.clone(),
                    vector,
                    payload,
                },
            )
            .await?;

        info!("Saved vector ID {} to '{}'", id, collection);
        Ok(id)
    }

    pub async fn search_vector(
        &self,
        vector: Vec<f32>,
        collection: &str,
        top_k: usize,
        include_vector: bool,
        filters: Option<&Value>,
    ) -> Result<Vec<SearchHit>> {
        let store = self.store()?;
        let query = SearchQuery {
            vector,
            limit: top_k,
            filter: build_filter(filters),
            with_vector: include_vector,
        };
        store.search(collection, query).await
    }

    /// Remove points by id. Ids that do not exist are ignored.
    pub async fn delete_vector_by_id(&self, ids: &[String], collection: &str) -> Result<()> {
        self.store()?.delete_points(collection, ids).await?;
        info!("Deleted vector(s) ID {:?} from '{}'", ids, collection);
        Ok(())
    }

    pub async fn create_collection(&self, name: &str, vector_size: usize) -> Result<()> {
        self.store()?.create_collection(name, vector_size).await?;
        info!("Created collection '{}'", name);
        Ok(())
    }

    pub async fn list_collections(&self) -> Result<Vec<String>> {
        self.store()?.list_collections().await
    }

    pub async fn collection_info(&self, name: &str) -> Result<Value> {
        self.store()?.collection_info(name).await
    }

    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.store()?.delete_collection(name).await?;
        info!("Deleted collection '{}'", name);
        Ok(())
    }
}
