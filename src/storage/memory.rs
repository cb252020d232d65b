//! In-process vector store
//!
//! Brute-force cosine search over a map of collections. Mirrors the
//! observable behaviour of the Qdrant backend closely enough for tests and
//! single-node experiments.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::{SearchHit, SearchQuery, VectorPoint, VectorStore};
use crate::core::{EmbeddingError, Result};

struct Collection {
    vector_size: usize,
    points: BTreeMap<String, VectorPoint>,
}

#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections.read().get(collection).map(|c| c.points.len())
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn create_collection(&self, name: &str, vector_size: usize) -> Result<()> {
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(EmbeddingError::VectorStore(format!(
                "Collection `{}` already exists!",
                name
            )));
        }
        collections.insert(
            name.to_string(),
            Collection {
                vector_size,
                points: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.collections.read().keys().cloned().collect())
    }

    async fn collection_info(&self, name: &str) -> Result<Value> {
        let collections = self.collections.read();
        let collection = collections
            .get(name)
            .ok_or_else(|| EmbeddingError::CollectionNotFound(name.to_string()))?;

        Ok(json!({
            "status": "green",
            "points_count": collection.points.len(),
            "config": {
                "params": {
                    "vectors": {"size": collection.vector_size, "distance": "Cosine"}
                }
            }
        }))
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.collections.write().remove(name);
        Ok(())
    }

    async fn upsert_point(&self, collection: &str, point: VectorPoint) -> Result<()> {
        let mut collections = self.collections.write();
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| EmbeddingError::CollectionNotFound(collection.to_string()))?;

        if point.vector.len() != target.vector_size {
            return Err(EmbeddingError::VectorStore(format!(
                "Wrong input: Vector dimension error: expected dim: {}, got {}",
                target.vector_size,
                point.vector.len()
            )));
        }

        target.points.insert(point.id.clone(), point);
        Ok(())
    }

    async fn search(&self, collection: &str, query: SearchQuery) -> Result<Vec<SearchHit>> {
        let collections = self.collections.read();
        let target = collections
            .get(collection)
            .ok_or_else(|| EmbeddingError::CollectionNotFound(collection.to_string()))?;

        let mut hits: Vec<SearchHit> = target
            .points
            .values()
            .filter(|p| query.filter.as_ref().map_or(true, |f| f.matches(&p.payload)))
            .map(|p| SearchHit {
                id: p.id.clone(),
                score: cosine_similarity(&query.vector, &p.vector),
                payload: p.payload.clone(),
                vector: query.with_vector.then(|| p.vector.clone()),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(query.limit);
        Ok(hits)
    }

    async fn delete_points(&self, collection: &str, ids: &[String]) -> Result<()> {
        let mut collections = self.collections.write();
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| EmbeddingError::CollectionNotFound(collection.to_string()))?;

        for id in ids {
            target.points.remove(id);
        }
        Ok(())
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
