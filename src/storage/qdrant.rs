//! Qdrant REST client

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::{SearchHit, SearchQuery, VectorPoint, VectorStore};
use crate::core::config::QdrantConfig;
use crate::core::{EmbeddingError, Result};

#[derive(Debug, Deserialize)]
struct QdrantEnvelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct CollectionList {
    collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
struct CollectionDescription {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
    #[serde(default)]
    vector: Option<Value>,
}

pub struct QdrantStore {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl QdrantStore {
    pub fn new(config: &QdrantConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url())
            .map_err(|e| EmbeddingError::ConfigError(format!("Invalid Qdrant URL: {}", e)))?;

        Ok(Self {
            client: Client::new(),
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| EmbeddingError::ConfigError("Qdrant URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::VectorStore(format!(
                "Qdrant returned {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

/// Qdrant accepts unsigned integers or UUIDs as point ids.
fn point_id_json(id: &str) -> Value {
    match id.parse::<u64>() {
        Ok(n) => json!(n),
        Err(_) => json!(id),
    }
}

fn point_id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn create_collection(&self, name: &str, vector_size: usize) -> Result<()> {
        let url = self.endpoint(&["collections", name])?;
        let body = json!({"vectors": {"size": vector_size, "distance": "Cosine"}});
        self.send(self.request(Method::PUT, url).json(&body)).await?;
        info!("Created collection '{}'", name);
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&["collections"])?;
        let value = self.send(self.request(Method::GET, url)).await?;
        let envelope: QdrantEnvelope<CollectionList> = serde_json::from_value(value)?;
        Ok(envelope.result.collections.into_iter().map(|c| c.name).collect())
    }

    async fn collection_info(&self, name: &str) -> Result<Value> {
        let url = self.endpoint(&["collections", name])?;
        let response = self.request(Method::GET, url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(EmbeddingError::CollectionNotFound(name.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::VectorStore(format!(
                "Qdrant returned {}: {}",
                status, body
            )));
        }

        let envelope: QdrantEnvelope<Value> = response.json().await?;
        Ok(envelope.result)
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let url = self.endpoint(&["collections", name])?;
        self.send(self.request(Method::DELETE, url)).await?;
        info!("Deleted collection '{}'", name);
        Ok(())
    }

    async fn upsert_point(&self, collection: &str, point: VectorPoint) -> Result<()> {
        let mut url = self.endpoint(&["collections", collection, "points"])?;
        url.set_query(Some("wait=true"));
        let body = json!({
            "points": [{
                "id": point_id_json(&point.id),
                "vector": point.vector,
                "payload": point.payload,
            }]
        });
        self.send(self.request(Method::PUT, url).json(&body)).await?;
        Ok(())
    }

    async fn search(&self, collection: &str, query: SearchQuery) -> Result<Vec<SearchHit>> {
        let url = self.endpoint(&["collections", collection, "points", "search"])?;

        let mut body = json!({
            "vector": query.vector,
            "limit": query.limit,
            "with_payload": true,
            "with_vector": query.with_vector,
        });
        if let Some(filter) = query.filter.as_ref().filter(|f| !f.is_empty()) {
            body["filter"] = filter.to_qdrant();
        }
        debug!("Qdrant search on '{}': {}", collection, body);

        let value = self.send(self.request(Method::POST, url).json(&body)).await?;
        let envelope: QdrantEnvelope<Vec<ScoredPoint>> = serde_json::from_value(value)?;

        envelope
            .result
            .into_iter()
            .map(|p| -> Result<SearchHit> {
                let vector = match p.vector.filter(|_| query.with_vector) {
                    Some(v) => Some(serde_json::from_value::<Vec<f32>>(v)?),
                    None => None,
                };
                Ok(SearchHit {
                    id: point_id_string(&p.id),
                    score: p.score,
                    payload: p.payload.unwrap_or_default(),
                    vector,
                })
            })
            .collect()
    }

    async fn delete_points(&self, collection: &str, ids: &[String]) -> Result<()> {
        let mut url = self.endpoint(&["collections", collection, "points", "delete"])?;
        url.set_query(Some("wait=true"));
        let points: Vec<Value> = ids.iter().map(|id| point_id_json(id)).collect();
        self.send(self.request(Method::POST, url).json(&json!({ "points": points })))
            .await?;
        Ok(())
    }
}
