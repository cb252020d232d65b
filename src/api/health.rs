//! Health check endpoint

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub qdrant_connected: bool,
    pub loaded_models: Vec<String>,
}

/// Liveness only. Degraded dependencies are reported, never fatal.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "embeddings-gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        qdrant_connected: state.vectors.is_available(),
        loaded_models: state.model_manager.loaded(),
    })
}
