//! Model listing endpoint

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub default: String,
    pub available: Vec<String>,
    /// Cache contents, oldest first.
    pub loaded: Vec<String>,
    pub max_cached: usize,
}

pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        default: state.config.models.default_model.clone(),
        available: state.model_manager.allowed().to_vec(),
        loaded: state.model_manager.loaded(),
        max_cached: state.model_manager.max_cached(),
    })
}
