//! Token counting endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::Serialize;
use serde_json::Value;

use super::json_body;
use crate::core::{EmbeddingError, Result};
use crate::tokenizer::{is_exact, DEFAULT_TOKEN_MODEL};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TokenCountResponse {
    pub model: String,
    pub tokens: usize,
    pub note: String,
}

pub async fn calculate_tokens(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<TokenCountResponse>> {
    let body = json_body(body)?;
    let input = body
        .get("input")
        .ok_or_else(|| EmbeddingError::InvalidInput("Missing 'input' field".to_string()))?;
    let text = input
        .as_str()
        .ok_or_else(|| EmbeddingError::InvalidInput("Input must be a string".to_string()))?;
    let model = body
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_TOKEN_MODEL);

    let tokens = state.tokens.count(text, model)?;
    let note = if is_exact(model) {
        "Token count is exact"
    } else {
        "Token count is estimated for non-OpenAI models"
    };

    Ok(Json(TokenCountResponse {
        model: model.to_string(),
        tokens,
        note: note.to_string(),
    }))
}
