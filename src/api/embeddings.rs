//! Embedding generation endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;

use super::json_body;
use crate::core::{EmbeddingError, Result};
use crate::generators::{BatchEmbeddingRequest, EmbeddingOutcome};
use crate::AppState;

/// `input` may be one string or a non-empty list of strings.
pub fn parse_input(input: Option<&Value>) -> Result<Vec<String>> {
    let input = input.ok_or_else(|| EmbeddingError::InvalidInput("Missing 'input' field".to_string()))?;
    let invalid = || EmbeddingError::InvalidInput("Input text must be a string or list of strings".to_string());

    match input {
        Value::String(text) => Ok(vec![text.clone()]),
        Value::Array(items) => {
            if items.is_empty() {
                return Err(EmbeddingError::InvalidInput("Input list must not be empty".to_string()));
            }
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
                .collect()
        }
        _ => Err(invalid()),
    }
}

/// `model` is optional but must be a string when given.
pub fn parse_model(model: Option<&Value>, default_model: &str) -> Result<String> {
    match model {
        None => Ok(default_model.to_string()),
        Some(Value::String(name)) => Ok(name.clone()),
        Some(_) => Err(EmbeddingError::InvalidInput("Model must be a string".to_string())),
    }
}

pub async fn create_embeddings(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let body = json_body(body)?;
    let texts = parse_input(body.get("input"))?;
    let model = parse_model(body.get("model"), &state.config.models.default_model)?;

    let outcome = state
        .generator
        .generate(BatchEmbeddingRequest { texts, model })
        .await?;

    Ok(match outcome {
        EmbeddingOutcome::Local(response) => Json(response).into_response(),
        EmbeddingOutcome::Remote { status, body } => (status, Json(body)).into_response(),
    })
}
