//! API endpoints for the embeddings gateway

pub mod auth;
pub mod collections;
pub mod embeddings;
pub mod health;
pub mod models;
pub mod routes;
pub mod tokens;
pub mod vectors;

#[cfg(test)]
mod router_test;

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::core::EmbeddingError;

pub use auth::{auth_middleware, AuthState};
pub use routes::create_router;

/// Error shape of the collection and vector routes:
/// `{"success": false, "message": ...}`.
#[derive(Debug)]
pub struct StoreApiError(pub EmbeddingError);

impl StoreApiError {
    pub fn bad_request(message: &str) -> Self {
        Self(EmbeddingError::InvalidInput(message.to_string()))
    }
}

impl From<EmbeddingError> for StoreApiError {
    fn from(err: EmbeddingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for StoreApiError {
    fn into_response(self) -> Response {
        let body = json!({"success": false, "message": self.0.to_string()});
        (self.0.status_code(), Json(body)).into_response()
    }
}

/// Unwrap a JSON body, turning a malformed or missing body into
/// `InvalidInput`.
pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, EmbeddingError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| EmbeddingError::InvalidInput(rejection.body_text()))
}
