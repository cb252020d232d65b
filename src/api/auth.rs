//! Bearer token authentication

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Shared state for authentication
#[derive(Clone)]
pub struct AuthState {
    /// Accepted tokens. An empty list accepts nothing.
    pub api_keys: Arc<Vec<String>>,
}

impl AuthState {
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            api_keys: Arc::new(api_keys),
        }
    }

    pub fn validate_key(&self, key: &str) -> bool {
        self.api_keys.iter().any(|k| k == key)
    }
}

/// Extract the token from an `Authorization` value. Only the exact
/// `Bearer ` prefix is accepted and the remainder is taken as-is.
pub fn bearer_token(value: &str) -> Option<&str> {
    value.strip_prefix("Bearer ")
}

pub async fn auth_middleware(
    State(auth): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token);

    match token {
        Some(token) if auth.validate_key(token) => next.run(request).await,
        _ => {
            warn!(
                "Unauthorized request to {} {}",
                request.method(),
                request.uri().path()
            );
            (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"}))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        let auth = AuthState::new(vec!["secret123".to_string(), "key456".to_string()]);
        assert!(auth.validate_key("secret123"));
        assert!(auth.validate_key("key456"));
        assert!(!auth.validate_key("wrong"));
        assert!(!auth.validate_key(""));
    }

    #[test]
    fn test_empty_key_list_rejects_everything() {
        let auth = AuthState::new(vec![]);
        assert!(!auth.validate_key("anything"));
    }

    #[test]
    fn test_bearer_prefix_is_strict() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer  abc"), Some(" abc"));
        assert_eq!(bearer_token("bearer abc"), None);
        assert_eq!(bearer_token("abc"), None);
        assert_eq!(bearer_token("Token abc"), None);
    }
}
