//! HTTP route definitions

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::auth::{auth_middleware, AuthState};
use super::{collections, embeddings, health, models, tokens, vectors};
use crate::AppState;

/// Build the full router. Everything except `/health` requires a bearer
/// token from the configured key list.
pub fn create_router(state: AppState) -> Router {
    let auth_state = AuthState::new(state.config.auth.api_keys.clone());

    let protected = Router::new()
        .route("/v1/embeddings", post(embeddings::create_embeddings))
        .route("/v1/calculate-tokens", post(tokens::calculate_tokens))
        .route("/v1/models", get(models::list_models))
        .route("/collection/create", post(collections::create_collection))
        .route("/collection/list", get(collections::list_collections))
        .route("/collection/info", get(collections::collection_info))
        .route("/collection/delete", post(collections::delete_collection))
        .route("/vector/upsert", post(vectors::upsert_vector))
        .route("/vector/search", post(vectors::search_vectors))
        .route("/vector/delete", post(vectors::delete_vectors))
        .route_layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(protected)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
