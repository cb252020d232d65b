use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header as header_matcher, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::create_router;
use crate::core::Config;
use crate::models::MockLoader;
use crate::storage::{InMemoryStore, VectorStore};
use crate::AppState;

const TOKEN: &str = "adk_default";

fn test_config() -> Config {
    let mut config = Config::default();
    config.models.default_model = "model-0".to_string();
    config.models.available_models = vec!["model-0".to_string(), "model-1".to_string()];
    config
}

fn router_with(config: Config, store: Option<Arc<dyn VectorStore>>) -> (Router, Arc<MockLoader>) {
    let loader = Arc::new(MockLoader::new(8));
    let state = AppState::new(config, loader.clone(), store).unwrap();
    (create_router(state), loader)
}

fn router() -> Router {
    let store: Arc<dyn VectorStore> = Arc::new(InMemoryStore::new());
    router_with(test_config(), Some(store)).0
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn post(uri: &str, body: Value) -> Request<Body> {
    request(Method::POST, uri, Some(TOKEN), Some(body))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_missing_or_wrong_token_is_unauthorized() {
    let app = router();

    let (status, body) = send(&app, request(Method::GET, "/v1/models", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized"}));

    let (status, _) = send(&app, request(Method::GET, "/v1/models", Some("nope"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let lowercase = Request::builder()
        .uri("/v1/models")
        .header(header::AUTHORIZATION, format!("bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, lowercase).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = router();
    let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["qdrant_connected"], true);
}

#[tokio::test]
async fn test_calculate_tokens_exact() {
    let app = router();
    let (status, body) = send(
        &app,
        post("/v1/calculate-tokens", json!({"input": "hello world", "model": "gpt-4"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"model": "gpt-4", "tokens": 2, "note": "Token count is exact"})
    );
}

#[tokio::test]
async fn test_calculate_tokens_estimate_and_validation() {
    let app = router();

    let (status, body) = send(
        &app,
        post("/v1/calculate-tokens", json!({"input": "abcdefgh", "model": "llama"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokens"], 2);
    assert_eq!(body["note"], "Token count is estimated for non-OpenAI models");

    let (status, body) = send(&app, post("/v1/calculate-tokens", json!({"input": ["a"]}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Input must be a string");

    let (status, body) = send(&app, post("/v1/calculate-tokens", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing 'input' field");
}

#[tokio::test]
async fn test_batch_with_remote_disabled_is_bad_request() {
    let app = router();
    let (status, body) = send(&app, post("/v1/embeddings", json!({"input": ["a", "b", "c"]}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "RunPod is disabled and cannot process multiple texts");
}

#[tokio::test]
async fn test_single_text_embeds_locally() {
    let (app, loader) = router_with(test_config(), None);
    let (status, body) = send(&app, post("/v1/embeddings", json!({"input": "hello world"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["object"], "list");
    assert_eq!(body["model"], "model-0");
    assert_eq!(body["data"][0]["object"], "embedding");
    assert_eq!(body["data"][0]["index"], 0);
    assert_eq!(body["data"][0]["embedding"].as_array().unwrap().len(), 8);
    assert_eq!(body["usage"]["input_text_count"], 1);
    assert_eq!(body["usage"]["prompt_tokens"], 2);
    assert_eq!(loader.load_count(), 1);

    let (_, models) = send(&app, request(Method::GET, "/v1/models", Some(TOKEN), None)).await;
    assert_eq!(models["loaded"], json!(["model-0"]));
    assert_eq!(models["default"], "model-0");
}

#[tokio::test]
async fn test_batch_forwarded_to_remote() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header_matcher("authorization", "Bearer runpod-key"))
        .and(body_json(json!({"input": {"model": "model-1", "input": ["a", "b"]}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "job-1",
            "status": "COMPLETED",
            "output": [{"object": "list", "data": [], "model": "model-1"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.remote.enabled = true;
    config.remote.url = Some(server.uri());
    config.remote.api_key = Some("runpod-key".to_string());
    config.remote.timeout = Duration::from_secs(5);
    let (app, loader) = router_with(config, None);

    let (status, body) = send(
        &app,
        post("/v1/embeddings", json!({"input": ["a", "b"], "model": "model-1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"object": "list", "data": [], "model": "model-1"}));
    assert_eq!(loader.load_count(), 0);
}

#[tokio::test]
async fn test_disallowed_model_is_bad_request() {
    let (app, loader) = router_with(test_config(), None);
    let (status, body) = send(
        &app,
        post("/v1/embeddings", json!({"input": "x", "model": "model-9"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("model-9"));
    assert_eq!(loader.load_count(), 0);
}

#[tokio::test]
async fn test_malformed_embeddings_requests() {
    let app = router();

    let (status, body) = send(&app, post("/v1/embeddings", json!({"input": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Input list must not be empty");

    let broken = Request::builder()
        .method(Method::POST)
        .uri("/v1/embeddings")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upsert_without_id_generates_fresh_ids() {
    let app = router();
    let upsert = json!({"vector": [0.1, 0.2], "payload": {"lang": "id"}});

    let (status, first) = send(&app, post("/vector/upsert", upsert.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(&app, post("/vector/upsert", upsert)).await;

    assert_eq!(first["success"], true);
    assert_ne!(first["point_id"], second["point_id"]);

    let (_, list) = send(&app, request(Method::GET, "/collection/list", Some(TOKEN), None)).await;
    assert_eq!(list, json!({"success": true, "collections": ["qdrant_default"]}));
}

#[tokio::test]
async fn test_collection_and_vector_lifecycle() {
    let app = router();

    let (status, body) = send(
        &app,
        post("/collection/create", json!({"collection_name": "docs", "vector_size": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Collection 'docs' created.");

    for (id, vector, lang) in [("a", [1.0, 0.0], "en"), ("b", [0.9, 0.1], "id")] {
        let (status, _) = send(
            &app,
            post(
                "/vector/upsert",
                json!({"collection_name": "docs", "point_id": id, "vector": vector, "payload": {"lang": lang}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        post(
            "/vector/search",
            json!({"collection_name": "docs", "vector": [1.0, 0.0], "filters": {"must": [{"lang": "id"}]}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "b");
    assert!(results[0].get("vector").is_none());

    let (_, info) = send(
        &app,
        request(Method::GET, "/collection/info?collection_name=docs", Some(TOKEN), None),
    )
    .await;
    assert_eq!(info["info"]["points_count"], 2);

    let (status, body) = send(
        &app,
        post("/vector/delete", json!({"collection_name": "docs", "point_id": ["a", "b"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Vector(s) [\"a\", \"b\"] deleted from 'docs'");

    let (status, body) = send(&app, post("/collection/delete", json!({"collection_name": "docs"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Collection 'docs' deleted.");
}

#[tokio::test]
async fn test_store_route_validation_messages() {
    let app = router();

    let (status, body) = send(&app, post("/collection/create", json!({"collection_name": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "message": "collection_name and vector_size are required"})
    );

    let (status, body) = send(&app, post("/vector/search", json!({"top_k": 2}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Vector is required");

    let (status, body) = send(&app, post("/vector/delete", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "point_id is required");

    let (status, body) = send(&app, request(Method::GET, "/collection/info", Some(TOKEN), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "collection_name is required");
}

#[tokio::test]
async fn test_unavailable_store_reports_not_initialized() {
    let (app, _) = router_with(test_config(), None);

    let (status, body) = send(&app, request(Method::GET, "/collection/list", Some(TOKEN), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"success": false, "message": "Qdrant client not initialized."})
    );

    let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["qdrant_connected"], false);
}

#[tokio::test]
async fn test_health_and_cache_hits_served_during_slow_load() {
    let (app, loader) = router_with(test_config(), None);
    let (status, _) = send(
        &app,
        post("/v1/embeddings", json!({"input": "warm", "model": "model-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    loader.slow_on("model-0", Duration::from_secs(5));

    let pending = {
        let app = app.clone();
        tokio::spawn(async move { send(&app, post("/v1/embeddings", json!({"input": "x"}))).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let health = tokio::time::timeout(
        Duration::from_millis(500),
        send(&app, request(Method::GET, "/health", None, None)),
    )
    .await
    .expect("health must not wait for the model load");
    assert_eq!(health.0, StatusCode::OK);
    assert_eq!(health.1["loaded_models"], json!(["model-1"]));

    let hit = tokio::time::timeout(
        Duration::from_millis(500),
        send(&app, post("/v1/embeddings", json!({"input": "y", "model": "model-1"}))),
    )
    .await
    .expect("cached model must not wait for the model load");
    assert_eq!(hit.0, StatusCode::OK);

    assert!(!pending.is_finished());
    pending.abort();
}

#[tokio::test]
async fn test_local_inference_failure_is_internal_error() {
    let (app, loader) = router_with(test_config(), None);
    loader.fail_generation_on("model-0");

    let (status, body) = send(&app, post("/v1/embeddings", json!({"input": "x"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to generate embedding"));
    assert_eq!(body["message"], "generation_failed");
}

#[tokio::test]
async fn test_non_string_model_is_bad_request() {
    let (app, loader) = router_with(test_config(), None);

    for model in [json!(123), Value::Null] {
        let (status, body) = send(&app, post("/v1/embeddings", json!({"input": "x", "model": model}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Model must be a string");
    }
    assert_eq!(loader.load_count(), 0);
}
