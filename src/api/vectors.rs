//! Vector point endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde_json::{json, Map, Value};

use super::collections::collection_name;
use super::{json_body, StoreApiError};
use crate::AppState;

const DEFAULT_TOP_K: usize = 3;

fn target_collection<'a>(body: &'a Value, state: &'a AppState) -> &'a str {
    collection_name(body).unwrap_or_else(|| state.vectors.default_collection())
}

/// Missing, null and empty vectors are all "required" errors.
fn parse_vector(body: &Value) -> Result<Vec<f32>, StoreApiError> {
    let items = match body.get("vector") {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(StoreApiError::bad_request("Vector is required")),
    };

    items
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect::<Option<Vec<f32>>>()
        .ok_or_else(|| StoreApiError::bad_request("Vector must be a list of numbers"))
}

fn parse_payload(body: &Value) -> Result<Map<String, Value>, StoreApiError> {
    match body.get("payload") {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(payload)) => Ok(payload.clone()),
        Some(_) => Err(StoreApiError::bad_request("Payload must be an object")),
    }
}

fn parse_top_k(body: &Value) -> Result<usize, StoreApiError> {
    let top_k = match body.get("top_k") {
        None | Some(Value::Null) => return Ok(DEFAULT_TOP_K),
        Some(Value::Number(n)) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };
    top_k.ok_or_else(|| StoreApiError::bad_request("top_k must be a non-negative integer"))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `point_id` for deletion: one id or a list of ids.
fn parse_point_ids(body: &Value) -> Result<Vec<String>, StoreApiError> {
    let required = || StoreApiError::bad_request("point_id is required");
    match body.get("point_id") {
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(id_string)
            .collect::<Option<Vec<String>>>()
            .ok_or_else(|| StoreApiError::bad_request("point_id must be a string, a number or a list of them")),
        Some(value) => id_string(value).map(|id| vec![id]).ok_or_else(required),
        None => Err(required()),
    }
}

pub async fn upsert_vector(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, StoreApiError> {
    let body = json_body(body)?;
    let vector = parse_vector(&body)?;
    let payload = parse_payload(&body)?;
    let point_id = body.get("point_id").and_then(id_string);
    let collection = target_collection(&body, &state);

    let id = state
        .vectors
        .save_vector(vector, payload, collection, point_id)
        .await?;
    Ok(Json(json!({"success": true, "point_id": id})))
}

pub async fn search_vectors(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, StoreApiError> {
    let body = json_body(body)?;
    let vector = parse_vector(&body)?;
    let top_k = parse_top_k(&body)?;
    let include_vector = body.get("include_vector").and_then(Value::as_bool).unwrap_or(false);
    let collection = target_collection(&body, &state);

    let results = state
        .vectors
        .search_vector(vector, collection, top_k, include_vector, body.get("filters"))
        .await?;
    Ok(Json(json!({"success": true, "results": results})))
}

pub async fn delete_vectors(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, StoreApiError> {
    let body = json_body(body)?;
    let ids = parse_point_ids(&body)?;
    let collection = target_collection(&body, &state);

    state.vectors.delete_vector_by_id(&ids, collection).await?;

    let shown = match ids.as_slice() {
        [single] => single.clone(),
        many => format!("{:?}", many),
    };
    Ok(Json(json!({
        "success": true,
        "message": format!("Vector(s) {} deleted from '{}'", shown, collection),
    })))
}
