//! Collection management endpoints

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{json_body, StoreApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CollectionQuery {
    pub collection_name: Option<String>,
}

pub(crate) fn collection_name(body: &Value) -> Option<&str> {
    body.get("collection_name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
}

/// Positive integer, given as a JSON number or a numeric string.
fn vector_size(body: &Value) -> Option<usize> {
    let size = match body.get("vector_size")? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    usize::try_from(size).ok().filter(|size| *size > 0)
}

pub async fn create_collection(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, StoreApiError> {
    let body = json_body(body)?;
    let (Some(name), Some(size)) = (collection_name(&body), vector_size(&body)) else {
        return Err(StoreApiError::bad_request(
            "collection_name and vector_size are required",
        ));
    };

    state.vectors.create_collection(name, size).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Collection '{}' created.", name),
    })))
}

pub async fn list_collections(State(state): State<AppState>) -> Result<Json<Value>, StoreApiError> {
    let collections = state.vectors.list_collections().await?;
    Ok(Json(json!({"success": true, "collections": collections})))
}

pub async fn collection_info(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
) -> Result<Json<Value>, StoreApiError> {
    let name = query
        .collection_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| StoreApiError::bad_request("collection_name is required"))?;

    let info = state.vectors.collection_info(&name).await?;
    Ok(Json(json!({"success": true, "info": info})))
}

pub async fn delete_collection(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, StoreApiError> {
    let body = json_body(body)?;
    let name = collection_name(&body)
        .ok_or_else(|| StoreApiError::bad_request("collection_name is required"))?;

    state.vectors.delete_collection(name).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Collection '{}' deleted.", name),
    })))
}
