//! Request handlers for the todo REST API.
//!
//! Handlers are generic over the [`ItemStore`] so the router can be built for
//! whichever backend the process started with.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{SecondsFormat, Utc};
use futures::future::try_join_all;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::item::{next_order, validate_text, CreateItem, Item, ItemChanges, TextError};
use crate::store::ItemStore;

pub async fn list_items<S: ItemStore>(
    State(store): State<Arc<S>>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let items = store
        .list_all()
        .await
        .map_err(ApiError::storage("Failed to fetch todos"))?;
    Ok(Json(items))
}

pub async fn create_item<S: ItemStore>(
    State(store): State<Arc<S>>,
    body: Result<Json<CreateItem>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let raw = body
        .ok()
        .and_then(|Json(input)| input.text)
        .ok_or(TextError::Empty)?;
    let text = validate_text(&raw)?;

    let existing = store
        .list_all()
        .await
        .map_err(ApiError::storage("Failed to create todo"))?;
    let item = Item {
        id: Uuid::new_v4().to_string(),
        text,
        completed: false,
        created_at: Utc::now().timestamp_millis(),
        order: next_order(&existing),
    };

    let item = store
        .create(item)
        .await
        .map_err(ApiError::storage("Failed to create todo"))?;
    tracing::debug!(id = %item.id, order = item.order, "created todo");
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item<S: ItemStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    body: Result<Json<ItemChanges>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
    let Json(mut changes) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    if let Some(text) = changes.text.take() {
        changes.text = Some(validate_text(&text)?);
    }

    store
        .update(&id, changes)
        .await
        .map_err(ApiError::storage("Failed to update todo"))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub async fn delete_item<S: ItemStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = store
        .delete(&id)
        .await
        .map_err(ApiError::storage("Failed to delete todo"))?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// Give each listed id its position as `order`. Updates run concurrently;
/// ids that match nothing are skipped and earlier successes are not undone
/// when a later update fails.
pub async fn reorder_items<S: ItemStore>(
    State(store): State<Arc<S>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let ids = reorder_ids(body.ok().map(|Json(value)| value))?;

    let store = &*store;
    let updates = ids.into_iter().enumerate().map(move |(position, id)| async move {
        store.update(&id, ItemChanges::order(position as i64)).await
    });
    let results = try_join_all(updates)
        .await
        .map_err(ApiError::storage("Failed to reorder todos"))?;
    tracing::debug!(
        requested = results.len(),
        matched = results.iter().flatten().count(),
        "reordered todos"
    );

    Ok(Json(json!({ "success": true })))
}

/// The `ids` array of a reorder body.
fn reorder_ids(body: Option<Value>) -> Result<Vec<String>, ApiError> {
    let Some(Value::Array(values)) = body.as_ref().and_then(|body| body.get("ids")) else {
        return Err(ApiError::BadRequest("ids must be an array".to_string()));
    };
    values
        .iter()
        .map(|value| value.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| ApiError::BadRequest("ids must be an array of strings".to_string()))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
