use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::errors::ApiError;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "index_loaded": !state.index.is_empty(),
        "documents": state.index.len(),
    }))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.index.stats())
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let metadata = state
        .index
        .get_document(&doc_id)
        .ok_or_else(|| ApiError::NotFound(format!("No document with id {doc_id}")))?;
    Ok(Json(json!({
        "doc_id": doc_id,
        "metadata": metadata,
    })))
}
