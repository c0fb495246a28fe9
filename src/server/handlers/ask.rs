use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

fn validate(query: &str, top_k: usize, state: &AppState) -> Result<usize, ApiError> {
    if query.trim().is_empty() {
        return Err(ApiError::BadRequest("Query must not be empty".to_string()));
    }
    if query.chars().count() > state.settings.max_query_length {
        return Err(ApiError::BadRequest(format!(
            "Query exceeds maximum length of {} characters",
            state.settings.max_query_length
        )));
    }
    Ok(top_k.clamp(1, state.settings.max_results))
}

/// Full pipeline: retrieve, assemble context, generate a tiered answer.
/// Generation failures come back as a well-formed error-tier response, so
/// this handler only fails on invalid input.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let top_k = validate(&request.query, request.top_k, &state)?;
    let response = state.rag.ask(request.query.trim(), top_k).await;
    Ok(Json(response))
}

/// Retrieval only, no generation. Useful for inspecting what the index
/// returns for a query.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let top_k = validate(&request.query, request.top_k, &state)?;
    let hits = state
        .rag
        .retrieve_documents(request.query.trim(), top_k)
        .await?;
    let count = hits.len();
    Ok(Json(json!({
        "query": request.query.trim(),
        "results": hits,
        "count": count,
    })))
}
