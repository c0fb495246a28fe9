use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{ask, health};
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
///
/// - Health and index stats endpoints
/// - `/api/ask` for the full question-answering pipeline
/// - `/api/search` for retrieval without generation
/// - CORS and request tracing layers
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/stats", get(health::stats))
        .route("/api/documents/:doc_id", get(health::get_document))
        .route("/api/ask", post(ask::ask))
        .route("/api/search", post(ask::search))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::ACCEPT, header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
}
