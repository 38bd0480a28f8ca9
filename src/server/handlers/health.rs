use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// Liveness: answers whether or not the index is loaded.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "status": "active",
        "message": "UKGC RAG API is running"
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "index_ready": state.rag.is_ready(),
        "indexed_chunks": state.rag.indexed_chunks(),
        "uptime_secs": state.uptime_secs()
    }))
}
