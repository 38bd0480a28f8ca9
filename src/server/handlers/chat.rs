use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::rag::{QueryResult, RagError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

/// Answers a question from the indexed conditions, with citations.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<QueryResult>, ApiError> {
    if request.question.trim().is_empty() {
        return Err(RagError::EmptyInput.into());
    }

    let result = state.rag.query(&request.question).await.map_err(|err| {
        tracing::warn!(error = %err, "chat request failed");
        ApiError::from(err)
    })?;

    Ok(Json(result))
}
