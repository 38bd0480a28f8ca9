use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use crate::rag::RagError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::EmptyInput => ApiError::BadRequest(err.to_string()),
            other => ApiError::internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "detail": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_maps_to_bad_request() {
        let err = ApiError::from(RagError::EmptyInput);
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg == "Question cannot be empty"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn pipeline_failures_map_to_internal() {
        let not_ready = ApiError::from(RagError::NotReady);
        assert_eq!(not_ready.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let upstream = ApiError::from(RagError::Upstream("generation failed".to_string()));
        match upstream {
            ApiError::Internal(msg) => assert!(msg.contains("generation failed")),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
