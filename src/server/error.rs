use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::ErrorKind;
use crate::summarizer::SummarizeError;

/// An error rendered as `{"detail": "..."}` with a matching status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl From<SummarizeError> for ApiError {
    fn from(err: SummarizeError) -> Self {
        let (status, prefix) = match err.kind() {
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "PDF file not found"),
            ErrorKind::MalformedInput | ErrorKind::InvalidRequest => {
                (StatusCode::BAD_REQUEST, "Invalid request")
            }
            ErrorKind::Connection => (StatusCode::SERVICE_UNAVAILABLE, "Connection error"),
            ErrorKind::Unexpected => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        Self {
            status,
            detail: format!("{}: {}", prefix, err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
