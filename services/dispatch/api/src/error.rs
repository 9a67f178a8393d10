//! HTTP error mapping

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dispatch_queue::DispatchError;
use dispatch_session::GatewayError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP callers
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input (400)
    #[error("{0}")]
    InvalidRequest(String),

    /// Gateway failure (500)
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    /// Any other server-side failure (500)
    #[error("{0}")]
    Internal(String),
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::InvalidRequest(msg) => ApiError::InvalidRequest(msg),
            DispatchError::Gateway(e) => ApiError::Gateway(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": message })),
            )
                .into_response(),
            ApiError::Gateway(_) | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": self.to_string() })),
            )
                .into_response(),
        }
    }
}
