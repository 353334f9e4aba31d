//! API error type and HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

/// API-level errors.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or invalid request payload.
    BadRequest(String),
    /// Resource does not exist or is not publicly visible.
    NotFound(String),
    /// Unexpected server-side failure.
    Internal(String),
}

impl From<eventa_core::Error> for ApiError {
    fn from(error: eventa_core::Error) -> Self {
        match error {
            eventa_core::Error::EventNotFound(id) => {
                ApiError::NotFound(format!("Event not found: {}", id))
            }
            eventa_core::Error::NotFound(msg) => ApiError::NotFound(msg),
            eventa_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
