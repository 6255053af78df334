//! API errors and their JSON bodies

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::models::ModelError;
use crate::storage::StorageError;

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced to HTTP clients.
///
/// Only `NotFound` and `BadRequest` carry meaning for clients; storage
/// failures are logged and reported as a generic 500.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ModelError> for ApiError {
    fn from(error: ModelError) -> Self {
        Self::BadRequest(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Storage(error) => {
                tracing::error!(%error, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
