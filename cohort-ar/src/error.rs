//! Error types for cohort-ar

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::document::DocumentError;
use crate::reconcile::ReconcileError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Upload could not be decoded (400)
    #[error("Unreadable document: {0}")]
    Document(#[from] DocumentError),

    /// Engine rejected its input (400)
    #[error("Reconciliation rejected: {0}")]
    Reconcile(#[from] ReconcileError),

    /// cohort-common error
    #[error("Common error: {0}")]
    Common(#[from] cohort_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Document(DocumentError::UnsupportedType(mime)) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                format!("unsupported document type: {}", mime),
            ),
            ApiError::Document(ref err) => {
                (StatusCode::BAD_REQUEST, "INVALID_DOCUMENT", err.to_string())
            }
            ApiError::Reconcile(ref err) => {
                (StatusCode::BAD_REQUEST, "INVALID_RECONCILIATION_INPUT", err.to_string())
            }
            ApiError::Common(cohort_common::Error::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", msg)
            }
            ApiError::Common(cohort_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
            }
            ApiError::Common(ref err) => {
                tracing::error!(error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR", err.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
