use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Upload failed the format gate (extension or content signature).
    /// Always fatal; raised before any extraction is attempted.
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    /// Text extraction itself failed. Usually recovered inside the pipeline;
    /// surfaces only when it leaves nothing resolvable.
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Terminal pipeline outcome: no required field could be resolved from
    /// any source.
    #[error("Resume parsing failed: {0}")]
    Parsing(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::InvalidFormat(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "INVALID_FORMAT",
                msg.clone(),
            ),
            AppError::Extraction(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_FAILED",
                msg.clone(),
            ),
            AppError::Parsing(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "PARSING_FAILED",
                msg.clone(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
