use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ai_client::AiError;
use crate::drafts::interchange::DraftError;
use crate::export::ExportError;
use crate::storage::StorageError;
use crate::upload::UploadError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Storage(e) | AppError::Draft(DraftError::Storage(e)) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Draft(e @ DraftError::InvalidFormat(_)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_DRAFT_FORMAT",
                e.to_string(),
            ),
            AppError::Draft(e @ DraftError::ReadFailed(_)) => {
                (StatusCode::BAD_REQUEST, "DRAFT_READ_FAILED", e.to_string())
            }
            AppError::Export(e) => match e {
                ExportError::TargetNotFound => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "EXPORT_TARGET_NOT_FOUND",
                    e.to_string(),
                ),
                ExportError::CaptureFailed(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "CAPTURE_FAILED", e.to_string())
                }
                ExportError::Encode(msg) => {
                    tracing::error!("Export encoding failed: {msg}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "EXPORT_FAILED",
                        "Could not assemble the exported file".to_string(),
                    )
                }
            },
            AppError::Ai(e) => match e {
                AiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", e.to_string()),
                AiError::QuotaExhausted => {
                    (StatusCode::PAYMENT_REQUIRED, "QUOTA_EXHAUSTED", e.to_string())
                }
                AiError::AlreadyInFlight(_) => {
                    (StatusCode::CONFLICT, "AI_REQUEST_IN_FLIGHT", e.to_string())
                }
                AiError::MalformedResponse(msg) => {
                    tracing::error!("Malformed AI response: {msg}");
                    (
                        StatusCode::BAD_GATEWAY,
                        "AI_MALFORMED_RESPONSE",
                        "The AI service returned an unexpected response".to_string(),
                    )
                }
                AiError::ServiceUnavailable { .. } | AiError::Http(_) => {
                    tracing::error!("AI service error: {e}");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "AI_SERVICE_UNAVAILABLE",
                        "AI service error".to_string(),
                    )
                }
            },
            AppError::Upload(e) => {
                let status = match e {
                    UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                    UploadError::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    UploadError::Empty | UploadError::Unreadable(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                };
                (status, "UPLOAD_REJECTED", e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
