//! Error types for the blob store server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Store(e) => match e {
                StoreError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "not_found", "File not found".to_string())
                }
                StoreError::StorageWrite { .. } => {
                    tracing::error!("Storage error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "storage_error",
                        "Storage error".to_string(),
                    )
                }
                StoreError::StorageRead { .. } => {
                    tracing::error!("Storage read error: {}", e);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "storage_unavailable",
                        "Storage is temporarily unavailable".to_string(),
                    )
                }
                StoreError::StorageCorruption { hash, .. } => {
                    tracing::error!("Storage corruption: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "storage_corruption",
                        format!("Stored content for {} is unavailable", hash),
                    )
                }
                StoreError::Io(_) => {
                    tracing::error!("IO error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "io_error",
                        "IO error".to_string(),
                    )
                }
            },
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BackendError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::PayloadTooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (
                StoreError::NotFound("abc".into()).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                StoreError::StorageWrite {
                    location: "aa/bb/c".into(),
                    source: BackendError::Sdk("boom".into()),
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                StoreError::StorageRead {
                    location: "aa/bb/c".into(),
                    source: BackendError::Sdk("timeout".into()),
                }
                .into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                StoreError::StorageCorruption {
                    hash: "abc".into(),
                    reason: "gone".into(),
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
