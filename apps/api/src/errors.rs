use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::persistence::{LoadError, PersistError};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persist(PersistError),

    #[error("Stored document is corrupt: {0}")]
    Corrupt(String),

    #[error("S3 error: {0}")]
    S3(String),
}

impl From<LoadError> for AppError {
    fn from(e: LoadError) -> Self {
        match e {
            LoadError::NotFound(id) => AppError::NotFound(format!("Document {id} not found")),
            LoadError::Database(e) => AppError::Persist(PersistError::Database(e)),
            LoadError::Corrupt(e) => AppError::Corrupt(e.to_string()),
        }
    }
}

impl From<PersistError> for AppError {
    fn from(e: PersistError) -> Self {
        match e {
            PersistError::Deleted(id) => AppError::NotFound(format!("Document {id} not found")),
            PersistError::Snapshot(msg) => AppError::S3(msg),
            other => AppError::Persist(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Persist(e) => {
                tracing::error!("Persistence error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "The document could not be saved".to_string(),
                )
            }
            AppError::Corrupt(msg) => {
                tracing::error!("Corrupt document: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CORRUPT_DOCUMENT",
                    "The stored document could not be read".to_string(),
                )
            }
            AppError::S3(msg) => {
                tracing::error!("S3 error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "S3_ERROR",
                    "A storage error occurred".to_string(),
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
