use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// A credential the request needs is not configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        if e.is_rate_limited() {
            AppError::RateLimited(e.to_string())
        } else {
            AppError::Llm(e.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Configuration(msg) => {
                tracing::warn!("Configuration error: {msg}");
                (StatusCode::UNAUTHORIZED, "CONFIGURATION_ERROR", msg.clone())
            }
            AppError::RateLimited(msg) => {
                tracing::warn!("Rate limited: {msg}");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMITED",
                    "API quota exceeded. Please try again later.".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
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
