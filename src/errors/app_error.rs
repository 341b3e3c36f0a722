use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::errors::BrokerError;

/// HTTP-facing application error type for the synthesis service.
#[derive(Debug)]
pub enum AppError {
    InternalServerError(String),
    BadRequest(String),
    NotFound(String),
    Timeout(String),
    ServiceUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "Bad request")
            }
            AppError::NotFound(msg) => {
                tracing::warn!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, "Resource not found")
            }
            AppError::Timeout(msg) => {
                tracing::warn!("Timeout: {}", msg);
                (StatusCode::GATEWAY_TIMEOUT, "Synthesis timed out")
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InternalServerError(msg) => write!(f, "Internal server error: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            AppError::NotFound(msg) => write!(f, "Not found: {msg}"),
            AppError::Timeout(msg) => write!(f, "Timeout: {msg}"),
            AppError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<BrokerError> for AppError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::EmptyText | BrokerError::TextTooLong { .. } => {
                AppError::BadRequest(err.to_string())
            }
            BrokerError::JobNotFound(_) => AppError::NotFound(err.to_string()),
            BrokerError::QueueFull(_) => AppError::ServiceUnavailable(err.to_string()),
            BrokerError::Timeout(_) => AppError::Timeout(err.to_string()),
            BrokerError::Engine(_) | BrokerError::AlreadyTerminal { .. } => {
                AppError::InternalServerError(err.to_string())
            }
        }
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
