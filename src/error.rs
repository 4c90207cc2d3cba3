//! Error handling module
//!
//! Application error type and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::store::StoreError;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::Store(err) => match err {
                StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                StoreError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
                StoreError::InsufficientFunds { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_funds")
                }
                StoreError::ConstraintViolation(_) => {
                    (StatusCode::CONFLICT, "constraint_violation")
                }
                StoreError::DeadlineExceeded(_) => {
                    (StatusCode::GATEWAY_TIMEOUT, "deadline_exceeded")
                }
                StoreError::TransactionFailed { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "transaction_failed")
                }
                StoreError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        // Server-side failures are logged in full and reported without driver detail
        let (error, details) = if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
            (status.canonical_reason().unwrap_or("error").to_string(), None)
        } else {
            let details = match &self {
                AppError::InvalidRequest(msg) | AppError::Store(StoreError::InvalidArgument(msg)) => {
                    Some(msg.clone())
                }
                _ => None,
            };
            (self.to_string(), details)
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
