//! Unified error handling for the HTTP boundary.
//!
//! Provides a unified `AppError` type that maps service errors onto HTTP
//! status codes. All route handlers return `Result<T, AppError>`. The read
//! path distinguishes three outcomes: a missing identifier in the request
//! (400), an identifier that is not in the data (404), and an internal
//! failure (500, with details redacted from the response body).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::OrderError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Order operation failed.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A required background component is not running.
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Order(err) => match err {
                OrderError::Decode(_) => StatusCode::BAD_REQUEST,
                OrderError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                OrderError::NotFound(_) => StatusCode::NOT_FOUND,
                OrderError::Duplicate(_) => StatusCode::CONFLICT,
                OrderError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request error");
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
