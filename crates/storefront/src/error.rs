//! Unified error handling for the HTTP boundary.
//!
//! Every route handler returns `Result<T, AppError>`. Each variant carries a
//! stable machine code that is both logged and returned in the JSON body;
//! the user-facing message for server errors stays generic so internals are
//! never exposed, while the code survives into the logs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::ServiceError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Database operation failed outside a service.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for logs and response bodies.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Service(err) => match err {
                ServiceError::NotFound(_) => "not_found",
                ServiceError::InvalidArgument(_) => "invalid_argument",
                ServiceError::InvalidState(_) => "invalid_state",
                ServiceError::InsufficientStock { .. } => "insufficient_stock",
                ServiceError::Conflict(_) => "conflict",
                ServiceError::Forbidden(_) => "forbidden",
                ServiceError::Repository(_) => "storage_error",
            },
            Self::Database(_) => "storage_error",
            Self::Unauthorized(_) => "unauthorized",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Service(err) => match err {
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::InvalidArgument(_) | ServiceError::InvalidState(_) => {
                    StatusCode::BAD_REQUEST
                }
                ServiceError::InsufficientStock { .. } | ServiceError::Conflict(_) => {
                    StatusCode::CONFLICT
                }
                ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
                ServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        } else {
            tracing::debug!(error = %self, code, "request rejected");
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
