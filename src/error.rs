//! Error types for RustScribe
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Authentication required (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Access denied (403)
    #[error("Access denied")]
    Forbidden,

    /// Validation error (400), one message per violated rule
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Uniqueness invariant would be violated (409)
    #[error("{0}")]
    AlreadyExists(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Blob storage error (500)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Validation error with a single message
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        AppError::AlreadyExists(message.into())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Whether a database error is a unique-constraint conflict.
///
/// Check-then-act uniqueness guards in the services can race; the
/// unique indexes in the store are the source of truth, and callers
/// use this to translate the conflict into `AlreadyExists`.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db) if db.is_unique_violation()
    )
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body. Internal detail is logged, never sent
    /// to the client.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, messages, error_type) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, vec![msg.clone()], "not_found"),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                vec![self.to_string()],
                "unauthorized",
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, vec![self.to_string()], "forbidden"),
            AppError::Validation(msgs) => (StatusCode::BAD_REQUEST, msgs.clone(), "validation"),
            AppError::AlreadyExists(msg) => (StatusCode::CONFLICT, vec![msg.clone()], "conflict"),
            AppError::Database(error) => {
                tracing::error!(%error, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec!["Database error".to_string()],
                    "database",
                )
            }
            AppError::Storage(error) => {
                tracing::error!(%error, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec!["Storage error".to_string()],
                    "storage",
                )
            }
            AppError::Config(error) => {
                tracing::error!(%error, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec!["Configuration error".to_string()],
                    "config",
                )
            }
            AppError::Internal(error) => {
                tracing::error!(%error, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec!["Internal server error".to_string()],
                    "internal",
                )
            }
        };

        // Record error metric
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let body = Json(serde_json::json!({
            "errors": messages,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
