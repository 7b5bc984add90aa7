//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Stores, services, the authentication gate and the handlers all return
/// this type. The HTTP status is chosen from the variant alone, never from
/// the message text.
///
/// # Error Categories
///
/// - **Input Errors**: malformed ids, names, emails, ages
/// - **Resource Errors**: unknown or soft-deleted records
/// - **Uniqueness Errors**: duplicate key hash or email
/// - **Authentication Errors**: missing or rejected API keys
/// - **Infrastructure Errors**: database, migrations, random source
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Running the bundled migrations failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{0}")]
    Validation(String),

    /// The requested record does not exist or was deleted.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("{0}")]
    NotFound(String),

    /// A key with the same hash is already stored.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("API key already exists")]
    DuplicateKey,

    /// A uniqueness rule other than the key hash was violated.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("{0}")]
    Conflict(String),

    /// No API key was presented.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("API key is required")]
    CredentialRequired,

    /// The presented API key is unknown, inactive or expired.
    ///
    /// The three cases share this variant so callers cannot tell them apart.
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid API key")]
    InvalidCredential,

    /// The request did not finish within the configured deadline.
    ///
    /// Returns HTTP 408 Request Timeout.
    #[error("request timed out")]
    Timeout,

    /// Unexpected internal failure (e.g., the OS random source failed).
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateKey | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::CredentialRequired | AppError::InvalidCredential => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Database(_) | AppError::Migration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": "Unauthorized",
///   "message": "Invalid API key"
/// }
/// ```
///
/// `error` is the canonical reason phrase of the status code. Internal
/// failures are logged and replaced by a generic message so database details
/// never reach the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AppError::Database(_) | AppError::Migration(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed with internal error");
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn unauthorized_body_has_error_and_message() {
        let (status, body) = body_json(AppError::InvalidCredential).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(body["message"], "Invalid API key");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) = body_json(AppError::Database(sqlx::Error::PoolTimedOut)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn timeout_has_json_body() {
        let (status, body) = body_json(AppError::Timeout).await;

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["error"], "Request Timeout");
        assert_eq!(body["message"], "request timed out");
    }

    #[test]
    fn status_is_chosen_by_variant() {
        assert_eq!(
            AppError::validation("name is required").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("API key not found").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::DuplicateKey.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Conflict("user with this email already exists".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::CredentialRequired.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
