//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Delegates to a service (validation, storage, metrics)
//! 3. Returns HTTP response (JSON, status code)

use axum::{Json, extract::rejection::JsonRejection};

use crate::error::AppError;

/// API key management endpoints
pub mod api_keys;

/// Liveness and database connectivity
pub mod health;

/// Prometheus scrape endpoint
pub mod metrics;

/// User management endpoints
pub mod users;

/// Parse a path segment as a record id.
///
/// `resource` names the record in the error message, e.g. "API key".
pub(crate) fn parse_id(raw: &str, resource: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::validation(format!("{resource} ID must be a valid integer")))
}

/// Unwrap a JSON body, turning extractor rejections into the standard error body.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}
