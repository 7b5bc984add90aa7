//! Health check endpoint for service monitoring.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{db, state::AppState};

/// Health check response.
///
/// Returns service status and database connectivity.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when every dependency answers, `degraded` otherwise
    pub status: String,

    pub message: String,

    /// `connected`, `unavailable` or `in-memory`
    pub database: String,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// # Checks
///
/// - Database connectivity (executes simple query) when running on PostgreSQL
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "ok",
///   "message": "Service is healthy",
///   "database": "connected",
///   "timestamp": "2025-12-21T19:00:00Z"
/// }
/// ```
///
/// # Response (503 Service Unavailable)
///
/// Same shape with `"status": "degraded"` and `"database": "unavailable"`.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.db {
        None => "in-memory",
        Some(pool) => match db::ping(pool).await {
            Ok(()) => "connected",
            Err(e) => {
                tracing::error!(error = %e, "Health check database ping failed");
                "unavailable"
            }
        },
    };

    let (status, label, message) = if database == "unavailable" {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "degraded",
            "Database is unreachable",
        )
    } else {
        (StatusCode::OK, "ok", "Service is healthy")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            message: message.to_string(),
            database: database.to_string(),
            timestamp: Utc::now(),
        }),
    )
}
