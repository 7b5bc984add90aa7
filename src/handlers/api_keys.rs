//! API key management HTTP handlers.
//!
//! This module implements the key-related API endpoints:
//! - POST /api/v1/api-keys - Create a key (plaintext returned once)
//! - GET /api/v1/api-keys - List keys
//! - GET /api/v1/api-keys/{id} - Get key by ID
//! - PUT /api/v1/api-keys/{id} - Replace name, description, active flag and expiry
//! - DELETE /api/v1/api-keys/{id} - Retire a key
//!
//! Every route sits behind the API key middleware.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::{json_body, parse_id};
use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::api_key::{ApiKeyResponse, CreateApiKeyRequest, UpdateApiKeyRequest},
    state::AppState,
};

const RESOURCE: &str = "API key";

/// Create a new API key.
///
/// # Endpoint
///
/// `POST /api/v1/api-keys`
///
/// # Request Body
///
/// ```json
/// {
///   "name": "ops",
///   "description": "Key for the ops dashboard",
///   "expires_at": "2026-12-31T23:59:59Z"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: The record with the plaintext in `key`.
///   This is the only response that ever contains it.
/// - **Error (400)**: Missing or malformed name
/// - **Error (401)**: Missing or invalid API key
pub async fn create_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateApiKeyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiKeyResponse>), AppError> {
    let request = json_body(payload)?;
    let created = state.api_keys.create_key(request).await?;

    tracing::info!(
        api_key_id = created.record.id,
        created_by = %auth.api_key_name,
        created_by_id = auth.api_key_id,
        "API key issued"
    );

    Ok((StatusCode::CREATED, Json(ApiKeyResponse::from(created))))
}

/// List all live API keys ordered by id, with keys masked.
pub async fn list_api_keys(
    State(state): State<AppState>,
) -> Result<Json<Vec<ApiKeyResponse>>, AppError> {
    let keys = state.api_keys.list_keys().await?;

    Ok(Json(keys.into_iter().map(ApiKeyResponse::from).collect()))
}

/// Get an API key by ID.
///
/// # Response
///
/// - **Success (200 OK)**: The record with `"key": "***"`
/// - **Error (400)**: ID is not a positive integer
/// - **Error (404)**: Unknown or deleted key
pub async fn get_api_key(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiKeyResponse>, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    let api_key = state.api_keys.get_key(id).await?;

    Ok(Json(ApiKeyResponse::from(api_key)))
}

/// Update an API key.
///
/// # Endpoint
///
/// `PUT /api/v1/api-keys/{id}`
///
/// # Request Body
///
/// ```json
/// {
///   "name": "ops",
///   "description": "rotated",
///   "active": false
/// }
/// ```
///
/// `active` is required. Leaving out `expires_at` removes any expiry.
pub async fn update_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateApiKeyRequest>, JsonRejection>,
) -> Result<Json<ApiKeyResponse>, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    let request = json_body(payload)?;
    let api_key = state.api_keys.update_key(id, request).await?;

    tracing::info!(api_key_id = id, updated_by = %auth.api_key_name, "API key modified");

    Ok(Json(ApiKeyResponse::from(api_key)))
}

/// Delete an API key. Responds 204 with no body.
pub async fn delete_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    state.api_keys.delete_key(id).await?;

    tracing::info!(api_key_id = id, deleted_by = %auth.api_key_name, "API key retired");

    Ok(StatusCode::NO_CONTENT)
}
