//! User management HTTP handlers.
//!
//! - GET /api/v1/users - List users (public)
//! - GET /api/v1/users/{id} - Get user by ID (public)
//! - POST /api/v1/users - Create user (API key)
//! - PUT /api/v1/users/{id} - Replace user (API key)
//! - DELETE /api/v1/users/{id} - Delete user (API key)

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::{json_body, parse_id};
use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::user::{CreateUserRequest, UpdateUserRequest, UserResponse},
    state::AppState,
};

const RESOURCE: &str = "user";

/// Create a new user.
///
/// # Endpoint
///
/// `POST /api/v1/users`
///
/// # Request Body
///
/// ```json
/// {
///   "email": "user@example.com",
///   "first_name": "John",
///   "last_name": "Doe",
///   "age": 30
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: The created user
/// - **Error (400)**: Invalid email, name or age
/// - **Error (401)**: Missing or invalid API key
/// - **Error (409)**: Email already in use
pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let request = json_body(payload)?;
    let user = state.users.create_user(request).await?;

    tracing::info!(
        user_id = user.id,
        email = %user.email,
        api_key_id = auth.api_key_id,
        api_key = %auth.api_key_name,
        "User created"
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.users.list_users().await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    let user = state.users.get_user(id).await?;

    Ok(Json(UserResponse::from(user)))
}

/// Replace a user. All fields, including `active`, are required.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    let request = json_body(payload)?;
    let user = state.users.update_user(id, request).await?;

    tracing::info!(user_id = id, api_key = %auth.api_key_name, "User updated");

    Ok(Json(UserResponse::from(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    state.users.delete_user(id).await?;

    tracing::info!(user_id = id, api_key = %auth.api_key_name, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
