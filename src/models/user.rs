//! User data models and API request/response types.
//!
//! This module defines:
//! - `User`: Database entity representing a user
//! - `CreateUserRequest` / `UpdateUserRequest`: Request bodies
//! - `UserResponse`: Response body returned to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table. Rows are soft-deleted through `deleted_at`;
/// the email is unique among rows that are not deleted.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Values needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub active: bool,
}

/// Request body for creating a user.
///
/// # JSON Example
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
/// # Validation
///
/// - `email`: Required, must look like `local@domain.tld`
/// - `first_name` / `last_name`: 2-50 characters
/// - `age`: 1-120
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
}

/// Request body for updating a user (full replacement).
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub active: bool,
}

/// Response body for user endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Convert a stored User into the API shape (drops `deleted_at`).
impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            age: user.age,
            active: user.active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn john(age: i32) -> User {
        let now = Utc::now();
        User {
            id: 7,
            email: "john@example.com".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            age,
            active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn response_maps_every_field() {
        let user = john(30);
        let response = UserResponse::from(user.clone());

        assert_eq!(response.id, user.id);
        assert_eq!(response.email, user.email);
        assert_eq!(response.first_name, user.first_name);
        assert_eq!(response.last_name, user.last_name);
        assert_eq!(response.age, user.age);
        assert_eq!(response.active, user.active);
        assert_eq!(response.created_at, user.created_at);
    }
}
