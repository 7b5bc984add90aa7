//! Persistence interfaces for API keys and users.
//!
//! Services hold `Arc<dyn ...Store>` handles so the same business logic runs
//! against PostgreSQL in production and against process-local maps in tests
//! and database-less runs.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::api_key::{ApiKey, NewApiKey};
use crate::models::user::{NewUser, User};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryApiKeyStore, InMemoryUserStore};
pub use postgres::{PgApiKeyStore, PgUserStore};

/// Storage for API key records.
///
/// Soft-deleted records are invisible to every method except
/// `exists_by_hash`, which covers the same rows as the unique constraint.
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// Insert a key.
    ///
    /// # Errors
    ///
    /// - `Validation`: empty name or hash
    /// - `DuplicateKey`: a record with the same hash exists
    async fn create(&self, new_key: NewApiKey) -> Result<ApiKey, AppError>;

    /// # Errors
    ///
    /// - `NotFound`: no live record with this id
    async fn get_by_id(&self, id: i64) -> Result<ApiKey, AppError>;

    /// Indexed lookup used on every authenticated request.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no live record with this hash
    async fn get_by_hash(&self, key_hash: &str) -> Result<ApiKey, AppError>;

    /// All live records, in no particular order.
    async fn list(&self) -> Result<Vec<ApiKey>, AppError>;

    /// Persist name, description, active and expiry of `api_key`. The hash is never rewritten.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no live record with this id
    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, AppError>;

    /// Soft-delete a record.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no live record with this id
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Best-effort probe used before inserts; `create` stays authoritative.
    async fn exists_by_hash(&self, key_hash: &str) -> Result<bool, AppError>;
}

/// Storage for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// # Errors
    ///
    /// - `Conflict`: a live user already has this email
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn get_by_id(&self, id: i64) -> Result<User, AppError>;

    /// Live user owning `email`, if any.
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn list(&self) -> Result<Vec<User>, AppError>;

    async fn update(&self, user: &User) -> Result<User, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Number of live users.
    async fn count(&self) -> Result<i64, AppError>;
}

pub(crate) fn api_key_not_found() -> AppError {
    AppError::not_found("API key not found")
}

pub(crate) fn user_not_found() -> AppError {
    AppError::not_found("user not found")
}

pub(crate) fn email_taken() -> AppError {
    AppError::Conflict("user with this email already exists".to_string())
}

/// Shared precondition for every backend's `ApiKeyStore::create`.
pub(crate) fn check_new_api_key(new_key: &NewApiKey) -> Result<(), AppError> {
    if new_key.name.trim().is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if new_key.key_hash.is_empty() {
        return Err(AppError::validation("key hash is required"));
    }
    Ok(())
}
