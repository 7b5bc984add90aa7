//! PostgreSQL-backed stores.
//!
//! Queries are plain `sqlx::query_as` calls against the tables created by the
//! bundled migrations. Soft-deleted rows are filtered with `deleted_at IS NULL`.

use async_trait::async_trait;

use super::{
    ApiKeyStore, UserStore, api_key_not_found, check_new_api_key, email_taken, user_not_found,
};
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::api_key::{ApiKey, NewApiKey};
use crate::models::user::{NewUser, User};

const API_KEY_COLUMNS: &str =
    "id, name, key_hash, description, active, expires_at, created_at, updated_at, deleted_at";

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, age, active, created_at, updated_at, deleted_at";

/// True when a query failed on a unique index.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

#[derive(Debug, Clone)]
pub struct PgApiKeyStore {
    pool: DbPool,
}

impl PgApiKeyStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyStore for PgApiKeyStore {
    async fn create(&self, new_key: NewApiKey) -> Result<ApiKey, AppError> {
        check_new_api_key(&new_key)?;

        if self.exists_by_hash(&new_key.key_hash).await? {
            return Err(AppError::DuplicateKey);
        }

        // The probe above can race with a concurrent insert; the unique index decides.
        sqlx::query_as::<_, ApiKey>(&format!(
            r#"
            INSERT INTO api_keys (name, key_hash, description, active, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {API_KEY_COLUMNS}
            "#
        ))
        .bind(&new_key.name)
        .bind(&new_key.key_hash)
        .bind(&new_key.description)
        .bind(new_key.active)
        .bind(new_key.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateKey
            } else {
                AppError::Database(e)
            }
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<ApiKey, AppError> {
        sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(api_key_not_found)
    }

    async fn get_by_hash(&self, key_hash: &str) -> Result<ApiKey, AppError> {
        sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys WHERE key_hash = $1 AND deleted_at IS NULL"
        ))
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(api_key_not_found)
    }

    async fn list(&self) -> Result<Vec<ApiKey>, AppError> {
        let keys = sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys WHERE deleted_at IS NULL"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(keys)
    }

    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, AppError> {
        // key_hash is deliberately absent from the SET list
        sqlx::query_as::<_, ApiKey>(&format!(
            r#"
            UPDATE api_keys
            SET name = $2,
                description = $3,
                active = $4,
                expires_at = $5,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {API_KEY_COLUMNS}
            "#
        ))
        .bind(api_key.id)
        .bind(&api_key.name)
        .bind(&api_key.description)
        .bind(api_key.active)
        .bind(api_key.expires_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(api_key_not_found)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE api_keys SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(api_key_not_found());
        }

        Ok(())
    }

    async fn exists_by_hash(&self, key_hash: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM api_keys WHERE key_hash = $1)")
                .bind(key_hash)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, first_name, last_name, age, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(new_user.age)
        .bind(new_user.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                email_taken()
            } else {
                AppError::Database(e)
            }
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(user_not_found)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = $2,
                first_name = $3,
                last_name = $4,
                age = $5,
                active = $6,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.age)
        .bind(user.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                email_taken()
            } else {
                AppError::Database(e)
            }
        })?
        .ok_or_else(user_not_found)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(user_not_found());
        }

        Ok(())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
