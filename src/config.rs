//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use std::time::Duration;

use serde::Deserialize;

/// Where users and API keys are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL through the sqlx connection pool.
    Postgres,
    /// Process-local maps, lost on restart. Useful for local runs without a database.
    Memory,
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `SERVER_PORT`: HTTP server port, defaults to 8080
/// - `DATABASE_URL`: PostgreSQL connection string; built from the `DB_*` variables when unset
/// - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`, `DB_SSL_MODE`
/// - `DB_MAX_CONNECTIONS`: pool size, defaults to 10
/// - `STORAGE_BACKEND`: `postgres` (default) or `memory`
/// - `LOG_LEVEL`: fallback filter when `RUST_LOG` is unset, defaults to `info`
/// - `LOG_FORMAT`: `pretty` (default) or `json`
/// - `REQUEST_TIMEOUT_SECS`: per-request deadline, defaults to 30
/// - `CORS_ALLOWED_ORIGINS`: comma-separated origins; empty mirrors the caller's origin
/// - `BOOTSTRAP_API_KEY`: plaintext key seeded at startup so the management API is reachable
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub server_port: u16,

    pub database_url: Option<String>,

    #[serde(default = "default_db_host")]
    pub db_host: String,

    #[serde(default = "default_db_port")]
    pub db_port: u16,

    #[serde(default = "default_db_user")]
    pub db_user: String,

    #[serde(default = "default_db_password")]
    pub db_password: String,

    #[serde(default = "default_db_name")]
    pub db_name: String,

    #[serde(default = "default_db_ssl_mode")]
    pub db_ssl_mode: String,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    pub bootstrap_api_key: Option<String>,
}

fn default_port() -> u16 {
    8080
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_password() -> String {
    "password".to_string()
}

fn default_db_name() -> String {
    "user_api".to_string()
}

fn default_db_ssl_mode() -> String {
    "disable".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Postgres
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_request_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variable values cannot be parsed into expected types.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        // Field names are automatically converted: db_host -> DB_HOST
        envy::from_env::<Config>()
    }

    /// Connection string for the sqlx pool.
    ///
    /// `DATABASE_URL` wins when set; otherwise the URL is assembled from the `DB_*` parts.
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => format!(
                "postgres://{}:{}@{}:{}/{}?sslmode={}",
                self.db_user,
                self.db_password,
                self.db_host,
                self.db_port,
                self.db_name,
                self.db_ssl_mode
            ),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Log the effective configuration without credentials.
    pub fn log_summary(&self) {
        tracing::info!(
            server_port = self.server_port,
            storage_backend = ?self.storage_backend,
            db_host = %self.db_host,
            db_port = self.db_port,
            db_name = %self.db_name,
            log_level = %self.log_level,
            request_timeout_secs = self.request_timeout_secs,
            cors_allowed_origins = ?self.cors_allowed_origins,
            bootstrap_api_key = self.bootstrap_api_key.is_some(),
            "Configuration loaded"
        );
    }
}
