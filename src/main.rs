//! User API Server - Main Application Entry Point
//!
//! This is a REST API server for managing users and the API keys that
//! protect write access to them. It exposes Prometheus metrics and a health
//! check alongside the CRUD endpoints.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries), or in-memory stores
//! - **Authentication**: `X-API-Key` header, SHA-256 hashed at rest
//! - **Observability**: tracing logs and a Prometheus recorder
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Initialize logging
//! 3. Connect to PostgreSQL and run migrations (unless `STORAGE_BACKEND=memory`)
//! 4. Seed the bootstrap API key if one is configured
//! 5. Build HTTP router with routes and middleware
//! 6. Serve until SIGINT/SIGTERM

mod config;
mod db;
mod error;
mod handlers;
mod metrics;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{Config, LogFormat, StorageBackend},
    metrics::Metrics,
    state::AppState,
    store::{InMemoryApiKeyStore, InMemoryUserStore, PgApiKeyStore, PgUserStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    init_tracing(&config);
    config.log_summary();

    let metrics = Metrics::new()?;

    let state = build_state(&config, metrics).await?;

    if let Some(bootstrap_key) = &config.bootstrap_api_key {
        state.api_keys.ensure_bootstrap_key(bootstrap_key).await?;
    }

    match state.users.user_count().await {
        Ok(count) => state.metrics.set_active_users(count),
        Err(e) => tracing::warn!(error = %e, "Could not read initial user count"),
    }

    let app = routes::router(state, &config);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Select the storage backend and assemble the shared state.
async fn build_state(config: &Config, metrics: Metrics) -> anyhow::Result<AppState> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            // Create database pool
            let pool = db::create_pool(&config.database_url(), config.db_max_connections).await?;
            tracing::info!("Database pool created");

            // Run migrations
            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            Ok(AppState::new(
                Arc::new(PgApiKeyStore::new(pool.clone())),
                Arc::new(PgUserStore::new(pool.clone())),
                metrics,
                Some(pool),
            ))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(AppState::new(
                Arc::new(InMemoryApiKeyStore::new()),
                Arc::new(InMemoryUserStore::new()),
                metrics,
                None,
            ))
        }
    }
}

/// Initialize logging with tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `LOG_LEVEL` is used as the filter.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
