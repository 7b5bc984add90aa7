//! Shared application state handed to every handler and middleware.

use std::sync::Arc;

use crate::{
    db::DbPool,
    metrics::Metrics,
    services::{ApiKeyService, UserService},
    store::{ApiKeyStore, UserStore},
};

/// Cloned into each request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub api_keys: ApiKeyService,
    pub users: UserService,
    pub metrics: Metrics,

    /// Present when running on PostgreSQL; used by the health check.
    pub db: Option<DbPool>,
}

impl AppState {
    pub fn new(
        api_key_store: Arc<dyn ApiKeyStore>,
        user_store: Arc<dyn UserStore>,
        metrics: Metrics,
        db: Option<DbPool>,
    ) -> Self {
        Self {
            api_keys: ApiKeyService::new(api_key_store, metrics.clone()),
            users: UserService::new(user_store, metrics.clone()),
            metrics,
            db,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State over empty in-memory stores with an isolated metrics collector.
    pub fn in_memory() -> Self {
        use crate::store::{InMemoryApiKeyStore, InMemoryUserStore};

        Self::new(
            Arc::new(InMemoryApiKeyStore::new()),
            Arc::new(InMemoryUserStore::new()),
            Metrics::new().expect("metrics recorder"),
            None,
        )
    }
}
