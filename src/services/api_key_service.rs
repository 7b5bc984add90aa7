//! API key lifecycle: creation, management and the validation decision.
//!
//! The service is the only place that sees a key's plaintext. It generates
//! the secret, stores the hash through an `ApiKeyStore` and hands the
//! plaintext back once. `validate` is the single decision point used by the
//! authentication middleware.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::AppError,
    metrics::{Metrics, ValidationOutcome},
    models::api_key::{ApiKey, CreateApiKeyRequest, CreatedApiKey, NewApiKey, UpdateApiKeyRequest},
    services::key_material,
    store::ApiKeyStore,
};

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;

/// Name given to the record seeded from `BOOTSTRAP_API_KEY`.
pub const BOOTSTRAP_KEY_NAME: &str = "bootstrap";

#[derive(Clone)]
pub struct ApiKeyService {
    store: Arc<dyn ApiKeyStore>,
    metrics: Metrics,
}

fn validate_id(id: i64) -> Result<(), AppError> {
    if id <= 0 {
        return Err(AppError::validation("API key ID must be a positive integer"));
    }
    Ok(())
}

/// Trim `name` and check its length in characters.
fn normalize_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }

    let len = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(AppError::validation(format!(
            "name must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"
        )));
    }

    Ok(name.to_string())
}

impl ApiKeyService {
    pub fn new(store: Arc<dyn ApiKeyStore>, metrics: Metrics) -> Self {
        Self { store, metrics }
    }

    /// Create a key and return its plaintext together with the stored record.
    ///
    /// New keys are active. The plaintext is not kept anywhere after this
    /// call returns.
    ///
    /// # Errors
    ///
    /// - `Validation`: name empty or outside 2-100 characters
    /// - `DuplicateKey`: hash collision with an existing record
    /// - `Internal`: the random source failed
    pub async fn create_key(&self, request: CreateApiKeyRequest) -> Result<CreatedApiKey, AppError> {
        let name = normalize_name(&request.name)?;

        let key = key_material::generate()?;
        let record = self
            .store
            .create(NewApiKey {
                name,
                key_hash: key_material::hash(&key),
                description: request.description,
                active: true,
                expires_at: request.expires_at,
            })
            .await?;

        self.metrics.record_api_key_created();
        tracing::info!(api_key_id = record.id, name = %record.name, "API key created");

        Ok(CreatedApiKey { record, key })
    }

    pub async fn get_key(&self, id: i64) -> Result<ApiKey, AppError> {
        validate_id(id)?;
        self.store.get_by_id(id).await
    }

    /// All live keys ordered by id.
    pub async fn list_keys(&self) -> Result<Vec<ApiKey>, AppError> {
        let mut keys = self.store.list().await?;
        keys.sort_by_key(|k| k.id);
        Ok(keys)
    }

    /// Replace the mutable fields of a key.
    ///
    /// Omitting `expires_at` clears the expiry. The secret never changes.
    pub async fn update_key(
        &self,
        id: i64,
        request: UpdateApiKeyRequest,
    ) -> Result<ApiKey, AppError> {
        validate_id(id)?;
        let name = normalize_name(&request.name)?;

        let mut api_key = self.store.get_by_id(id).await?;
        api_key.name = name;
        api_key.description = request.description;
        api_key.active = request.active;
        api_key.expires_at = request.expires_at;

        let updated = self.store.update(&api_key).await?;
        tracing::info!(
            api_key_id = updated.id,
            active = updated.active,
            "API key updated"
        );

        Ok(updated)
    }

    pub async fn delete_key(&self, id: i64) -> Result<(), AppError> {
        validate_id(id)?;
        self.store.delete(id).await?;

        tracing::info!(api_key_id = id, "API key deleted");
        Ok(())
    }

    /// Decide whether a presented key grants access.
    ///
    /// Unknown, deleted, inactive and expired keys all fail with the same
    /// `InvalidCredential` error. Expiry is checked against the current time
    /// on every call.
    ///
    /// # Errors
    ///
    /// - `CredentialRequired`: `presented` is empty after trimming; the store is not consulted
    /// - `InvalidCredential`: no valid record matches
    /// - `Database`: the lookup itself failed
    pub async fn validate(&self, presented: &str) -> Result<ApiKey, AppError> {
        let presented = presented.trim();
        if presented.is_empty() {
            self.metrics.record_validation(ValidationOutcome::Missing);
            return Err(AppError::CredentialRequired);
        }

        let key_hash = key_material::hash(presented);
        let api_key = match self.store.get_by_hash(&key_hash).await {
            Ok(api_key) => api_key,
            Err(AppError::NotFound(_)) => {
                self.metrics.record_validation(ValidationOutcome::Invalid);
                return Err(AppError::InvalidCredential);
            }
            Err(e) => return Err(e),
        };

        if !api_key.is_valid_at(Utc::now()) {
            tracing::debug!(
                api_key_id = api_key.id,
                active = api_key.active,
                "Rejected inactive or expired API key"
            );
            self.metrics.record_validation(ValidationOutcome::Invalid);
            return Err(AppError::InvalidCredential);
        }

        self.metrics.record_validation(ValidationOutcome::Valid);
        Ok(api_key)
    }

    /// Make sure an operator-supplied key can authenticate.
    ///
    /// Stores a record named `bootstrap` for `plaintext` unless a record with
    /// the same hash already exists (deleted records included, so a retired
    /// bootstrap key stays retired).
    pub async fn ensure_bootstrap_key(&self, plaintext: &str) -> Result<(), AppError> {
        let plaintext = plaintext.trim();
        if plaintext.is_empty() {
            tracing::warn!("BOOTSTRAP_API_KEY is set but empty, skipping");
            return Ok(());
        }

        let key_hash = key_material::hash(plaintext);
        if self.store.exists_by_hash(&key_hash).await? {
            tracing::info!("Bootstrap API key already present");
            return Ok(());
        }

        let result = self
            .store
            .create(NewApiKey {
                name: BOOTSTRAP_KEY_NAME.to_string(),
                key_hash,
                description: Some("Seeded from BOOTSTRAP_API_KEY".to_string()),
                active: true,
                expires_at: None,
            })
            .await;

        match result {
            Ok(record) => {
                self.metrics.record_api_key_created();
                tracing::info!(api_key_id = record.id, "Bootstrap API key stored");
                Ok(())
            }
            // Another instance seeded it first
            Err(AppError::DuplicateKey) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
