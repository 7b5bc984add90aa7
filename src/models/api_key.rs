//! API Key model for authentication.
//!
//! API keys authenticate callers of the protected endpoints. Only the
//! SHA-256 hash of a key is stored; the plaintext is handed out once, when
//! the key is created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder returned instead of the key on every read after creation.
pub const MASKED_KEY: &str = "***";

/// Represents an API key record from the database.
///
/// # Database Table
///
/// Maps to the `api_keys` table with columns:
/// - `id`: Unique identifier (BIGSERIAL)
/// - `name`: Human label, 2-100 characters
/// - `key_hash`: SHA-256 hash of the actual API key
/// - `description`: Optional free text
/// - `active`: Whether the key may authenticate requests
/// - `expires_at`: Optional expiry; absent means the key never expires
/// - `created_at` / `updated_at`: Maintained by the store
/// - `deleted_at`: Soft-delete marker
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ApiKey {
    pub id: i64,

    pub name: String,

    /// SHA-256 hash of the actual API key (64 hex characters)
    ///
    /// When a request comes in with "X-API-Key: sk-...", we:
    /// 1. Hash the presented key with SHA-256
    /// 2. Look up this hash in the database
    /// 3. If found, active and unexpired, authenticate the request
    pub key_hash: String,

    pub description: Option<String>,

    /// Inactive keys are rejected during authentication. This revokes
    /// access without deleting the record.
    pub active: bool,

    pub expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub deleted_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// Whether the expiry instant has been reached at `now`.
    ///
    /// A key expiring exactly at `now` counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// A key grants access iff it is active and not expired.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.is_expired_at(now)
    }
}

/// Values needed to insert a key. Identity and timestamps come from the store.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub name: String,
    pub key_hash: String,
    pub description: Option<String>,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request body for creating a new API key.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "ops",
///   "description": "Key for the ops dashboard",
///   "expires_at": "2026-12-31T23:59:59Z"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request body for updating an API key.
///
/// This is a full replacement of the mutable fields: omitting `expires_at`
/// clears the expiry. The key itself can never be changed.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateApiKeyRequest {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    pub active: bool,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A freshly created key together with its plaintext.
///
/// This is the only value in the system that ever holds the plaintext.
#[derive(Debug, Clone)]
pub struct CreatedApiKey {
    pub record: ApiKey,
    pub key: String,
}

/// Response body for API key endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": 1,
///   "name": "ops",
///   "key": "***",
///   "description": "Key for the ops dashboard",
///   "active": true,
///   "expires_at": "2026-12-31T23:59:59Z",
///   "created_at": "2025-12-20T10:00:00Z",
///   "updated_at": "2025-12-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyResponse {
    pub id: i64,
    pub name: String,

    /// The plaintext on creation, `***` everywhere else
    pub key: String,

    pub description: Option<String>,
    pub active: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Convert a stored key into a response with the key masked.
impl From<ApiKey> for ApiKeyResponse {
    fn from(api_key: ApiKey) -> Self {
        Self {
            id: api_key.id,
            name: api_key.name,
            key: MASKED_KEY.to_string(),
            description: api_key.description,
            active: api_key.active,
            expires_at: api_key.expires_at,
            created_at: api_key.created_at,
            updated_at: api_key.updated_at,
        }
    }
}

/// The creation response is the only one that carries the plaintext.
impl From<CreatedApiKey> for ApiKeyResponse {
    fn from(created: CreatedApiKey) -> Self {
        let mut response = ApiKeyResponse::from(created.record);
        response.key = created.key;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(active: bool, expires_at: Option<DateTime<Utc>>) -> ApiKey {
        let now = Utc::now();
        ApiKey {
            id: 1,
            name: "test key".to_string(),
            key_hash: "ab".repeat(32),
            description: Some("test description".to_string()),
            active,
            expires_at,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn read_response_masks_key() {
        let response = ApiKeyResponse::from(sample(true, None));

        assert_eq!(response.key, MASKED_KEY);
        assert_eq!(response.name, "test key");
    }

    #[test]
    fn creation_response_carries_plaintext() {
        let created = CreatedApiKey {
            record: sample(true, None),
            key: "sk-plain".to_string(),
        };

        let response = ApiKeyResponse::from(created);
        assert_eq!(response.key, "sk-plain");
        assert_eq!(response.id, 1);
    }

    #[test]
    fn response_omits_missing_expiry() {
        let json = serde_json::to_value(ApiKeyResponse::from(sample(true, None))).unwrap();

        assert!(json.get("expires_at").is_none());
        assert_eq!(json["key"], "***");
        assert!(json.get("key_hash").is_none());
    }

    #[test]
    fn validity_follows_active_flag_and_expiry() {
        let now = Utc::now();

        assert!(sample(true, None).is_valid_at(now));
        assert!(sample(true, Some(now + Duration::hours(1))).is_valid_at(now));
        assert!(!sample(true, Some(now - Duration::hours(1))).is_valid_at(now));
        assert!(!sample(false, None).is_valid_at(now));
        assert!(!sample(false, Some(now + Duration::hours(1))).is_valid_at(now));
    }

    #[test]
    fn expiry_instant_itself_is_expired() {
        let now = Utc::now();
        let key = sample(true, Some(now));

        assert!(key.is_expired_at(now));
        assert!(!key.is_valid_at(now));
    }
}
