//! In-memory stores.
//!
//! Backed by `tokio::sync::RwLock<HashMap>` with an atomic id sequence. Key
//! lookups by hash go through a hash-to-id index held under the same lock.
//! Selected with `STORAGE_BACKEND=memory` and used by the test suites.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    ApiKeyStore, UserStore, api_key_not_found, check_new_api_key, email_taken, user_not_found,
};
use crate::error::AppError;
use crate::models::api_key::{ApiKey, NewApiKey};
use crate::models::user::{NewUser, User};

/// Key rows plus a hash index. Index entries are never removed, so a
/// soft-deleted key keeps its hash reserved.
#[derive(Debug, Default)]
struct ApiKeyTable {
    rows: HashMap<i64, ApiKey>,
    by_hash: HashMap<String, i64>,
}

impl ApiKeyTable {
    fn live(&self, id: i64) -> Option<&ApiKey> {
        self.rows.get(&id).filter(|k| k.deleted_at.is_none())
    }

    fn live_mut(&mut self, id: i64) -> Option<&mut ApiKey> {
        self.rows.get_mut(&id).filter(|k| k.deleted_at.is_none())
    }
}

#[derive(Debug)]
pub struct InMemoryApiKeyStore {
    table: Arc<RwLock<ApiKeyTable>>,
    next_id: AtomicI64,
}

impl InMemoryApiKeyStore {
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(ApiKeyTable::default())),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryApiKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiKeyStore for InMemoryApiKeyStore {
    async fn create(&self, new_key: NewApiKey) -> Result<ApiKey, AppError> {
        check_new_api_key(&new_key)?;

        // Check and insert under one write lock, mirroring the unique index
        let mut table = self.table.write().await;
        if table.by_hash.contains_key(&new_key.key_hash) {
            return Err(AppError::DuplicateKey);
        }

        let now = Utc::now();
        let api_key = ApiKey {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: new_key.name,
            key_hash: new_key.key_hash,
            description: new_key.description,
            active: new_key.active,
            expires_at: new_key.expires_at,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        table.by_hash.insert(api_key.key_hash.clone(), api_key.id);
        table.rows.insert(api_key.id, api_key.clone());

        Ok(api_key)
    }

    async fn get_by_id(&self, id: i64) -> Result<ApiKey, AppError> {
        let table = self.table.read().await;
        table.live(id).cloned().ok_or_else(api_key_not_found)
    }

    async fn get_by_hash(&self, key_hash: &str) -> Result<ApiKey, AppError> {
        let table = self.table.read().await;
        table
            .by_hash
            .get(key_hash)
            .and_then(|id| table.live(*id))
            .cloned()
            .ok_or_else(api_key_not_found)
    }

    async fn list(&self) -> Result<Vec<ApiKey>, AppError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|k| k.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, AppError> {
        let mut table = self.table.write().await;
        let existing = table.live_mut(api_key.id).ok_or_else(api_key_not_found)?;

        existing.name = api_key.name.clone();
        existing.description = api_key.description.clone();
        existing.active = api_key.active;
        existing.expires_at = api_key.expires_at;
        existing.updated_at = Utc::now();

        Ok(existing.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut table = self.table.write().await;
        let existing = table.live_mut(id).ok_or_else(api_key_not_found)?;

        existing.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn exists_by_hash(&self, key_hash: &str) -> Result<bool, AppError> {
        let table = self.table.read().await;
        Ok(table.by_hash.contains_key(key_hash))
    }
}

#[derive(Debug)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<i64, User>>>,
    next_id: AtomicI64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn email_in_use(users: &HashMap<i64, User>, email: &str, except_id: Option<i64>) -> bool {
    users
        .values()
        .any(|u| u.deleted_at.is_none() && u.email == email && Some(u.id) != except_id)
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if email_in_use(&users, &new_user.email, None) {
            return Err(email_taken());
        }

        let now = Utc::now();
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            age: new_user.age,
            active: new_user.active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn get_by_id(&self, id: i64) -> Result<User, AppError> {
        let users = self.users.read().await;
        users
            .get(&id)
            .filter(|u| u.deleted_at.is_none())
            .cloned()
            .ok_or_else(user_not_found)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.deleted_at.is_none() && u.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = self.users.read().await;
        let mut live: Vec<User> = users
            .values()
            .filter(|u| u.deleted_at.is_none())
            .cloned()
            .collect();
        live.sort_by_key(|u| u.id);
        Ok(live)
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if email_in_use(&users, &user.email, Some(user.id)) {
            return Err(email_taken());
        }

        let existing = users
            .get_mut(&user.id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(user_not_found)?;

        existing.email = user.email.clone();
        existing.first_name = user.first_name.clone();
        existing.last_name = user.last_name.clone();
        existing.age = user.age;
        existing.active = user.active;
        existing.updated_at = Utc::now();

        Ok(existing.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        let existing = users
            .get_mut(&id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(user_not_found)?;

        existing.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| u.deleted_at.is_none()).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_key(name: &str, hash: &str) -> NewApiKey {
        NewApiKey {
            name: name.to_string(),
            key_hash: hash.to_string(),
            description: None,
            active: true,
            expires_at: None,
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            age: 25,
            active: true,
        }
    }

    #[tokio::test]
    async fn create_assigns_ids_and_timestamps() {
        let store = InMemoryApiKeyStore::new();

        let first = store.create(new_key("first", "h1")).await.unwrap();
        let second = store.create(new_key("second", "h2")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.created_at, first.updated_at);
        assert!(first.deleted_at.is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_hash() {
        let store = InMemoryApiKeyStore::new();
        store.create(new_key("first", "same")).await.unwrap();

        let err = store.create(new_key("second", "same")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateKey));
    }

    #[tokio::test]
    async fn create_rejects_empty_name_or_hash() {
        let store = InMemoryApiKeyStore::new();

        assert!(matches!(
            store.create(new_key("", "h")).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            store.create(new_key("name", "")).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn deleted_key_disappears_from_lookups_but_keeps_hash_reserved() {
        let store = InMemoryApiKeyStore::new();
        let key = store.create(new_key("gone", "h-gone")).await.unwrap();

        store.delete(key.id).await.unwrap();

        assert!(matches!(
            store.get_by_id(key.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            store.get_by_hash("h-gone").await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.exists_by_hash("h-gone").await.unwrap());
        assert!(matches!(
            store.delete(key.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn hash_lookup_finds_the_matching_key_and_survives_delete() {
        let store = InMemoryApiKeyStore::new();
        for i in 0..50 {
            store.create(new_key(&format!("k{i}"), &format!("h{i}"))).await.unwrap();
        }

        let found = store.get_by_hash("h37").await.unwrap();
        assert_eq!(found.name, "k37");
        assert_eq!(found.id, 38);

        store.delete(found.id).await.unwrap();
        assert!(store.get_by_hash("h37").await.is_err());
        assert!(matches!(
            store.create(new_key("again", "h37")).await.unwrap_err(),
            AppError::DuplicateKey
        ));
        assert_eq!(store.get_by_hash("h38").await.unwrap().name, "k38");
        assert!(!store.exists_by_hash("h-unknown").await.unwrap());

        let table = store.table.read().await;
        assert_eq!(table.by_hash.len(), 50);
        assert_eq!(table.by_hash.get("h37"), Some(&38));
    }

    #[tokio::test]
    async fn update_never_rewrites_hash() {
        let store = InMemoryApiKeyStore::new();
        let mut key = store.create(new_key("before", "h-keep")).await.unwrap();

        key.name = "after".to_string();
        key.active = false;
        key.key_hash = "tampered".to_string();
        let updated = store.update(&key).await.unwrap();

        assert_eq!(updated.name, "after");
        assert!(!updated.active);
        assert_eq!(updated.key_hash, "h-keep");
        assert!(store.get_by_hash("h-keep").await.is_ok());
    }

    #[tokio::test]
    async fn update_unknown_key_is_not_found() {
        let store = InMemoryApiKeyStore::new();
        let mut key = store.create(new_key("k", "h")).await.unwrap();
        key.id = 99;

        assert!(matches!(
            store.update(&key).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn user_email_is_unique_among_live_users() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("a@example.com")).await.unwrap();

        assert!(matches!(
            store.create(new_user("a@example.com")).await.unwrap_err(),
            AppError::Conflict(_)
        ));

        store.delete(user.id).await.unwrap();
        assert!(store.create(new_user("a@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn user_count_and_list_skip_deleted() {
        let store = InMemoryUserStore::new();
        let a = store.create(new_user("a@example.com")).await.unwrap();
        store.create(new_user("b@example.com")).await.unwrap();

        store.delete(a.id).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let users = store.list().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "b@example.com");
        assert!(store.get_by_email("a@example.com").await.unwrap().is_none());
    }
}
