//! User management business logic.
//!
//! Validates request bodies, enforces email uniqueness among live users and
//! keeps the user business metrics current.

use std::sync::Arc;

use crate::{
    error::AppError,
    metrics::Metrics,
    models::user::{CreateUserRequest, NewUser, UpdateUserRequest, User},
    store::{UserStore, email_taken},
};

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 50;
const AGE_MIN: i32 = 1;
const AGE_MAX: i32 = 120;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    metrics: Metrics,
}

/// Validated, trimmed user fields shared by create and update.
struct UserFields {
    email: String,
    first_name: String,
    last_name: String,
    age: i32,
}

fn validate_id(id: i64) -> Result<(), AppError> {
    if id <= 0 {
        return Err(AppError::validation("user ID must be a positive integer"));
    }
    Ok(())
}

/// Accepts `local@domain.tld` with no whitespace and non-empty domain labels.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return false;
    }

    domain.split('.').all(|label| !label.is_empty())
}

fn validate_name(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }

    let len = value.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(AppError::validation(format!(
            "{field} must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"
        )));
    }

    Ok(value.to_string())
}

fn validate_fields(
    email: &str,
    first_name: &str,
    last_name: &str,
    age: i32,
) -> Result<UserFields, AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::validation("email is required"));
    }
    if !is_valid_email(email) {
        return Err(AppError::validation("email must be a valid email address"));
    }

    let first_name = validate_name("first name", first_name)?;
    let last_name = validate_name("last name", last_name)?;

    if !(AGE_MIN..=AGE_MAX).contains(&age) {
        return Err(AppError::validation(format!(
            "age must be between {AGE_MIN} and {AGE_MAX}"
        )));
    }

    Ok(UserFields {
        email: email.to_string(),
        first_name,
        last_name,
        age,
    })
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, metrics: Metrics) -> Self {
        Self { store, metrics }
    }

    /// Create an active user.
    ///
    /// # Errors
    ///
    /// - `Validation`: malformed email, name outside 2-50 characters, age outside 1-120
    /// - `Conflict`: a live user already owns the email
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, AppError> {
        let fields = validate_fields(
            &request.email,
            &request.first_name,
            &request.last_name,
            request.age,
        )?;

        if self.store.get_by_email(&fields.email).await?.is_some() {
            return Err(email_taken());
        }

        let user = self
            .store
            .create(NewUser {
                email: fields.email,
                first_name: fields.first_name,
                last_name: fields.last_name,
                age: fields.age,
                active: true,
            })
            .await?;

        self.metrics.record_user_creation();
        self.metrics.record_user_age(user.age);
        self.refresh_active_users().await;

        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<User, AppError> {
        validate_id(id)?;
        self.store.get_by_id(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.store.list().await
    }

    /// Replace every field of a user, including `active`.
    pub async fn update_user(&self, id: i64, request: UpdateUserRequest) -> Result<User, AppError> {
        validate_id(id)?;
        let fields = validate_fields(
            &request.email,
            &request.first_name,
            &request.last_name,
            request.age,
        )?;

        let mut user = self.store.get_by_id(id).await?;

        if user.email != fields.email {
            if let Some(owner) = self.store.get_by_email(&fields.email).await? {
                if owner.id != id {
                    return Err(email_taken());
                }
            }
        }

        user.email = fields.email;
        user.first_name = fields.first_name;
        user.last_name = fields.last_name;
        user.age = fields.age;
        user.active = request.active;

        let updated = self.store.update(&user).await?;

        self.metrics.record_user_update();
        self.metrics.record_user_age(updated.age);

        Ok(updated)
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        validate_id(id)?;
        self.store.delete(id).await?;

        self.metrics.record_user_deletion();
        self.refresh_active_users().await;

        Ok(())
    }

    pub async fn user_count(&self) -> Result<i64, AppError> {
        self.store.count().await
    }

    /// Best effort: a failed count leaves the gauge at its previous value.
    async fn refresh_active_users(&self) {
        match self.store.count().await {
            Ok(count) => self.metrics.set_active_users(count),
            Err(e) => tracing::warn!(error = %e, "Failed to refresh active user count"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryUserStore;

    fn service() -> (UserService, Metrics) {
        let metrics = Metrics::new().unwrap();
        let service = UserService::new(Arc::new(InMemoryUserStore::new()), metrics.clone());
        (service, metrics)
    }

    fn create_request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            age: 30,
        }
    }

    fn update_request(email: &str, active: bool) -> UpdateUserRequest {
        UpdateUserRequest {
            email: email.to_string(),
            first_name: "Johnny".to_string(),
            last_name: "Doe".to_string(),
            age: 31,
            active,
        }
    }

    #[test]
    fn email_syntax() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));

        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example..com"));
        assert!(!is_valid_email("us er@example.com"));
        assert!(!is_valid_email("userexample.com"));
    }

    #[tokio::test]
    async fn create_user_is_active_and_counted() {
        let (service, metrics) = service();

        let user = service
            .create_user(create_request("john@example.com"))
            .await
            .unwrap();

        assert_eq!(user.id, 1);
        assert!(user.active);
        assert_eq!(service.user_count().await.unwrap(), 1);

        let rendered = metrics.render();
        assert!(rendered.contains("user_creation_total 1"));
        assert!(rendered.contains("active_users_total 1"));
    }

    #[tokio::test]
    async fn create_user_rejects_invalid_fields() {
        let (service, _) = service();

        let mut bad_age = create_request("a@example.com");
        bad_age.age = 0;
        let mut old = create_request("a@example.com");
        old.age = 121;
        let mut short_name = create_request("a@example.com");
        short_name.first_name = "J".to_string();
        let mut long_name = create_request("a@example.com");
        long_name.last_name = "x".repeat(51);

        for request in [
            create_request(""),
            create_request("not-an-email"),
            bad_age,
            old,
            short_name,
            long_name,
        ] {
            assert!(matches!(
                service.create_user(request).await.unwrap_err(),
                AppError::Validation(_)
            ));
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (service, _) = service();
        service
            .create_user(create_request("john@example.com"))
            .await
            .unwrap();

        let err = service
            .create_user(create_request("john@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let (service, metrics) = service();
        let user = service
            .create_user(create_request("john@example.com"))
            .await
            .unwrap();

        let updated = service
            .update_user(user.id, update_request("johnny@example.com", false))
            .await
            .unwrap();

        assert_eq!(updated.email, "johnny@example.com");
        assert_eq!(updated.first_name, "Johnny");
        assert_eq!(updated.age, 31);
        assert!(!updated.active);
        assert!(metrics.render().contains("user_update_total 1"));
    }

    #[tokio::test]
    async fn update_to_someone_elses_email_conflicts() {
        let (service, _) = service();
        service
            .create_user(create_request("a@example.com"))
            .await
            .unwrap();
        let b = service
            .create_user(create_request("b@example.com"))
            .await
            .unwrap();

        let err = service
            .update_user(b.id, update_request("a@example.com", true))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Keeping one's own email is fine
        assert!(
            service
                .update_user(b.id, update_request("b@example.com", true))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn delete_hides_user_and_updates_gauge() {
        let (service, metrics) = service();
        let user = service
            .create_user(create_request("john@example.com"))
            .await
            .unwrap();

        service.delete_user(user.id).await.unwrap();

        assert!(matches!(
            service.get_user(user.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(service.list_users().await.unwrap().is_empty());

        let rendered = metrics.render();
        assert!(rendered.contains("user_deletion_total 1"));
        assert!(rendered.contains("active_users_total 0"));
    }

    #[tokio::test]
    async fn unknown_or_invalid_ids() {
        let (service, _) = service();

        assert!(matches!(
            service.get_user(0).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            service.get_user(42).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            service.delete_user(42).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
