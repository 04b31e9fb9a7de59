//! Profile service: user lookup, self-service profile edits, location lookup

use std::sync::Arc;

use crate::error::{BlogError, Result};
use crate::store::BlogStore;
use crate::types::{Location, User, UserId};
use crate::validation::{validate_email, validate_username};

/// Profile service
pub struct ProfileService {
    store: Arc<dyn BlogStore>,
}

/// Editable profile fields
#[derive(Debug, Clone)]
pub struct ProfileForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

impl ProfileService {
    /// Create a new profile service
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// Look up a user by username
    pub async fn profile(&self, username: &str) -> Result<User> {
        self.store
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| BlogError::not_found("User", username))
    }

    /// Edit the acting user's own profile
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `actor_id` is unknown, `InvalidInput` for an
    /// invalid or already taken username or a malformed email.
    pub async fn update(&self, actor_id: UserId, form: ProfileForm) -> Result<User> {
        let existing = self
            .store
            .get_user(actor_id)
            .await?
            .ok_or_else(|| BlogError::not_found("User", actor_id))?;

        validate_username(&form.username)?;
        validate_email(&form.email)?;

        if form.username != existing.username {
            if let Some(taken) = self.store.get_user_by_username(&form.username).await? {
                if taken.id != actor_id {
                    return Err(BlogError::InvalidInput(format!(
                        "Username '{}' is already taken",
                        form.username
                    )));
                }
            }
        }

        let updated = User {
            username: form.username,
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email,
            ..existing
        };
        self.store.update_user(&updated).await?;

        tracing::info!(user_id = actor_id, username = %updated.username, "Updated profile");
        Ok(updated)
    }

    /// A published location
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the location is missing or unpublished.
    pub async fn location(&self, id: i64) -> Result<Location> {
        self.store
            .get_location(id)
            .await?
            .filter(|l| l.is_published)
            .ok_or_else(|| BlogError::not_found("Location", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::{NewLocation, NewUser};

    async fn setup() -> (ProfileService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (ProfileService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_profile_lookup() {
        let (service, store) = setup().await;
        let alice = store.create_user(&NewUser::new("alice")).await.unwrap();

        assert_eq!(service.profile("alice").await.unwrap(), alice);
        assert!(service.profile("nobody").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (service, store) = setup().await;
        let alice = store.create_user(&NewUser::new("alice")).await.unwrap();

        let mut form = ProfileForm::from_user(&alice);
        form.username = "alice_w".to_string();
        form.first_name = "Alice".to_string();
        form.email = "alice@example.org".to_string();

        let updated = service.update(alice.id, form).await.unwrap();
        assert_eq!(updated.username, "alice_w");
        assert_eq!(updated.date_joined, alice.date_joined);
        assert_eq!(service.profile("alice_w").await.unwrap().first_name, "Alice");
    }

    #[tokio::test]
    async fn test_taken_username_rejected() {
        let (service, store) = setup().await;
        let alice = store.create_user(&NewUser::new("alice")).await.unwrap();
        store.create_user(&NewUser::new("bob")).await.unwrap();

        let mut form = ProfileForm::from_user(&alice);
        form.username = "bob".to_string();
        let result = service.update(alice.id, form).await;
        assert!(matches!(result, Err(BlogError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_bad_email_rejected() {
        let (service, store) = setup().await;
        let alice = store.create_user(&NewUser::new("alice")).await.unwrap();

        let mut form = ProfileForm::from_user(&alice);
        form.email = "not-an-email".to_string();
        assert!(matches!(
            service.update(alice.id, form).await,
            Err(BlogError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_unpublished_location_is_not_found() {
        let (service, store) = setup().await;
        let open = store.create_location(&NewLocation::new("Moscow")).await.unwrap();
        let mut closed = NewLocation::new("Area 51");
        closed.is_published = false;
        let closed = store.create_location(&closed).await.unwrap();

        assert_eq!(service.location(open.id).await.unwrap().name, "Moscow");
        assert!(service.location(closed.id).await.unwrap_err().is_not_found());
        assert!(service.location(9999).await.unwrap_err().is_not_found());
    }
}
