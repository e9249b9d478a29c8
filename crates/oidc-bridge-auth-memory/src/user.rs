//! In-memory user directory.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use oidc_bridge_auth::storage::UserStorage;
use oidc_bridge_auth::{AttributeUser, AuthResult, OidcUser};

/// Users keyed by subject. Any [`OidcUser`] can be stored.
#[derive(Default)]
pub struct InMemoryUserStorage {
    users: DashMap<String, Arc<dyn OidcUser>>,
}

impl InMemoryUserStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<U: OidcUser + 'static>(&self, user: U) {
        self.users.insert(user.subject(), Arc::new(user));
    }

    /// Stores an attribute bag user.
    pub fn insert_attributes(&self, user: AttributeUser) {
        self.insert(user);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<Arc<dyn OidcUser>>> {
        Ok(self.users.get(user_id).map(|u| Arc::clone(u.value())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_find_by_subject() {
        let storage = InMemoryUserStorage::new();
        storage.insert_attributes(AttributeUser::new("42").with("email", "jane@example.com"));

        let user = storage.find_by_id("42").await.unwrap().unwrap();
        assert_eq!(user.subject(), "42");
        assert_eq!(user.attribute("email"), Some(json!("jane@example.com")));
        assert!(storage.find_by_id("7").await.unwrap().is_none());
    }
}
