//! User lookup trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::AuthResult;
use crate::claims::OidcUser;

/// Lookup of users from the host application's identity store.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Finds a user by the identifier stored on access tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<Arc<dyn OidcUser>>>;
}
