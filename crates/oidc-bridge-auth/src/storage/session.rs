//! Session storage trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Session;

/// Host application sessions, as far as logout needs them.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Finds a live session by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find(&self, session_id: &str) -> AuthResult<Option<Session>>;

    /// Destroys the given session (if any) and starts a fresh anonymous one
    /// with a new anti-forgery token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn regenerate(&self, session_id: Option<&str>) -> AuthResult<Session>;
}
