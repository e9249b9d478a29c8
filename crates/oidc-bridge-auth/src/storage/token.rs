//! Token storage traits.
//!
//! Revocation is idempotent: revoking an already revoked token succeeds, so
//! concurrent revocations of the same token converge on the same state.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{AccessToken, RefreshToken};

/// Access token lookup and revocation.
#[async_trait]
pub trait AccessTokenStorage: Send + Sync {
    /// Finds an access token by store identifier, regardless of its
    /// expiry or revocation status.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<AccessToken>>;

    /// Marks an access token revoked.
    ///
    /// Returns `true` if a token with this id exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke(&self, id: &str) -> AuthResult<bool>;
}

/// Refresh token lookup and revocation.
#[async_trait]
pub trait RefreshTokenStorage: Send + Sync {
    /// Finds a refresh token by store identifier, regardless of its
    /// expiry or revocation status.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<RefreshToken>>;

    /// Marks a refresh token revoked.
    ///
    /// Returns `true` if a token with this id exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke(&self, id: &str) -> AuthResult<bool>;

    /// Revokes every refresh token paired with the given access token.
    ///
    /// Returns the number of tokens touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke_by_access_token(&self, access_token_id: &str) -> AuthResult<u64>;
}
