//! Access and refresh token records.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// An access token record in the token store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Store identifier. JWT access tokens carry it as `jti`.
    pub id: String,

    /// Client the token was issued to.
    pub client_id: String,

    /// Resource owner. `None` for client credentials tokens.
    pub user_id: Option<String>,

    /// Granted scopes.
    pub scopes: Vec<String>,

    #[serde(default)]
    pub revoked: bool,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl AccessToken {
    /// Returns `true` if the token is unrevoked and expires after `now`.
    #[must_use]
    pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
        !self.revoked && self.expires_at > now
    }

    /// Returns `true` if the token is currently usable.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active_at(OffsetDateTime::now_utc())
    }

    /// Returns `true` if `scope` was granted.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Granted scopes as a space separated string.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// A refresh token record in the token store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Store identifier, carried as `refresh_token_id` in encrypted blobs.
    pub id: String,

    /// Access token this refresh token was issued with.
    pub access_token_id: String,

    #[serde(default)]
    pub revoked: bool,

    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl RefreshToken {
    /// Returns `true` if the token is unrevoked and expires after `now`.
    #[must_use]
    pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
        !self.revoked && self.expires_at > now
    }

    /// Returns `true` if the token is currently usable.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active_at(OffsetDateTime::now_utc())
    }
}
