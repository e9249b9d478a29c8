//! In-memory access and refresh token store.
//!
//! Issuing helpers exist so development servers and tests can mint records
//! the way the OAuth2 server would.

use async_trait::async_trait;
use dashmap::DashMap;
use oidc_bridge_auth::storage::{AccessTokenStorage, RefreshTokenStorage};
use oidc_bridge_auth::{AccessToken, AuthResult, RefreshToken};
use time::{Duration, OffsetDateTime};

/// Length of generated refresh token ids.
const REFRESH_TOKEN_ID_LENGTH: usize = 80;

#[derive(Debug, Default)]
pub struct InMemoryTokenStorage {
    access_tokens: DashMap<String, AccessToken>,
    refresh_tokens: DashMap<String, RefreshToken>,
}

impl InMemoryTokenStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an access token record as is.
    pub fn insert_access_token(&self, token: AccessToken) {
        self.access_tokens.insert(token.id.clone(), token);
    }

    /// Stores a refresh token record as is.
    pub fn insert_refresh_token(&self, token: RefreshToken) {
        self.refresh_tokens.insert(token.id.clone(), token);
    }

    /// Issues a new access token with a random id.
    pub fn issue_access_token(
        &self,
        client_id: &str,
        user_id: Option<&str>,
        scopes: &[&str],
        ttl: Duration,
    ) -> AccessToken {
        let now = OffsetDateTime::now_utc();
        let token = AccessToken {
            id: uuid::Uuid::new_v4().simple().to_string(),
            client_id: client_id.to_string(),
            user_id: user_id.map(str::to_string),
            scopes: scopes.iter().map(|s| (*s).to_string()).collect(),
            revoked: false,
            created_at: now,
            expires_at: now + ttl,
        };
        self.insert_access_token(token.clone());
        token
    }

    /// Issues a refresh token paired with `access_token_id`, using an
    /// 80 character opaque id.
    pub fn issue_refresh_token(&self, access_token_id: &str, ttl: Duration) -> RefreshToken {
        let mut id = String::with_capacity(REFRESH_TOKEN_ID_LENGTH);
        while id.len() < REFRESH_TOKEN_ID_LENGTH {
            id.push_str(&uuid::Uuid::new_v4().simple().to_string());
        }
        id.truncate(REFRESH_TOKEN_ID_LENGTH);

        let token = RefreshToken {
            id,
            access_token_id: access_token_id.to_string(),
            revoked: false,
            expires_at: OffsetDateTime::now_utc() + ttl,
        };
        self.insert_refresh_token(token.clone());
        token
    }

    /// Drops expired records. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let before = self.access_tokens.len() + self.refresh_tokens.len();
        self.access_tokens.retain(|_, t| t.expires_at > now);
        self.refresh_tokens.retain(|_, t| t.expires_at > now);
        let removed = before.saturating_sub(self.access_tokens.len() + self.refresh_tokens.len());
        if removed > 0 {
            tracing::debug!(removed, "Purged expired tokens");
        }
        removed
    }
}

#[async_trait]
impl AccessTokenStorage for InMemoryTokenStorage {
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<AccessToken>> {
        Ok(self.access_tokens.get(id).map(|t| t.clone()))
    }

    async fn revoke(&self, id: &str) -> AuthResult<bool> {
        Ok(self
            .access_tokens
            .get_mut(id)
            .map(|mut t| t.revoked = true)
            .is_some())
    }
}

#[async_trait]
impl RefreshTokenStorage for InMemoryTokenStorage {
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self.refresh_tokens.get(id).map(|t| t.clone()))
    }

    async fn revoke(&self, id: &str) -> AuthResult<bool> {
        Ok(self
            .refresh_tokens
            .get_mut(id)
            .map(|mut t| t.revoked = true)
            .is_some())
    }

    async fn revoke_by_access_token(&self, access_token_id: &str) -> AuthResult<u64> {
        let mut count = 0;
        for mut token in self.refresh_tokens.iter_mut() {
            if token.access_token_id == access_token_id && !token.revoked {
                token.revoked = true;
                count += 1;
            }
        }
        Ok(count)
    }
}
