//! Token endpoint response and its OpenID Connect augmentation.
//!
//! The OAuth2 server owns the token endpoint. After it issues an access
//! token it hands the record to [`IdTokenAugmenter`], which adds `id_token`
//! when `openid` was granted.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::id_token::IdTokenMinter;
use crate::error::{AuthError, AuthResult};
use crate::storage::{ClientStorage, UserStorage};
use crate::types::AccessToken;

/// Scope that turns an OAuth2 grant into an OpenID Connect one.
pub const OPENID_SCOPE: &str = "openid";

/// Token endpoint response (RFC 6749 section 5.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    /// Always `Bearer`.
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Granted scopes, space separated.
    pub scope: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Present only for `openid` grants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl TokenResponse {
    /// Builds a bearer response for an issued access token record.
    #[must_use]
    pub fn bearer(access_token: impl Into<String>, record: &AccessToken) -> Self {
        let remaining = (record.expires_at - OffsetDateTime::now_utc()).whole_seconds();
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            expires_in: u64::try_from(remaining).unwrap_or(0),
            scope: record.scope_string(),
            refresh_token: None,
            id_token: None,
        }
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

/// Adds `id_token` to token responses for `openid` grants.
#[derive(Clone)]
pub struct IdTokenAugmenter {
    minter: IdTokenMinter,
    users: Arc<dyn UserStorage>,
    clients: Arc<dyn ClientStorage>,
}

impl IdTokenAugmenter {
    #[must_use]
    pub fn new(
        minter: IdTokenMinter,
        users: Arc<dyn UserStorage>,
        clients: Arc<dyn ClientStorage>,
    ) -> Self {
        Self {
            minter,
            users,
            clients,
        }
    }

    /// The ID token for `access_token`, or `None` when no augmentation applies.
    ///
    /// Tokens without `openid` or without a resource owner (client
    /// credentials) get nothing.
    ///
    /// # Errors
    /// Fails if the user or client record is gone, or minting fails.
    pub async fn id_token(
        &self,
        access_token: &AccessToken,
        nonce: Option<&str>,
    ) -> AuthResult<Option<String>> {
        if !access_token.has_scope(OPENID_SCOPE) {
            return Ok(None);
        }
        let Some(user_id) = access_token.user_id.as_deref() else {
            return Ok(None);
        };

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::internal(format!("user '{user_id}' of an issued token not found")))?;
        let client = self
            .clients
            .find_by_client_id(&access_token.client_id)
            .await?
            .ok_or_else(|| AuthError::invalid_client("client of an issued token not found"))?;

        self.minter
            .mint(access_token, user.as_ref(), &client, nonce)
            .map(Some)
    }

    /// Sets `response.id_token` when augmentation applies.
    ///
    /// # Errors
    /// See [`IdTokenAugmenter::id_token`].
    pub async fn augment(
        &self,
        response: &mut TokenResponse,
        access_token: &AccessToken,
        nonce: Option<&str>,
    ) -> AuthResult<()> {
        response.id_token = self.id_token(access_token, nonce).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use time::Duration;

    use crate::claims::{AttributeUser, ClaimsResolver, ClaimsService, OidcUser};
    use crate::config::OidcConfig;
    use crate::token::jwt::SigningKeyPair;
    use crate::token::keys::KeyMaterial;
    use crate::types::Client;

    struct Directory;

    #[async_trait]
    impl UserStorage for Directory {
        async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<Arc<dyn OidcUser>>> {
            Ok((user_id == "42").then(|| Arc::new(AttributeUser::new("42")) as Arc<dyn OidcUser>))
        }
    }

    #[async_trait]
    impl ClientStorage for Directory {
        async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
            Ok((client_id == "web").then(|| Client::public("web", "Web")))
        }
    }

    fn augmenter() -> IdTokenAugmenter {
        let (pair, _, _) = SigningKeyPair::generate_rsa().unwrap();
        let minter = IdTokenMinter::new(
            KeyMaterial::from_key_pair(pair),
            ClaimsService::new(Arc::new(ClaimsResolver::from_config(&OidcConfig::default()))),
            "https://id.example.com",
        );
        IdTokenAugmenter::new(minter, Arc::new(Directory), Arc::new(Directory))
    }

    fn record(scopes: &[&str], user_id: Option<&str>) -> AccessToken {
        let now = OffsetDateTime::now_utc();
        AccessToken {
            id: "at-1".to_string(),
            client_id: "web".to_string(),
            user_id: user_id.map(str::to_string),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            revoked: false,
            created_at: now,
            expires_at: now + Duration::minutes(15),
        }
    }

    #[tokio::test]
    async fn test_openid_grant_gets_id_token() {
        let record = record(&["openid", "email"], Some("42"));
        let mut response = TokenResponse::bearer("opaque", &record);

        augmenter().augment(&mut response, &record, Some("abc")).await.unwrap();

        assert!(response.id_token.is_some());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["scope"], "openid email");
    }

    #[tokio::test]
    async fn test_plain_oauth_grant_is_untouched() {
        let record = record(&["email"], Some("42"));
        let mut response = TokenResponse::bearer("opaque", &record);

        augmenter().augment(&mut response, &record, None).await.unwrap();

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("id_token").is_none());
    }

    #[tokio::test]
    async fn test_client_credentials_token_gets_no_id_token() {
        let record = record(&["openid"], None);
        assert!(augmenter().id_token(&record, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_user_fails() {
        let record = record(&["openid"], Some("7"));
        assert!(augmenter().id_token(&record, None).await.is_err());
    }

    #[test]
    fn test_bearer_expires_in() {
        let record = record(&["openid"], Some("42"));
        let response = TokenResponse::bearer("opaque", &record).with_refresh_token("rt");
        assert!(response.expires_in > 890 && response.expires_in <= 900);
        assert_eq!(response.refresh_token.as_deref(), Some("rt"));
    }
}
