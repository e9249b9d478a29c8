//! Token introspection and revocation against the token store.
//!
//! Client authentication happens before these calls; the gateway receives
//! the authenticated [`Client`]. Lookups never surface as faults: a storage
//! error, a token that fails to parse and a token that does not exist all
//! look the same to the caller.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::identity::TokenIdentityExtractor;
use super::introspection::{IntrospectionRequest, IntrospectionResponse};
use super::revocation::{RevocationOutcome, RevocationRequest, TokenTypeHint};
use crate::error::AuthResult;
use crate::storage::{AccessTokenStorage, RefreshTokenStorage, UserStorage};
use crate::types::{AccessToken, Client, RefreshToken};

/// Introspects and revokes tokens on behalf of authenticated clients.
#[derive(Clone)]
pub struct TokenLifecycleGateway {
    access_tokens: Arc<dyn AccessTokenStorage>,
    refresh_tokens: Arc<dyn RefreshTokenStorage>,
    users: Arc<dyn UserStorage>,
    extractor: TokenIdentityExtractor,
    issuer: String,
}

impl TokenLifecycleGateway {
    #[must_use]
    pub fn new(
        access_tokens: Arc<dyn AccessTokenStorage>,
        refresh_tokens: Arc<dyn RefreshTokenStorage>,
        users: Arc<dyn UserStorage>,
        extractor: TokenIdentityExtractor,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            access_tokens,
            refresh_tokens,
            users,
            extractor,
            issuer: issuer.into(),
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// RFC 7662 introspection.
    ///
    /// # Errors
    /// Returns [`crate::AuthError::UnsupportedTokenType`] for an unknown hint.
    /// Every other outcome is a response, inactive when in doubt.
    #[instrument(skip_all, fields(client_id = %client.client_id))]
    pub async fn introspect(
        &self,
        client: &Client,
        request: &IntrospectionRequest,
    ) -> AuthResult<IntrospectionResponse> {
        let hint = TokenTypeHint::parse(request.token_type_hint.as_deref())?;

        let token = request.token.as_deref().unwrap_or_default();
        if token.is_empty() {
            return Ok(IntrospectionResponse::inactive());
        }

        if TokenTypeHint::allows_access(hint)
            && let Some(response) = self.introspect_access_token(token).await
        {
            return Ok(response);
        }

        if TokenTypeHint::allows_refresh(hint)
            && let Some(response) = self.introspect_refresh_token(token).await
        {
            return Ok(response);
        }

        Ok(IntrospectionResponse::inactive())
    }

    async fn introspect_access_token(&self, token: &str) -> Option<IntrospectionResponse> {
        let id = self.extractor.access_token_id(token)?;
        let access_token = self.find_access_token(&id).await?;
        if !access_token.is_active() {
            return None;
        }

        let username = match &access_token.user_id {
            Some(user_id) => match self.users.find_by_id(user_id).await {
                Ok(user) => user.and_then(|u| u.username()),
                Err(e) => {
                    warn!(error = %e, "User lookup failed during introspection");
                    None
                }
            },
            None => None,
        };

        Some(
            IntrospectionResponse::active()
                .with_scope(access_token.scope_string())
                .with_client_id(&access_token.client_id)
                .with_username(username)
                .with_token_type("Bearer")
                .with_exp(access_token.expires_at.unix_timestamp())
                .with_iat(access_token.created_at.unix_timestamp())
                .with_sub(access_token.user_id.clone())
                .with_aud(&access_token.client_id)
                .with_iss(&self.issuer),
        )
    }

    async fn introspect_refresh_token(&self, token: &str) -> Option<IntrospectionResponse> {
        let id = self.extractor.refresh_token_id(token)?;
        let refresh_token = self.find_refresh_token(&id).await?;
        if !refresh_token.is_active() {
            return None;
        }

        let mut response = IntrospectionResponse::active()
            .with_token_type("refresh_token")
            .with_exp(refresh_token.expires_at.unix_timestamp());

        if let Some(access_token) = self.find_access_token(&refresh_token.access_token_id).await {
            response = response.with_client_id(access_token.client_id);
        }

        Some(response)
    }

    // ========================================================================
    // Revocation
    // ========================================================================

    /// RFC 7009 revocation.
    ///
    /// Tokens owned by another client are left alone and reported as
    /// [`RevocationOutcome::NotFound`]; the HTTP layer answers 200 either way.
    ///
    /// # Errors
    /// Returns [`crate::AuthError::UnsupportedTokenType`] for an unknown hint.
    #[instrument(skip_all, fields(client_id = %client.client_id))]
    pub async fn revoke(
        &self,
        client: &Client,
        request: &RevocationRequest,
    ) -> AuthResult<RevocationOutcome> {
        let hint = TokenTypeHint::parse(request.token_type_hint.as_deref())?;

        let token = request.token.as_deref().unwrap_or_default();
        if token.is_empty() {
            return Ok(RevocationOutcome::NotFound);
        }

        if TokenTypeHint::allows_refresh(hint)
            && let Some(outcome) = self.revoke_refresh_token(client, token).await
        {
            return Ok(outcome);
        }

        if TokenTypeHint::allows_access(hint)
            && let Some(outcome) = self.revoke_access_token(client, token).await
        {
            return Ok(outcome);
        }

        Ok(RevocationOutcome::NotFound)
    }

    async fn revoke_refresh_token(&self, client: &Client, token: &str) -> Option<RevocationOutcome> {
        let id = self.extractor.refresh_token_id(token)?;
        let refresh_token = self.find_refresh_token(&id).await?;

        // Ownership lives on the paired access token.
        let access_token = self.find_access_token(&refresh_token.access_token_id).await?;
        if access_token.client_id != client.client_id {
            return None;
        }

        self.revoke_refresh(&refresh_token.id).await;
        self.revoke_access(&access_token.id).await;

        info!(
            refresh_token_id = %refresh_token.id,
            access_token_id = %access_token.id,
            client_id = %client.client_id,
            "Refresh token revoked"
        );

        Some(RevocationOutcome::RefreshToken {
            refresh_token_id: refresh_token.id,
            access_token_id: access_token.id,
        })
    }

    async fn revoke_access_token(&self, client: &Client, token: &str) -> Option<RevocationOutcome> {
        let id = self.extractor.access_token_id(token)?;
        let access_token = self.find_access_token(&id).await?;
        if access_token.client_id != client.client_id {
            return None;
        }

        self.revoke_access(&access_token.id).await;
        let refresh_tokens_revoked = match self
            .refresh_tokens
            .revoke_by_access_token(&access_token.id)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, access_token_id = %access_token.id, "Failed to revoke paired refresh tokens");
                0
            }
        };

        info!(
            access_token_id = %access_token.id,
            client_id = %client.client_id,
            refresh_tokens_revoked,
            "Access token revoked"
        );

        Some(RevocationOutcome::AccessToken {
            access_token_id: access_token.id,
            refresh_tokens_revoked,
        })
    }

    // ========================================================================
    // Store access
    // ========================================================================

    async fn find_access_token(&self, id: &str) -> Option<AccessToken> {
        self.access_tokens
            .find_by_id(id)
            .await
            .inspect_err(|e| warn!(error = %e, "Access token lookup failed"))
            .ok()
            .flatten()
    }

    async fn find_refresh_token(&self, id: &str) -> Option<RefreshToken> {
        self.refresh_tokens
            .find_by_id(id)
            .await
            .inspect_err(|e| warn!(error = %e, "Refresh token lookup failed"))
            .ok()
            .flatten()
    }

    async fn revoke_access(&self, id: &str) {
        if let Err(e) = self.access_tokens.revoke(id).await {
            warn!(error = %e, access_token_id = %id, "Failed to revoke access token");
        }
    }

    async fn revoke_refresh(&self, id: &str) {
        if let Err(e) = self.refresh_tokens.revoke(id).await {
            warn!(error = %e, refresh_token_id = %id, "Failed to revoke refresh token");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::{Duration, OffsetDateTime};

    use crate::claims::{AttributeUser, OidcUser};
    use crate::error::AuthError;
    use crate::token::cipher::{RefreshTokenCipher, RefreshTokenPayload};

    #[derive(Default)]
    struct Store {
        access: Mutex<HashMap<String, AccessToken>>,
        refresh: Mutex<HashMap<String, RefreshToken>>,
    }

    #[async_trait]
    impl AccessTokenStorage for Store {
        async fn find_by_id(&self, id: &str) -> AuthResult<Option<AccessToken>> {
            Ok(self.access.lock().unwrap().get(id).cloned())
        }

        async fn revoke(&self, id: &str) -> AuthResult<bool> {
            Ok(self
                .access
                .lock()
                .unwrap()
                .get_mut(id)
                .map(|t| t.revoked = true)
                .is_some())
        }
    }

    #[async_trait]
    impl RefreshTokenStorage for Store {
        async fn find_by_id(&self, id: &str) -> AuthResult<Option<RefreshToken>> {
            Ok(self.refresh.lock().unwrap().get(id).cloned())
        }

        async fn revoke(&self, id: &str) -> AuthResult<bool> {
            Ok(self
                .refresh
                .lock()
                .unwrap()
                .get_mut(id)
                .map(|t| t.revoked = true)
                .is_some())
        }

        async fn revoke_by_access_token(&self, access_token_id: &str) -> AuthResult<u64> {
            let mut count = 0;
            for token in self.refresh.lock().unwrap().values_mut() {
                if token.access_token_id == access_token_id {
                    token.revoked = true;
                    count += 1;
                }
            }
            Ok(count)
        }
    }

    struct Users;

    #[async_trait]
    impl UserStorage for Users {
        async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<Arc<dyn OidcUser>>> {
            Ok((user_id == "42").then(|| {
                Arc::new(AttributeUser::new("42").with("email", "jane@example.com")) as Arc<dyn OidcUser>
            }))
        }
    }

    struct FailingStore;

    #[async_trait]
    impl AccessTokenStorage for FailingStore {
        async fn find_by_id(&self, _id: &str) -> AuthResult<Option<AccessToken>> {
            Err(AuthError::storage("connection refused"))
        }

        async fn revoke(&self, _id: &str) -> AuthResult<bool> {
            Err(AuthError::storage("connection refused"))
        }
    }

    const LEGACY_ID: &str =
        "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    fn access_token(id: &str, client_id: &str, expires_in: Duration) -> AccessToken {
        let now = OffsetDateTime::now_utc();
        AccessToken {
            id: id.to_string(),
            client_id: client_id.to_string(),
            user_id: Some("42".to_string()),
            scopes: vec!["openid".to_string(), "email".to_string()],
            revoked: false,
            created_at: now - Duration::minutes(1),
            expires_at: now + expires_in,
        }
    }

    fn refresh_token(id: &str, access_token_id: &str) -> RefreshToken {
        RefreshToken {
            id: id.to_string(),
            access_token_id: access_token_id.to_string(),
            revoked: false,
            expires_at: OffsetDateTime::now_utc() + Duration::days(7),
        }
    }

    fn setup(cipher: Option<RefreshTokenCipher>) -> (Arc<Store>, TokenLifecycleGateway) {
        let store = Arc::new(Store::default());
        let gateway = TokenLifecycleGateway::new(
            store.clone(),
            store.clone(),
            Arc::new(Users),
            TokenIdentityExtractor::new(cipher),
            "https://id.example.com",
        );
        (store, gateway)
    }

    fn insert_access(store: &Store, token: AccessToken) {
        store.access.lock().unwrap().insert(token.id.clone(), token);
    }

    fn insert_refresh(store: &Store, token: RefreshToken) {
        store.refresh.lock().unwrap().insert(token.id.clone(), token);
    }

    fn web() -> Client {
        Client::public("web", "Web")
    }

    fn introspection(token: &str, hint: Option<&str>) -> IntrospectionRequest {
        IntrospectionRequest {
            token: Some(token.to_string()),
            token_type_hint: hint.map(str::to_string),
        }
    }

    fn revocation(token: &str, hint: Option<&str>) -> RevocationRequest {
        RevocationRequest {
            token: Some(token.to_string()),
            token_type_hint: hint.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_introspect_active_access_token() {
        let (store, gateway) = setup(None);
        let token = access_token("at-1", "web", Duration::minutes(10));
        let exp = token.expires_at.unix_timestamp();
        insert_access(&store, token);

        let response = gateway.introspect(&web(), &introspection("at-1", None)).await.unwrap();

        assert!(response.active);
        assert_eq!(response.exp, Some(exp));
        assert_eq!(response.scope.as_deref(), Some("openid email"));
        assert_eq!(response.client_id.as_deref(), Some("web"));
        assert_eq!(response.username.as_deref(), Some("jane@example.com"));
        assert_eq!(response.token_type.as_deref(), Some("Bearer"));
        assert_eq!(response.sub.as_deref(), Some("42"));
        assert_eq!(response.aud.as_deref(), Some("web"));
        assert_eq!(response.iss.as_deref(), Some("https://id.example.com"));
    }

    #[tokio::test]
    async fn test_introspect_inactive_cases_are_indistinguishable() {
        let (store, gateway) = setup(None);
        insert_access(&store, access_token("expired", "web", Duration::minutes(-1)));
        let mut revoked = access_token("revoked", "web", Duration::minutes(10));
        revoked.revoked = true;
        insert_access(&store, revoked);

        for token in ["missing", "expired", "revoked", "not.a.jwt"] {
            let response = gateway.introspect(&web(), &introspection(token, None)).await.unwrap();
            assert_eq!(response, IntrospectionResponse::inactive(), "{token}");
        }
    }

    #[tokio::test]
    async fn test_introspect_empty_token_is_inactive() {
        let (_, gateway) = setup(None);
        let response = gateway.introspect(&web(), &IntrospectionRequest::default()).await.unwrap();
        assert!(!response.active);
    }

    #[tokio::test]
    async fn test_introspect_rejects_unknown_hint() {
        let (_, gateway) = setup(None);
        let err = gateway
            .introspect(&web(), &introspection("at-1", Some("id_token")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedTokenType { .. }));
    }

    #[tokio::test]
    async fn test_introspect_refresh_token() {
        let key = RefreshTokenCipher::generate_key();
        let cipher = RefreshTokenCipher::new(&key);
        let blob = cipher.encrypt(&RefreshTokenPayload::new("rt-1")).unwrap();

        let (store, gateway) = setup(Some(cipher));
        insert_access(&store, access_token("at-1", "web", Duration::minutes(10)));
        insert_refresh(&store, refresh_token("rt-1", "at-1"));

        let response = gateway
            .introspect(&web(), &introspection(&blob, Some("refresh_token")))
            .await
            .unwrap();

        assert!(response.active);
        assert_eq!(response.token_type.as_deref(), Some("refresh_token"));
        assert_eq!(response.client_id.as_deref(), Some("web"));
        assert!(response.scope.is_none());
    }

    #[tokio::test]
    async fn test_introspect_hint_restricts_lookup() {
        let (store, gateway) = setup(None);
        insert_access(&store, access_token(LEGACY_ID, "web", Duration::minutes(10)));

        let response = gateway
            .introspect(&web(), &introspection(LEGACY_ID, Some("refresh_token")))
            .await
            .unwrap();
        assert!(!response.active);
    }

    #[tokio::test]
    async fn test_introspect_storage_failure_is_inactive() {
        let store = Arc::new(Store::default());
        let gateway = TokenLifecycleGateway::new(
            Arc::new(FailingStore),
            store,
            Arc::new(Users),
            TokenIdentityExtractor::default(),
            "https://id.example.com",
        );

        let response = gateway.introspect(&web(), &introspection("at-1", None)).await.unwrap();
        assert!(!response.active);
    }

    #[tokio::test]
    async fn test_revoke_refresh_token_cascades_to_access_token() {
        let (store, gateway) = setup(None);
        insert_access(&store, access_token("at-1", "web", Duration::minutes(10)));
        insert_refresh(&store, refresh_token(LEGACY_ID, "at-1"));

        let outcome = gateway.revoke(&web(), &revocation(LEGACY_ID, None)).await.unwrap();

        assert!(matches!(outcome, RevocationOutcome::RefreshToken { .. }));
        assert!(store.refresh.lock().unwrap()[LEGACY_ID].revoked);
        assert!(store.access.lock().unwrap()["at-1"].revoked);
    }

    #[tokio::test]
    async fn test_revoke_access_token_cascades_to_refresh_tokens() {
        let (store, gateway) = setup(None);
        insert_access(&store, access_token("at-1", "web", Duration::minutes(10)));
        insert_refresh(&store, refresh_token("rt-1", "at-1"));
        insert_refresh(&store, refresh_token("rt-2", "at-1"));
        insert_refresh(&store, refresh_token("rt-3", "at-other"));

        let outcome = gateway
            .revoke(&web(), &revocation("at-1", Some("access_token")))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RevocationOutcome::AccessToken {
                access_token_id: "at-1".to_string(),
                refresh_tokens_revoked: 2,
            }
        );
        let refresh = store.refresh.lock().unwrap();
        assert!(refresh["rt-1"].revoked);
        assert!(refresh["rt-2"].revoked);
        assert!(!refresh["rt-3"].revoked);
    }

    #[tokio::test]
    async fn test_revoke_other_clients_token_is_not_found() {
        let (store, gateway) = setup(None);
        insert_access(&store, access_token("at-1", "mobile", Duration::minutes(10)));
        insert_refresh(&store, refresh_token(LEGACY_ID, "at-1"));

        for token in ["at-1", LEGACY_ID] {
            let outcome = gateway.revoke(&web(), &revocation(token, None)).await.unwrap();
            assert_eq!(outcome, RevocationOutcome::NotFound);
        }
        assert!(!store.access.lock().unwrap()["at-1"].revoked);
        assert!(!store.refresh.lock().unwrap()[LEGACY_ID].revoked);
    }

    #[tokio::test]
    async fn test_revoke_unknown_and_empty_tokens() {
        let (_, gateway) = setup(None);
        assert_eq!(
            gateway.revoke(&web(), &revocation("nope", None)).await.unwrap(),
            RevocationOutcome::NotFound
        );
        assert_eq!(
            gateway.revoke(&web(), &RevocationRequest::default()).await.unwrap(),
            RevocationOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (store, gateway) = setup(None);
        insert_access(&store, access_token("at-1", "web", Duration::minutes(10)));

        gateway.revoke(&web(), &revocation("at-1", None)).await.unwrap();
        let outcome = gateway.revoke(&web(), &revocation("at-1", None)).await.unwrap();

        assert!(matches!(outcome, RevocationOutcome::AccessToken { .. }));
        assert!(store.access.lock().unwrap()["at-1"].revoked);
    }
}
