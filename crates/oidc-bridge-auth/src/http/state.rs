//! Shared state for the OIDC handlers.

use std::sync::Arc;

use oidc_bridge_core::EventBroadcaster;

use crate::claims::{ClaimsResolver, ClaimsService};
use crate::config::OidcConfig;
use crate::error::AuthResult;
use crate::logout::LogoutService;
use crate::storage::{
    AccessTokenStorage, ClientStorage, RefreshTokenStorage, SessionStorage, UserStorage,
};
use crate::token::{
    IdTokenAugmenter, IdTokenMinter, KeyMaterial, TokenIdentityExtractor, TokenLifecycleGateway,
};

/// Collaborators owned by the OAuth2 server and the host application.
#[derive(Clone)]
pub struct OidcStores {
    pub clients: Arc<dyn ClientStorage>,
    pub access_tokens: Arc<dyn AccessTokenStorage>,
    pub refresh_tokens: Arc<dyn RefreshTokenStorage>,
    pub users: Arc<dyn UserStorage>,
    pub sessions: Arc<dyn SessionStorage>,
}

/// Everything the OIDC endpoints need, built once at start-up.
#[derive(Clone)]
pub struct OidcState {
    pub config: Arc<OidcConfig>,
    pub claims: ClaimsService,
    pub keys: KeyMaterial,
    pub lifecycle: TokenLifecycleGateway,
    pub logout: LogoutService,
    pub minter: IdTokenMinter,
    pub stores: OidcStores,
    pub events: Arc<EventBroadcaster>,
}

impl OidcState {
    /// Builds the state with the configured claim tables.
    ///
    /// # Errors
    /// Returns [`crate::AuthError::Configuration`] if the encryption key is malformed.
    pub fn new(
        config: OidcConfig,
        stores: OidcStores,
        keys: KeyMaterial,
        events: Arc<EventBroadcaster>,
    ) -> AuthResult<Self> {
        let resolver = ClaimsResolver::from_config(&config);
        Self::with_resolver(config, stores, keys, events, resolver)
    }

    /// Builds the state with a custom claims resolver, for deployments that
    /// register computed claims.
    ///
    /// # Errors
    /// Returns [`crate::AuthError::Configuration`] if the encryption key is malformed.
    pub fn with_resolver(
        config: OidcConfig,
        stores: OidcStores,
        keys: KeyMaterial,
        events: Arc<EventBroadcaster>,
        resolver: ClaimsResolver,
    ) -> AuthResult<Self> {
        let issuer = config.issuer().to_string();
        let claims = ClaimsService::new(Arc::new(resolver));
        let extractor = TokenIdentityExtractor::from_config(&config)?;

        let lifecycle = TokenLifecycleGateway::new(
            stores.access_tokens.clone(),
            stores.refresh_tokens.clone(),
            stores.users.clone(),
            extractor,
            issuer.clone(),
        );
        let logout = LogoutService::new(
            stores.clients.clone(),
            stores.sessions.clone(),
            config.app_url.clone(),
        )
        .with_events(events.clone());
        let minter =
            IdTokenMinter::new(keys.clone(), claims.clone(), issuer).with_events(events.clone());

        Ok(Self {
            config: Arc::new(config),
            claims,
            keys,
            lifecycle,
            logout,
            minter,
            stores,
            events,
        })
    }

    /// Token endpoint augmentation for the OAuth2 server.
    #[must_use]
    pub fn id_token_augmenter(&self) -> IdTokenAugmenter {
        IdTokenAugmenter::new(
            self.minter.clone(),
            self.stores.users.clone(),
            self.stores.clients.clone(),
        )
    }

    /// Issuer with any trailing slash removed.
    #[must_use]
    pub fn issuer(&self) -> &str {
        self.config.issuer()
    }
}
