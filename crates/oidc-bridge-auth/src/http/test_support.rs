use std::sync::Arc;

use async_trait::async_trait;
use oidc_bridge_core::EventBroadcaster;

use super::state::{OidcState, OidcStores};
use crate::AuthResult;
use crate::claims::OidcUser;
use crate::config::OidcConfig;
use crate::storage::{
    AccessTokenStorage, ClientStorage, RefreshTokenStorage, SessionStorage, UserStorage,
};
use crate::token::{KeyMaterial, SigningKeyPair};
use crate::types::{AccessToken, Client, RefreshToken, Session};

/// Stores that know nothing.
pub(crate) struct EmptyStore;

#[async_trait]
impl ClientStorage for EmptyStore {
    async fn find_by_client_id(&self, _client_id: &str) -> AuthResult<Option<Client>> {
        Ok(None)
    }
}

#[async_trait]
impl AccessTokenStorage for EmptyStore {
    async fn find_by_id(&self, _id: &str) -> AuthResult<Option<AccessToken>> {
        Ok(None)
    }

    async fn revoke(&self, _id: &str) -> AuthResult<bool> {
        Ok(false)
    }
}

#[async_trait]
impl RefreshTokenStorage for EmptyStore {
    async fn find_by_id(&self, _id: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(None)
    }

    async fn revoke(&self, _id: &str) -> AuthResult<bool> {
        Ok(false)
    }

    async fn revoke_by_access_token(&self, _access_token_id: &str) -> AuthResult<u64> {
        Ok(0)
    }
}

#[async_trait]
impl UserStorage for EmptyStore {
    async fn find_by_id(&self, _user_id: &str) -> AuthResult<Option<Arc<dyn OidcUser>>> {
        Ok(None)
    }
}

#[async_trait]
impl SessionStorage for EmptyStore {
    async fn find(&self, _session_id: &str) -> AuthResult<Option<Session>> {
        Ok(None)
    }

    async fn regenerate(&self, _session_id: Option<&str>) -> AuthResult<Session> {
        Ok(Session::new(None))
    }
}

pub(crate) fn state_with_keys(config: OidcConfig, keys: KeyMaterial) -> OidcState {
    let store = Arc::new(EmptyStore);
    let stores = OidcStores {
        clients: store.clone(),
        access_tokens: store.clone(),
        refresh_tokens: store.clone(),
        users: store.clone(),
        sessions: store,
    };
    OidcState::new(config, stores, keys, EventBroadcaster::new_shared()).unwrap()
}

pub(crate) fn state_with(config: OidcConfig) -> OidcState {
    let (pair, _, _) = SigningKeyPair::generate_rsa().unwrap();
    state_with_keys(config, KeyMaterial::from_key_pair(pair))
}
