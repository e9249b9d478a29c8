//! In-memory client registrations.

use async_trait::async_trait;
use dashmap::DashMap;
use oidc_bridge_auth::storage::ClientStorage;
use oidc_bridge_auth::{AuthResult, Client};

#[derive(Debug, Default)]
pub struct InMemoryClientStorage {
    clients: DashMap<String, Client>,
}

impl InMemoryClientStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a client.
    pub fn insert(&self, client: Client) {
        self.clients.insert(client.client_id.clone(), client);
    }

    /// Marks a client revoked. Returns `false` if it is unknown.
    pub fn revoke(&self, client_id: &str) -> bool {
        self.clients
            .get_mut(client_id)
            .map(|mut c| c.revoked = true)
            .is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl ClientStorage for InMemoryClientStorage {
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        Ok(self.clients.get(client_id).map(|c| c.clone()))
    }
}
