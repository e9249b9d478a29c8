//! In-memory stores for the OIDC bridge.
//!
//! Stand-ins for the OAuth2 server's token store and the host application's
//! user and session stores, backed by `dashmap`. Used by the server binary
//! in development and by the integration tests.
//!
//! # Example
//!
//! ```ignore
//! use oidc_bridge_auth_memory::MemoryStores;
//!
//! let stores = MemoryStores::new();
//! stores.clients.insert(Client::public("spa", "Single page app"));
//! let state = OidcState::new(config, stores.oidc_stores(), keys, events)?;
//! ```

pub mod client;
pub mod session;
pub mod token;
pub mod user;

use std::sync::Arc;

use oidc_bridge_auth::OidcStores;

pub use client::InMemoryClientStorage;
pub use session::InMemorySessionStorage;
pub use token::InMemoryTokenStorage;
pub use user::InMemoryUserStorage;

/// One of each in-memory store.
#[derive(Clone, Default)]
pub struct MemoryStores {
    pub clients: Arc<InMemoryClientStorage>,
    pub tokens: Arc<InMemoryTokenStorage>,
    pub users: Arc<InMemoryUserStorage>,
    pub sessions: Arc<InMemorySessionStorage>,
}

impl MemoryStores {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The same stores as the trait objects the OIDC layer consumes.
    #[must_use]
    pub fn oidc_stores(&self) -> OidcStores {
        OidcStores {
            clients: self.clients.clone(),
            access_tokens: self.tokens.clone(),
            refresh_tokens: self.tokens.clone(),
            users: self.users.clone(),
            sessions: self.sessions.clone(),
        }
    }
}
