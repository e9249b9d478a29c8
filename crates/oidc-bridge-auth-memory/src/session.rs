//! In-memory browser sessions.

use async_trait::async_trait;
use dashmap::DashMap;
use oidc_bridge_auth::storage::SessionStorage;
use oidc_bridge_auth::{AuthResult, Session};

#[derive(Debug, Default)]
pub struct InMemorySessionStorage {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session, logged in when `user_id` is given.
    pub fn start(&self, user_id: Option<&str>) -> Session {
        let session = Session::new(user_id.map(str::to_string));
        self.sessions.insert(session.id.clone(), session.clone());
        session
    }

    #[must_use]
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn find(&self, session_id: &str) -> AuthResult<Option<Session>> {
        Ok(self.sessions.get(session_id).map(|s| s.clone()))
    }

    async fn regenerate(&self, session_id: Option<&str>) -> AuthResult<Session> {
        if let Some(id) = session_id {
            self.sessions.remove(id);
        }
        Ok(self.start(None))
    }
}
