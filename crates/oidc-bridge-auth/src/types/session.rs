//! Browser session record used by RP-initiated logout.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A host application session, identified by the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Logged-in user, `None` for anonymous sessions.
    pub user_id: Option<String>,
    /// Anti-forgery token bound to the session.
    pub csrf_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Session {
    /// Creates a fresh session with random identifiers.
    #[must_use]
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            user_id,
            csrf_token: uuid::Uuid::new_v4().simple().to_string(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sessions_are_unique() {
        let a = Session::new(Some("1".to_string()));
        let b = Session::new(None);
        assert_ne!(a.id, b.id);
        assert_ne!(a.csrf_token, b.csrf_token);
        assert_eq!(a.user_id.as_deref(), Some("1"));
    }
}
