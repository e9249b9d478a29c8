//! Event types raised by the OIDC layer.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Kind of identity event, used by hooks to filter what they receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OidcEventType {
    /// An ID token was minted alongside an access token
    TokenIssued,
    /// A relying party started a logout
    LogoutInitiated,
    /// The userinfo endpoint returned claims
    UserInfoRequested,
}

impl OidcEventType {
    /// Returns the string representation of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            OidcEventType::TokenIssued => "token_issued",
            OidcEventType::LogoutInitiated => "logout_initiated",
            OidcEventType::UserInfoRequested => "userinfo_requested",
        }
    }
}

impl std::fmt::Display for OidcEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity event published on the broadcaster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OidcEvent {
    /// An ID token was issued for a user to a client.
    TokenIssued {
        user_id: String,
        client_id: String,
        scopes: Vec<String>,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },

    /// RP-initiated logout, raised before the session is invalidated.
    LogoutInitiated {
        /// User of the current session, if any
        user_id: Option<String>,
        /// Client recovered from the `id_token_hint`, if any
        client_id: Option<String>,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },

    /// Claims were served from the userinfo endpoint.
    UserInfoRequested {
        user_id: String,
        scopes: Vec<String>,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },
}

impl OidcEvent {
    /// Create a token issued event.
    pub fn token_issued(
        user_id: impl Into<String>,
        client_id: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self::TokenIssued {
            user_id: user_id.into(),
            client_id: client_id.into(),
            scopes,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Create a logout initiated event.
    pub fn logout_initiated(user_id: Option<String>, client_id: Option<String>) -> Self {
        Self::LogoutInitiated {
            user_id,
            client_id,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Create a userinfo requested event.
    pub fn userinfo_requested(user_id: impl Into<String>, scopes: Vec<String>) -> Self {
        Self::UserInfoRequested {
            user_id: user_id.into(),
            scopes,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Returns the kind of this event.
    pub fn event_type(&self) -> OidcEventType {
        match self {
            Self::TokenIssued { .. } => OidcEventType::TokenIssued,
            Self::LogoutInitiated { .. } => OidcEventType::LogoutInitiated,
            Self::UserInfoRequested { .. } => OidcEventType::UserInfoRequested,
        }
    }

    /// Returns the user the event is about, when known.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::TokenIssued { user_id, .. } | Self::UserInfoRequested { user_id, .. } => {
                Some(user_id)
            }
            Self::LogoutInitiated { user_id, .. } => user_id.as_deref(),
        }
    }

    /// Returns the client involved, when known.
    pub fn client_id(&self) -> Option<&str> {
        match self {
            Self::TokenIssued { client_id, .. } => Some(client_id),
            Self::LogoutInitiated { client_id, .. } => client_id.as_deref(),
            Self::UserInfoRequested { .. } => None,
        }
    }

    /// Returns when the event was raised.
    pub fn timestamp(&self) -> OffsetDateTime {
        match self {
            Self::TokenIssued { timestamp, .. }
            | Self::LogoutInitiated { timestamp, .. }
            | Self::UserInfoRequested { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_issued_accessors() {
        let event = OidcEvent::token_issued("42", "client-1", vec!["openid".to_string()]);
        assert_eq!(event.event_type(), OidcEventType::TokenIssued);
        assert_eq!(event.user_id(), Some("42"));
        assert_eq!(event.client_id(), Some("client-1"));
    }

    #[test]
    fn test_logout_without_session() {
        let event = OidcEvent::logout_initiated(None, Some("client-1".to_string()));
        assert_eq!(event.event_type(), OidcEventType::LogoutInitiated);
        assert_eq!(event.user_id(), None);
        assert_eq!(event.client_id(), Some("client-1"));
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = OidcEvent::userinfo_requested("7", vec!["openid".into(), "email".into()]);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "user_info_requested");
        assert_eq!(json["user_id"], "7");
        assert_eq!(json["scopes"][1], "email");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_event_type_display() {
        assert_eq!(OidcEventType::TokenIssued.to_string(), "token_issued");
        assert_eq!(OidcEventType::LogoutInitiated.to_string(), "logout_initiated");
        assert_eq!(OidcEventType::UserInfoRequested.to_string(), "userinfo_requested");
    }
}
