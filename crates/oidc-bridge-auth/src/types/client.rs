//! OAuth 2.0 client registration.

use serde::{Deserialize, Serialize};

/// A registered OAuth 2.0 client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Public client identifier, also the ID token `aud`.
    pub client_id: String,

    /// Display name.
    pub name: String,

    /// Argon2 PHC hash of the client secret. `None` for public clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_hash: Option<String>,

    /// Whether the client must authenticate with its secret.
    pub confidential: bool,

    /// Allow-listed redirect URIs, also used for post-logout redirects.
    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// Revoked clients can no longer authenticate.
    #[serde(default)]
    pub revoked: bool,
}

impl Client {
    /// Creates a public client (no secret).
    #[must_use]
    pub fn public(client_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            name: name.into(),
            secret_hash: None,
            confidential: false,
            redirect_uris: Vec::new(),
            revoked: false,
        }
    }

    /// Creates a confidential client from an already hashed secret.
    #[must_use]
    pub fn confidential(
        client_id: impl Into<String>,
        name: impl Into<String>,
        secret_hash: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            name: name.into(),
            secret_hash: Some(secret_hash.into()),
            confidential: true,
            redirect_uris: Vec::new(),
            revoked: false,
        }
    }

    /// Replaces the redirect URI allow-list.
    #[must_use]
    pub fn with_redirect_uris<I, S>(mut self, uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.redirect_uris = uris.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_client() {
        let client = Client::public("spa", "Single Page App");
        assert!(!client.confidential);
        assert!(client.secret_hash.is_none());
        assert!(!client.revoked);
    }

    #[test]
    fn test_confidential_client_with_redirects() {
        let client = Client::confidential("web", "Web", "$argon2id$...")
            .with_redirect_uris(["https://app.example.com/cb"]);
        assert!(client.confidential);
        assert_eq!(client.redirect_uris, vec!["https://app.example.com/cb"]);
    }

    #[test]
    fn test_client_deserializes_with_defaults() {
        let client: Client = serde_json::from_value(serde_json::json!({
            "client_id": "cli",
            "name": "CLI",
            "confidential": false
        }))
        .unwrap();
        assert!(client.redirect_uris.is_empty());
        assert!(!client.revoked);
    }
}
