//! Client authentication for the introspection and revocation endpoints.
//!
//! # Authentication Methods
//!
//! - `client_secret_basic` - HTTP Basic with percent-encoded `client_id:client_secret`
//! - `client_secret_post` - `client_id` and `client_secret` in the form body
//! - `none` - public clients identify themselves with `client_id` only
//!
//! Basic credentials win over body credentials when both are present.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::secret::verify_client_secret;
use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::ClientStorage;
use crate::types::Client;

/// Result of successful client authentication.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    pub client: Client,
    pub auth_method: TokenEndpointAuthMethod,
}

/// Token endpoint authentication methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEndpointAuthMethod {
    None,
    ClientSecretBasic,
    ClientSecretPost,
}

impl TokenEndpointAuthMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ClientSecretBasic => "client_secret_basic",
            Self::ClientSecretPost => "client_secret_post",
        }
    }
}

impl fmt::Display for TokenEndpointAuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Client credentials from the request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientCredentials {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// Authenticates the calling client.
///
/// `authorization` is the raw `Authorization` header, if any.
///
/// # Errors
///
/// Returns [`AuthError::InvalidClient`] if no credentials were supplied, the
/// client is unknown or revoked, or a confidential client's secret does not
/// verify.
pub async fn authenticate_client(
    authorization: Option<&str>,
    body: &ClientCredentials,
    client_storage: &dyn ClientStorage,
) -> AuthResult<AuthenticatedClient> {
    if let Some((client_id, client_secret)) = authorization.and_then(parse_basic_auth) {
        return authenticate(
            &client_id,
            Some(&client_secret),
            TokenEndpointAuthMethod::ClientSecretBasic,
            client_storage,
        )
        .await;
    }

    match (body.client_id.as_deref(), body.client_secret.as_deref()) {
        (Some(client_id), Some(client_secret)) if !client_id.is_empty() => {
            authenticate(
                client_id,
                Some(client_secret),
                TokenEndpointAuthMethod::ClientSecretPost,
                client_storage,
            )
            .await
        }
        (Some(client_id), None) if !client_id.is_empty() => {
            authenticate(client_id, None, TokenEndpointAuthMethod::None, client_storage).await
        }
        _ => Err(AuthError::invalid_client("Client authentication failed")),
    }
}

async fn authenticate(
    client_id: &str,
    client_secret: Option<&str>,
    auth_method: TokenEndpointAuthMethod,
    client_storage: &dyn ClientStorage,
) -> AuthResult<AuthenticatedClient> {
    let client = client_storage
        .find_by_client_id(client_id)
        .await?
        .ok_or_else(|| AuthError::invalid_client("Client authentication failed"))?;

    if client.revoked {
        debug!(client_id, "Revoked client attempted to authenticate");
        return Err(AuthError::invalid_client("Client authentication failed"));
    }

    if client.confidential {
        let hash = client
            .secret_hash
            .as_deref()
            .ok_or_else(|| AuthError::invalid_client("Client authentication failed"))?;
        let secret = client_secret
            .ok_or_else(|| AuthError::invalid_client("Client authentication failed"))?;

        // Argon2 is CPU-bound; run it off the async workers.
        let (secret, hash) = (secret.to_string(), hash.to_string());
        let verified = tokio::task::spawn_blocking(move || verify_client_secret(&secret, &hash))
            .await
            .map_err(|e| AuthError::internal(format!("Client secret verification failed: {e}")))?
            .unwrap_or_else(|e| {
                tracing::error!(client_id, error = %e, "Stored client secret hash is malformed");
                false
            });
        if !verified {
            debug!(client_id, "Client secret mismatch");
            return Err(AuthError::invalid_client("Client authentication failed"));
        }
    }

    Ok(AuthenticatedClient {
        client,
        auth_method,
    })
}

/// Parses an HTTP Basic `Authorization` header into percent-decoded
/// `(client_id, client_secret)`.
///
/// Returns `None` if the header is not Basic or is malformed.
#[must_use]
pub fn parse_basic_auth(header_value: &str) -> Option<(String, String)> {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    let encoded = header_value.trim().strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;

    // The secret may contain colons.
    let (client_id, client_secret) = credentials.split_once(':')?;

    let client_id = urlencoding::decode(client_id).ok()?.into_owned();
    let client_secret = urlencoding::decode(client_secret).ok()?.into_owned();
    Some((client_id, client_secret))
}
