//! Recovering store identifiers from presented tokens.
//!
//! Three shapes arrive at the maintenance endpoints:
//!
//! | Shape | Recognised by | Identifier |
//! |---|---|---|
//! | JWT access token | contains `.` | `jti` claim, read without verification |
//! | opaque access token | anything else | the string itself |
//! | encrypted refresh token | decrypts under the master key | `refresh_token_id` |
//!
//! A refresh token that fails to decrypt is accepted verbatim only if it
//! looks like a legacy opaque id. Every failure collapses to `None`; the
//! caller treats that as "not found".

use serde::Deserialize;
use tracing::{debug, error};

use super::cipher::RefreshTokenCipher;
use super::jwt::{decode_unverified, is_jwt_shaped};
use crate::config::OidcConfig;
use crate::error::{AuthError, AuthResult};

/// Length of opaque refresh token identifiers issued by the token store.
pub const OPAQUE_REFRESH_ID_LENGTH: usize = 80;

/// Short, non-reversible preview of a token for log lines.
#[must_use]
pub fn token_preview(token: &str) -> String {
    let head: String = token.chars().take(5).collect();
    format!("{head}...")
}

#[derive(Deserialize)]
struct JtiClaim {
    #[serde(default)]
    jti: Option<String>,
}

/// Maps presented token strings to token store identifiers.
#[derive(Debug, Clone, Default)]
pub struct TokenIdentityExtractor {
    cipher: Option<RefreshTokenCipher>,
}

impl TokenIdentityExtractor {
    /// Creates an extractor. Without a cipher only legacy opaque refresh
    /// tokens can be resolved.
    #[must_use]
    pub fn new(cipher: Option<RefreshTokenCipher>) -> Self {
        Self { cipher }
    }

    /// Creates an extractor using the configured master key.
    ///
    /// # Errors
    /// Returns [`AuthError::Configuration`] if the key is malformed.
    pub fn from_config(config: &OidcConfig) -> AuthResult<Self> {
        let cipher = config
            .encryption_key
            .as_deref()
            .map(RefreshTokenCipher::from_key_str)
            .transpose()
            .map_err(|e| AuthError::configuration(format!("encryption_key: {e}")))?;
        Ok(Self::new(cipher))
    }

    /// Store identifier of an access token.
    #[must_use]
    pub fn access_token_id(&self, token: &str) -> Option<String> {
        if token.is_empty() {
            return None;
        }

        if !is_jwt_shaped(token) {
            return Some(token.to_string());
        }

        match decode_unverified::<JtiClaim>(token) {
            Ok(JtiClaim { jti: Some(jti) }) if !jti.is_empty() => Some(jti),
            Ok(_) => {
                debug!(token_preview = %token_preview(token), "JWT access token has no jti");
                None
            }
            Err(e) => {
                debug!(token_preview = %token_preview(token), error = %e, "Unparseable JWT access token");
                None
            }
        }
    }

    /// Store identifier of a refresh token.
    #[must_use]
    pub fn refresh_token_id(&self, token: &str) -> Option<String> {
        if token.is_empty() {
            return None;
        }

        if let Some(cipher) = &self.cipher {
            match cipher.decrypt(token) {
                Ok(payload) if !payload.refresh_token_id.is_empty() => {
                    return Some(payload.refresh_token_id);
                }
                Ok(_) => {
                    debug!(token_preview = %token_preview(token), "Refresh token payload has an empty id");
                }
                Err(e) => {
                    debug!(error = %e, "Refresh token did not decrypt, trying legacy format");
                }
            }
        }

        if is_legacy_refresh_id(token) {
            return Some(token.to_string());
        }

        error!(
            token_preview = %token_preview(token),
            "Failed to extract refresh token id"
        );
        None
    }
}

fn is_legacy_refresh_id(token: &str) -> bool {
    token.len() == OPAQUE_REFRESH_ID_LENGTH && !token.contains('.')
}
