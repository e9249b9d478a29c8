//! Loading the deployment signing keys.
//!
//! Key provisioning happens elsewhere; this module only reads what was
//! provisioned. A missing or broken key does not stop the process: JWKS
//! reports it as a 500 and minting fails, everything else keeps working.

use std::path::Path;
use std::sync::Arc;

use super::jwt::{JwtService, PublicKey, SigningKeyPair};
use crate::config::KeysConfig;
use crate::error::{AuthError, AuthResult};

/// Why the public key is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("public key not found: {0}")]
    Missing(String),

    #[error("public key could not be parsed: {0}")]
    Invalid(String),
}

/// Key material available to the OIDC layer.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    public_key: Result<Arc<PublicKey>, KeyError>,
    jwt: Option<Arc<JwtService>>,
}

impl KeyMaterial {
    /// Wraps an in-memory key pair.
    #[must_use]
    pub fn from_key_pair(pair: SigningKeyPair) -> Self {
        let public_key = Arc::new(pair.public_key().clone());
        Self {
            public_key: Ok(public_key),
            jwt: Some(Arc::new(JwtService::new(pair))),
        }
    }

    /// No key material at all.
    #[must_use]
    pub fn missing() -> Self {
        Self {
            public_key: Err(KeyError::Missing("no key configured".to_string())),
            jwt: None,
        }
    }

    /// Reads keys according to configuration, logging what is unusable.
    #[must_use]
    pub fn load(config: &KeysConfig) -> Self {
        let public_pem = read_pem(config.public_key.as_deref(), &config.public_key_path);
        let private_pem = read_pem(config.private_key.as_deref(), &config.private_key_path);

        let public_key = public_pem.and_then(|pem| {
            PublicKey::from_pem(&pem)
                .map(|key| (pem, key))
                .map_err(|e| KeyError::Invalid(e.to_string()))
        });

        let jwt = match (&public_key, &private_pem) {
            (Ok((public_pem, _)), Ok(private_pem)) => {
                match SigningKeyPair::from_pem(private_pem, public_pem) {
                    Ok(pair) => Some(Arc::new(JwtService::new(pair))),
                    Err(e) => {
                        tracing::error!(error = %e, "Private signing key is unusable");
                        None
                    }
                }
            }
            (_, Err(e)) => {
                tracing::warn!(error = %e, "Private signing key unavailable, ID tokens cannot be minted");
                None
            }
            _ => None,
        };

        if let Err(e) = &public_key {
            tracing::error!(error = %e, "Public signing key unavailable, JWKS will report an error");
        }

        Self {
            public_key: public_key.map(|(_, key)| Arc::new(key)),
            jwt,
        }
    }

    /// The public key, or why it is unavailable.
    ///
    /// # Errors
    /// Returns the load failure.
    pub fn public_key(&self) -> Result<&Arc<PublicKey>, &KeyError> {
        self.public_key.as_ref()
    }

    /// The signing service.
    ///
    /// # Errors
    /// Returns [`AuthError::KeyMaterial`] if no private key was loaded.
    pub fn jwt_service(&self) -> AuthResult<&Arc<JwtService>> {
        self.jwt
            .as_ref()
            .ok_or_else(|| AuthError::key_material("signing key is not available"))
    }
}

fn read_pem(inline: Option<&str>, path: &Path) -> Result<String, KeyError> {
    if let Some(pem) = inline.filter(|p| !p.trim().is_empty()) {
        return Ok(pem.replace("\\n", "\n"));
    }

    std::fs::read_to_string(path).map_err(|e| KeyError::Missing(format!("{}: {e}", path.display())))
}
