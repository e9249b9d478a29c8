//! JWT signing, verification and unverified inspection.
//!
//! ID tokens are signed RS256 with the deployment key. The key id is the
//! first 16 hex characters of the SHA-256 of the public key PEM, so it is
//! stable across restarts and identical on every node sharing the key.
//!
//! ## Example
//!
//! ```ignore
//! use oidc_bridge_auth::token::jwt::{JwtService, SigningKeyPair};
//!
//! let key_pair = SigningKeyPair::from_pem(&private_pem, &public_pem)?;
//! let jwt = JwtService::new(key_pair);
//!
//! let token = jwt.encode(&claims)?;
//! let data = jwt.decode::<serde_json::Value>(&token)?;
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The only signing algorithm this layer issues.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::RS256;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// A required claim is missing.
    #[error("Missing required claim: {claim}")]
    MissingClaim {
        /// Name of the missing claim.
        claim: String,
    },

    /// Failed to generate a key pair.
    #[error("Key generation error: {message}")]
    KeyGenerationError {
        /// Description of the key generation error.
        message: String,
    },

    /// Invalid key format or data.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `MissingClaim` error.
    #[must_use]
    pub fn missing_claim(claim: impl Into<String>) -> Self {
        Self::MissingClaim {
            claim: claim.into(),
        }
    }

    /// Creates a new `KeyGenerationError`.
    #[must_use]
    pub fn key_generation_error(message: impl Into<String>) -> Self {
        Self::KeyGenerationError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a validation error (expired, bad signature).
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Expired | Self::InvalidSignature)
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::MissingRequiredClaim(claim) => Self::missing_claim(claim.clone()),
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Self::invalid_key(err.to_string())
            }
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

// ============================================================================
// JWKS
// ============================================================================

/// JSON Web Key Set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    /// The keys in this set.
    pub keys: Vec<Jwk>,
}

/// RSA JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type, always "RSA".
    pub kty: String,

    /// Algorithm.
    pub alg: String,

    /// Key use ("sig" for signing).
    #[serde(rename = "use")]
    pub use_: String,

    /// Key ID.
    pub kid: String,

    /// RSA modulus (base64url, unpadded).
    pub n: String,

    /// RSA exponent (base64url, unpadded).
    pub e: String,
}

// ============================================================================
// Keys
// ============================================================================

/// Computes the key id for a public key PEM.
#[must_use]
pub fn key_id(public_pem: &str) -> String {
    let digest = hex::encode(Sha256::digest(public_pem.as_bytes()));
    digest[..16].to_string()
}

/// A parsed RSA public key with everything needed for JWKS and verification.
#[derive(Clone)]
pub struct PublicKey {
    kid: String,
    n: Vec<u8>,
    e: Vec<u8>,
    decoding_key: DecodingKey,
}

impl PublicKey {
    /// Parses an SPKI (`BEGIN PUBLIC KEY`) PEM.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::InvalidKey`] if the PEM is not an RSA public key.
    pub fn from_pem(public_pem: &str) -> Result<Self, JwtError> {
        let public_key = RsaPublicKey::from_public_key_pem(public_pem.trim())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        Ok(Self {
            kid: key_id(public_pem),
            n: public_key.n().to_bytes_be(),
            e: public_key.e().to_bytes_be(),
            decoding_key,
        })
    }

    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Exports the key as a JWK.
    #[must_use]
    pub fn to_jwk(&self) -> Jwk {
        Jwk {
            kty: "RSA".to_string(),
            alg: "RS256".to_string(),
            use_: "sig".to_string(),
            kid: self.kid.clone(),
            n: URL_SAFE_NO_PAD.encode(&self.n),
            e: URL_SAFE_NO_PAD.encode(&self.e),
        }
    }

    /// Exports a single-key JWKS.
    #[must_use]
    pub fn jwks(&self) -> Jwks {
        Jwks {
            keys: vec![self.to_jwk()],
        }
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKey").field("kid", &self.kid).finish()
    }
}

/// An RSA signing key pair.
pub struct SigningKeyPair {
    public_key: PublicKey,
    encoding_key: EncodingKey,
}

impl SigningKeyPair {
    /// Loads a key pair from PEM strings.
    ///
    /// # Errors
    /// Returns an error if either PEM is invalid.
    pub fn from_pem(private_pem: &str, public_pem: &str) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        Ok(Self {
            public_key: PublicKey::from_pem(public_pem)?,
            encoding_key,
        })
    }

    /// Generates a new 2048-bit RSA key pair.
    ///
    /// Returns the pair together with its private and public PEMs.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate_rsa() -> Result<(Self, String, String), JwtError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?
            .to_string();

        let public_pem = private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let pair = Self::from_pem(&private_pem, &public_pem)?;
        Ok((pair, private_pem, public_pem))
    }

    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

impl std::fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("kid", &self.public_key.kid)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// JWT Service
// ============================================================================

/// Signs and verifies JWTs with the deployment key.
///
/// Thread-safe; share it behind an `Arc`.
#[derive(Debug)]
pub struct JwtService {
    signing_key: SigningKeyPair,
}

impl JwtService {
    #[must_use]
    pub fn new(signing_key: SigningKeyPair) -> Self {
        Self { signing_key }
    }

    /// Encodes claims into a compact RS256 JWT with `kid` in the header.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let mut header = Header::new(SIGNING_ALGORITHM);
        header.typ = Some("JWT".to_string());
        header.kid = Some(self.signing_key.public_key.kid.clone());

        jsonwebtoken::encode(&header, claims, &self.signing_key.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Decodes a JWT, verifying signature and expiry.
    ///
    /// Issuer and audience are not checked; access tokens are minted by the
    /// OAuth2 server and carry its conventions, not ours.
    ///
    /// # Errors
    /// Returns an error if verification fails.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<TokenData<T>, JwtError> {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        jsonwebtoken::decode(token, &self.signing_key.public_key.decoding_key, &validation)
            .map_err(JwtError::from)
    }

    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        &self.signing_key.public_key
    }
}

// ============================================================================
// Unverified inspection
// ============================================================================

/// Returns `true` if the string has the `header.payload.signature` shape.
#[must_use]
pub fn is_jwt_shaped(token: &str) -> bool {
    token.contains('.')
}

/// Decodes a JWT payload WITHOUT checking the signature.
///
/// Only for recovering identifiers from tokens whose authenticity is not
/// being relied on (revocation, introspection lookups, logout hints). Never
/// use the result to grant access.
///
/// # Errors
/// Returns [`JwtError::DecodingError`] if the token is not three
/// dot-separated segments or the payload is not base64url JSON.
pub fn decode_unverified<T: DeserializeOwned>(token: &str) -> Result<T, JwtError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(JwtError::decoding_error("Invalid JWT format"));
    }

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|_| JwtError::decoding_error("Invalid JWT payload encoding"))?;

    serde_json::from_slice(&payload_bytes)
        .map_err(|_| JwtError::decoding_error("Invalid JWT payload JSON"))
}
