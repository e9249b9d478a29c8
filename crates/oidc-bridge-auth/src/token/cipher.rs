//! Authenticated encryption of refresh token blobs.
//!
//! Refresh tokens handed to clients are AES-256-GCM encrypted JSON payloads
//! carrying the store identifier. The blob is
//! `base64url(nonce || ciphertext)` without padding, under the deployment's
//! master key.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Nonce size for AES-256-GCM (96 bits)
const NONCE_SIZE: usize = 12;

/// Key size for AES-256 (256 bits)
pub const KEY_SIZE: usize = 32;

/// Refresh token blob errors.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Malformed token blob: {0}")]
    Malformed(String),

    /// Wrong key, tampered ciphertext or truncated blob.
    #[error("Decryption failed")]
    Decryption,

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Invalid payload: {0}")]
    Payload(String),
}

/// Decrypted refresh token contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenPayload {
    pub refresh_token_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<i64>,
}

impl RefreshTokenPayload {
    #[must_use]
    pub fn new(refresh_token_id: impl Into<String>) -> Self {
        Self {
            refresh_token_id: refresh_token_id.into(),
            access_token_id: None,
            client_id: None,
            user_id: None,
            scopes: Vec::new(),
            expire_time: None,
        }
    }
}

/// Parses a master key.
///
/// Accepts `base64:<key>`, 64 hex characters, or plain base64.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKey`] unless the key decodes to 32 bytes.
pub fn parse_key(key_str: &str) -> Result<[u8; KEY_SIZE], CipherError> {
    let key_str = key_str.trim();

    if let Some(encoded) = key_str.strip_prefix("base64:") {
        return to_key(
            BASE64
                .decode(encoded)
                .map_err(|e| CipherError::InvalidKey(format!("Invalid base64 key: {e}")))?,
        );
    }

    if key_str.len() == KEY_SIZE * 2 {
        if let Ok(bytes) = hex::decode(key_str) {
            return to_key(bytes);
        }
    }

    to_key(
        BASE64
            .decode(key_str)
            .map_err(|e| CipherError::InvalidKey(format!("Invalid base64 key: {e}")))?,
    )
}

fn to_key(bytes: Vec<u8>) -> Result<[u8; KEY_SIZE], CipherError> {
    <[u8; KEY_SIZE]>::try_from(bytes.as_slice()).map_err(|_| {
        CipherError::InvalidKey(format!(
            "Key must be {} bytes, got {}",
            KEY_SIZE,
            bytes.len()
        ))
    })
}

/// Encrypts and decrypts refresh token blobs under one master key.
#[derive(Clone)]
pub struct RefreshTokenCipher {
    cipher: Aes256Gcm,
}

impl RefreshTokenCipher {
    #[must_use]
    pub fn new(key: &[u8; KEY_SIZE]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    /// Builds a cipher from a configured key string.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKey`] if the key cannot be parsed.
    pub fn from_key_str(key: &str) -> Result<Self, CipherError> {
        Ok(Self::new(&parse_key(key)?))
    }

    /// Generates a random master key.
    #[must_use]
    pub fn generate_key() -> [u8; KEY_SIZE] {
        let mut key = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut key);
        key
    }

    /// Encrypts a payload into a blob.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or encryption fails.
    pub fn encrypt(&self, payload: &RefreshTokenPayload) -> Result<String, CipherError> {
        let plaintext =
            serde_json::to_vec(payload).map_err(|e| CipherError::Payload(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_ref())
            .map_err(|e| CipherError::Encryption(e.to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(blob))
    }

    /// Decrypts a blob and parses its payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is not valid base64url, fails
    /// authentication, or does not hold a payload.
    pub fn decrypt(&self, blob: &str) -> Result<RefreshTokenPayload, CipherError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(blob.trim_end_matches('='))
            .map_err(|e| CipherError::Malformed(e.to_string()))?;

        if bytes.len() <= NONCE_SIZE {
            return Err(CipherError::Malformed("blob too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CipherError::Decryption)?;

        serde_json::from_slice(&plaintext).map_err(|e| CipherError::Payload(e.to_string()))
    }
}

impl std::fmt::Debug for RefreshTokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenCipher").finish_non_exhaustive()
    }
}
