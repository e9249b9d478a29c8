//! Argon2id hashing for client secrets.
//!
//! Hashes are stored in PHC string format (`$argon2id$v=19$...`), so the
//! salt and parameters travel with the hash.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;

/// Generates a random client secret: 32 bytes, hex encoded.
#[must_use]
pub fn generate_client_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

/// Hashes a client secret for storage.
///
/// # Errors
/// Returns `argon2::password_hash::Error` if hashing fails.
pub fn hash_client_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verifies a client secret against a stored hash.
///
/// `Ok(false)` means a mismatch; `Err` means the stored hash is malformed.
///
/// # Errors
/// Returns `argon2::password_hash::Error` if `hash` is not a PHC string.
pub fn verify_client_secret(secret: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}
