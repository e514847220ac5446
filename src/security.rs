use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// User ids
// =============================================================================

/// Derive the stored user id from a normalized email
///
/// `user_id = SHA256(SHA256(email) + pepper)`. The pepper lives in the
/// environment, so a leaked database alone cannot map ids back to addresses.
pub fn apply_pepper(email: &str, pepper: &str) -> String {
    let email_hash = hex::encode(Sha256::digest(email.as_bytes()));

    let mut hasher = Sha256::new();
    hasher.update(email_hash.as_bytes());
    hasher.update(pepper.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hex SHA-256 of arbitrary content, used as the blob storage id
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

// =============================================================================
// HMAC
// =============================================================================

/// Hex-encoded HMAC-SHA256 of `data` under `secret`
pub fn sign_hmac(data: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts any key length"));
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify an HMAC-SHA256 signature in constant time
pub fn verify_hmac(data: &str, signature: &str, secret: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(data.as_bytes());

    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::debug!("Invalid hex signature format");
            return false;
        }
    };

    mac.verify_slice(&sig_bytes).is_ok()
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// Check a password against a stored Argon2 PHC string
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to parse stored password hash: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

static DUMMY_PASSWORD_HASH: OnceLock<String> = OnceLock::new();

/// A valid Argon2 hash that no submitted password matches
///
/// Sign-in verifies against it when the email is unknown, so that path pays the
/// same Argon2 cost as a wrong password.
pub fn dummy_password_hash() -> &'static str {
    DUMMY_PASSWORD_HASH.get_or_init(|| {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        hash_password(&hex::encode(secret)).unwrap_or_else(|e| {
            tracing::error!("Failed to build dummy password hash: {}", e);
            String::new()
        })
    })
}
