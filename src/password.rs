//! Password hashing for stored user accounts.
//!
//! Hashes are unsalted SHA-256, lowercase hex, which is the format the
//! `users.password_hash` column already holds.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Lowercase hex SHA-256 of the UTF-8 password.
pub fn hash_password(password: &str) -> String {
    let hash = Sha256::digest(password.as_bytes());
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Compare a candidate password against a stored hash in constant time.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let candidate = hash_password(password);
    let stored = stored_hash.trim().to_ascii_lowercase();
    candidate.as_bytes().ct_eq(stored.as_bytes()).unwrap_u8() == 1
}
