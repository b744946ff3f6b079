//! Password gate: one-way hash comparison against the operator secret.
//!
//! The plaintext `USER_PW` is hashed once at startup; only the digest is kept
//! in memory and every login candidate is hashed and compared against it.
//! No lockout, rate limiting, or session expiry.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `candidate`.
pub fn hash_password(candidate: &str) -> String {
    let digest = Sha256::digest(candidate.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// True when `candidate` hashes to `expected_hash`.
pub fn verify_password(candidate: &str, expected_hash: &str) -> bool {
    hash_password(candidate) == expected_hash
}
