//! Password digests for the account directory.
//!
//! Digests are plain SHA-256 over the UTF-8 password, hex encoded. They are
//! deterministic so verification is an equality check. No salt or pepper is
//! applied: identical passwords produce identical digests, which leaves the
//! table open to precomputed dictionary attacks if it is ever exfiltrated.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hashes `password` into a lowercase hex SHA-256 digest.
#[must_use]
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Returns `true` iff `password` hashes to `digest`.
///
/// The comparison runs in constant time over the digest bytes.
#[must_use]
pub fn verify_password(password: &str, digest: &str) -> bool {
    let candidate = hash_password(password);
    candidate.as_bytes().ct_eq(digest.as_bytes()).into()
}
