//! Credential-hash derivation for the login command
//!
//! The server stores and recomputes the same two-stage digest, so the
//! derivation here must match it byte for byte:
//!
//! 1. salt = SHA-256(lowercase(username))
//! 2. hash = SHA-256(password bytes ++ salt bytes)
//! 3. passwordHash = base64(hash)
//!
//! The salt depends only on the casing-normalized username; there is no
//! server-issued nonce, so transport encryption is the only replay
//! protection.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::{BufMut, Bytes, BytesMut};
use sha2::{Digest, Sha256};

/// Derive the base64 password hash for a username/password pair
pub fn password_hash(username: &str, password: &str) -> String {
    let salt = Sha256::digest(username.to_lowercase().as_bytes());

    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt);

    STANDARD.encode(hasher.finalize())
}

/// Build the login body: username ++ NUL ++ base64 password hash.
///
/// The username travels verbatim (original casing); only the salt
/// derivation lower-cases it.
pub fn login_body(username: &str, password: &str) -> Bytes {
    let hash = password_hash(username, password);

    let mut body = BytesMut::with_capacity(username.len() + 1 + hash.len());
    body.put_slice(username.as_bytes());
    body.put_u8(0);
    body.put_slice(hash.as_bytes());
    body.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference vector recomputed independently of this implementation
    const ALICE_SECRET_HASH: &str = "TNj3GCS7i0OQxAHtaxnKpY+hLZooQ8ZSQr3ECcIzSS4=";

    #[test]
    fn test_reference_vector() {
        assert_eq!(password_hash("alice", "secret"), ALICE_SECRET_HASH);
    }

    #[test]
    fn test_login_body_layout() {
        let body = login_body("alice", "secret");
        let expected = format!("alice\0{}", ALICE_SECRET_HASH);
        assert_eq!(&body[..], expected.as_bytes());
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            password_hash("alice", "secret"),
            password_hash("alice", "secret")
        );
    }

    #[test]
    fn test_salt_normalizes_username_casing() {
        // Same salt either way, so the hashes agree
        assert_eq!(
            password_hash("Alice", "secret"),
            password_hash("alice", "secret")
        );
        // But the body keeps the caller's casing
        assert!(login_body("Alice", "secret").starts_with(b"Alice\0"));
    }

    #[test]
    fn test_password_changes_hash() {
        assert_ne!(
            password_hash("alice", "secret"),
            password_hash("alice", "hunter2")
        );
        assert_eq!(
            password_hash("alice", "hunter2"),
            "jS7jVUx1LnfPb3rGuHW+pnkHDqzz00M02ZgqhypCQXw="
        );
    }

    #[test]
    fn test_distinct_usernames_change_hash() {
        assert_ne!(
            password_hash("alice", "secret"),
            password_hash("bob", "secret")
        );
    }
}
