//! Hashing helpers for shared-secret comparison.

use sha2::{Digest, Sha256};

/// Compares a presented secret against the expected one by digest.
///
/// Both sides are hashed first so the comparison always runs over 32 bytes
/// regardless of the input lengths.
pub fn secrets_match(presented: &str, expected: &str) -> bool {
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("admin-key", "admin-key"));
        assert!(!secrets_match("admin-key", "admin-kez"));
        assert!(!secrets_match("", "admin-key"));
    }
}
