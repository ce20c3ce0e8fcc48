//! Cryptographic utilities for OTP code hashing.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input and returns it as a hex string.
///
/// Used to store OTP codes at rest; the plain code never touches the
/// database.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-shape comparison of a plain OTP code against a stored hash.
pub fn otp_matches(code: &str, stored_hash: &str) -> bool {
    sha256_hex(code) == stored_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_empty_string() {
        let hash = sha256_hex("");
        assert_eq!(hash.len(), 64);
        // SHA256 of empty string
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_hex_deterministic() {
        let hash1 = sha256_hex("483920");
        let hash2 = sha256_hex("483920");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_sha256_hex_different_inputs() {
        let hash1 = sha256_hex("123456");
        let hash2 = sha256_hex("123457");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_otp_matches() {
        let stored = sha256_hex("837261");
        assert!(otp_matches("837261", &stored));
        assert!(!otp_matches("837262", &stored));
        assert!(!otp_matches("", &stored));
    }

    #[test]
    fn test_otp_matches_leading_zeros() {
        // Codes are compared as strings, so leading zeros matter
        let stored = sha256_hex("012345");
        assert!(otp_matches("012345", &stored));
        assert!(!otp_matches("12345", &stored));
    }
}
