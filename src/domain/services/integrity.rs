//! Post-write content integrity hashing.
//!
//! Recovery is best-effort by nature — a fragmented or partially-overwritten
//! run list can still produce a file that writes successfully but doesn't
//! match what was originally on disk. A SHA-256 digest of the recovered
//! bytes gives the operator something to diff against a known-good copy or
//! to log as a chain-of-custody record, without the core needing an opinion
//! about what they do with it.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `content`.
pub fn content_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_known_sha256() {
        assert_eq!(
            content_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn digest_is_deterministic() {
        let a = content_digest(b"hello world");
        let b = content_digest(b"hello world");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn differing_content_yields_differing_digest() {
        assert_ne!(content_digest(b"a"), content_digest(b"b"));
    }
}
