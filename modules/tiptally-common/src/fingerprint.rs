use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 digest of normalized image bytes, hex-encoded.
///
/// The sole cache key: filenames and timestamps never participate, so two
/// uploads of the same photo under different names collapse to one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_bytes_produce_identical_fingerprints() {
        let a = ContentFingerprint::of(b"receipt bytes");
        let b = ContentFingerprint::of(b"receipt bytes");
        assert_eq!(a, b);
    }

    #[test]
    fn different_bytes_produce_different_fingerprints() {
        let a = ContentFingerprint::of(b"receipt bytes");
        let b = ContentFingerprint::of(b"receipt bytez");
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_is_hex_sha256() {
        let fp = ContentFingerprint::of(b"");
        assert_eq!(fp.as_str().len(), 64);
        assert_eq!(
            fp.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
