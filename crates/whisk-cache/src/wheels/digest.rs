//! Content digests for cached artifacts using Blake3.

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;
use whisk_core::error::WhiskError;

/// A Blake3 digest of a cached artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactDigest {
    bytes: [u8; 32],
}

impl ArtifactDigest {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Convert digest to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Create a digest from a hexadecimal string
    pub fn from_hex(hex_str: &str) -> Result<Self, WhiskError> {
        let decoded = hex::decode(hex_str).map_err(|e| WhiskError::IntegrityFailure {
            package: "digest".to_string(),
            expected: "valid hex string".to_string(),
            actual: format!("invalid hex: {}", e),
        })?;
        if decoded.len() != 32 {
            return Err(WhiskError::IntegrityFailure {
                package: "digest".to_string(),
                expected: "32 bytes".to_string(),
                actual: format!("{} bytes", decoded.len()),
            });
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Ok(Self { bytes })
    }
}

impl fmt::Display for ArtifactDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Compute the Blake3 digest of artifact content
pub fn compute_digest(content: &[u8]) -> ArtifactDigest {
    let mut hasher = Hasher::new();
    hasher.update(content);
    ArtifactDigest::new(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let digest = compute_digest(b"wheel bytes");
        let restored = ArtifactDigest::from_hex(&digest.to_hex()).unwrap();
        assert_eq!(digest, restored);
    }

    #[test]
    fn test_invalid_hex() {
        assert!(ArtifactDigest::from_hex("zzzz").is_err());
        assert!(ArtifactDigest::from_hex("abcd").is_err()); // wrong length
    }

    #[test]
    fn test_digest_distinguishes_content() {
        let a = compute_digest(b"content a");
        let b = compute_digest(b"content b");
        assert_ne!(a, b);
        assert_eq!(a, compute_digest(b"content a"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use proptest::test_runner::Config as ProptestConfig;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10))]
        #[test]
        fn digest_determinism_property(content in prop::collection::vec(any::<u8>(), 0..1000)) {
            let digest1 = compute_digest(&content);
            let digest2 = compute_digest(&content);
            prop_assert_eq!(digest1, digest2);

            let hex = digest1.to_hex();
            let restored = ArtifactDigest::from_hex(&hex).unwrap();
            prop_assert_eq!(digest1, restored);
        }
    }
}
