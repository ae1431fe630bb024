//! Fingerprint calculation
//!
//! A fingerprint is an opaque hex digest. Equality is the only operation
//! defined on it.

use crate::error::{IoResultExt, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Block size used when streaming a file through the hasher
pub const BLOCK_SIZE: usize = 64 * 1024;

/// Digest algorithm used for local fingerprints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintAlgorithm {
    /// MD5, matching single-part S3/OSS ETags
    #[default]
    Md5,
    /// SHA-256
    Sha256,
    /// BLAKE3
    Blake3,
}

impl FingerprintAlgorithm {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha256 => "SHA-256",
            Self::Blake3 => "BLAKE3",
        }
    }
}

/// Content digest as lowercase hex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a hex digest, normalising case
    pub fn new(hex: impl AsRef<str>) -> Self {
        Self(hex.as_ref().trim().to_ascii_lowercase())
    }

    /// Parse a backend ETag (`"abc"`, `W/"abc"`, `ABC`); `None` when empty
    pub fn from_etag(etag: &str) -> Option<Self> {
        let value = etag.trim();
        let value = value.strip_prefix("W/").unwrap_or(value);
        let value = value.trim_matches('"');
        if value.is_empty() {
            None
        } else {
            Some(Self::new(value))
        }
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unified streaming hasher
enum Hasher {
    Md5(md5::Context),
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    fn new(algorithm: FingerprintAlgorithm) -> Self {
        match algorithm {
            FingerprintAlgorithm::Md5 => Self::Md5(md5::Context::new()),
            FingerprintAlgorithm::Sha256 => {
                use sha2::Digest;
                Self::Sha256(sha2::Sha256::new())
            }
            FingerprintAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.consume(data),
            Self::Sha256(h) => {
                use sha2::Digest;
                h.update(data);
            }
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> Fingerprint {
        let hex = match self {
            Self::Md5(h) => format!("{:x}", h.compute()),
            Self::Sha256(h) => {
                use sha2::Digest;
                hex::encode(h.finalize())
            }
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        };
        Fingerprint(hex)
    }
}

/// Compute the fingerprint of a local file
pub fn fingerprint_file(path: &Path, algorithm: FingerprintAlgorithm) -> Result<Fingerprint> {
    let mut file = File::open(path).with_path(path)?;
    let mut hasher = Hasher::new(algorithm);
    let mut buffer = vec![0u8; BLOCK_SIZE];

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(crate::error::BucketSyncError::io(path, e)),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

/// Compute the fingerprint of data in memory
pub fn fingerprint_bytes(data: &[u8], algorithm: FingerprintAlgorithm) -> Fingerprint {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    const ALGORITHMS: [FingerprintAlgorithm; 3] = [
        FingerprintAlgorithm::Md5,
        FingerprintAlgorithm::Sha256,
        FingerprintAlgorithm::Blake3,
    ];

    #[test]
    fn test_known_md5() {
        let fp = fingerprint_bytes(b"hello", FingerprintAlgorithm::Md5);
        assert_eq!(fp.as_str(), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn test_file_matches_memory() {
        let dir = TempDir::new().unwrap();
        // Spans several blocks with a ragged tail
        let content: Vec<u8> = (0..BLOCK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        let path = dir.path().join("big.bin");
        std::fs::write(&path, &content).unwrap();

        for algorithm in ALGORITHMS {
            let from_file = fingerprint_file(&path, algorithm).unwrap();
            assert_eq!(from_file, fingerprint_bytes(&content, algorithm));
        }
    }

    #[test]
    fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        let fp = fingerprint_file(&path, FingerprintAlgorithm::Md5).unwrap();
        assert_eq!(fp.as_str(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_unreadable_path_is_io_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");

        let err = fingerprint_file(&missing, FingerprintAlgorithm::Md5).unwrap_err();
        assert_eq!(err.path(), Some(&missing));
    }

    #[test]
    fn test_from_etag() {
        let expected = Fingerprint::new("5d41402abc4b2a76b9719d911017c592");
        assert_eq!(Fingerprint::from_etag("\"5D41402ABC4B2A76B9719D911017C592\""), Some(expected.clone()));
        assert_eq!(Fingerprint::from_etag("W/\"5d41402abc4b2a76b9719d911017c592\""), Some(expected));
        assert_eq!(Fingerprint::from_etag("\"\""), None);
        assert_eq!(Fingerprint::from_etag(""), None);
    }

    proptest! {
        #[test]
        fn prop_same_content_same_fingerprint(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            for algorithm in ALGORITHMS {
                prop_assert_eq!(fingerprint_bytes(&data, algorithm), fingerprint_bytes(&data.clone(), algorithm));
            }
        }

        #[test]
        fn prop_appended_byte_changes_fingerprint(data in proptest::collection::vec(any::<u8>(), 0..1024), extra in any::<u8>()) {
            let mut changed = data.clone();
            changed.push(extra);
            for algorithm in ALGORITHMS {
                prop_assert_ne!(fingerprint_bytes(&data, algorithm), fingerprint_bytes(&changed, algorithm));
            }
        }
    }
}
