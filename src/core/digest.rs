//! Content fingerprints for change detection.
//!
//! Digests are only compared for equality; SHA-256 keeps accidental
//! collisions out of the picture.

use std::io::ErrorKind;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::Result;

/// Hex-encoded SHA-256 of `bytes`
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Digest of the file at `path`, or `None` if there is no such file
pub fn digest(path: &Path) -> Result<Option<String>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(hash_bytes(&bytes))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_identical_content_same_digest() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.json");
        let b = temp.path().join("b.json");
        std::fs::write(&a, br#"{"dashboard":{}}"#).unwrap();
        std::fs::write(&b, br#"{"dashboard":{}}"#).unwrap();

        assert_eq!(digest(&a).unwrap(), digest(&b).unwrap());
    }

    #[test]
    fn test_different_content_different_digest() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.json");
        let b = temp.path().join("b.json");
        std::fs::write(&a, b"{\"title\":\"one\"}").unwrap();
        std::fs::write(&b, b"{\"title\":\"two\"}").unwrap();

        assert_ne!(digest(&a).unwrap(), digest(&b).unwrap());
    }

    #[test]
    fn test_missing_file_is_absent_not_empty() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.json");
        let empty = temp.path().join("empty.json");
        std::fs::write(&empty, b"").unwrap();

        assert_eq!(digest(&missing).unwrap(), None);
        assert_eq!(digest(&empty).unwrap(), Some(hash_bytes(b"")));
    }

    #[test]
    fn test_hash_format() {
        let hash = hash_bytes(b"dashboard");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
