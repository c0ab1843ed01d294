#![deny(unsafe_code)]

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::StandardsError;

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// True when `value` looks like a SHA-256 pin (64 hex characters).
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// Read `path` and return its bytes together with their SHA-256.
pub(crate) fn read_with_sha256(path: &Path) -> Result<(Vec<u8>, String), StandardsError> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StandardsError::MissingFile {
                path: path.to_path_buf(),
            }
        } else {
            StandardsError::io(path, e)
        }
    })?;
    let sha = sha256_hex(&bytes);
    Ok((bytes, sha))
}
