//! File hashing utilities for integrity verification.

use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{PersistenceError, Result};

/// Lowercase hex SHA-256 of a file's bytes.
pub fn checksum(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| PersistenceError::io("read", path, e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| PersistenceError::io("read", path, e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Verify that a file's digest matches the expected value.
///
/// Returns `Ok(false)` on mismatch and an error only if the file can't be read.
pub fn verify_checksum(path: &Path, expected: &str) -> Result<bool> {
    Ok(checksum(path)?.eq_ignore_ascii_case(expected))
}
