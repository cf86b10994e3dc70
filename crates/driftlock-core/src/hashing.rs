// crates/driftlock-core/src/hashing.rs
//
// SHA-256 helpers used across the workspace. Content IDs, lockfile entry
// hashes, and attestation chains all use the same lowercase-hex encoding
// so that equal bytes always produce identical identifiers.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::DriftlockError;

/// Compute the SHA-256 hash of the given bytes.
///
/// Returns the raw 32-byte digest.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the SHA-256 hash of the given bytes as a lowercase hex string.
pub fn hash_hex(data: &[u8]) -> String {
    hex::encode(hash_bytes(data))
}

/// Compute the SHA-256 hash of a file's contents as a lowercase hex string.
///
/// Streams the file in 64 KiB chunks so large artifacts are not buffered
/// whole in memory.
pub fn hash_file(path: &Path) -> Result<String, DriftlockError> {
    let file = File::open(path)
        .map_err(|e| DriftlockError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| DriftlockError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Check whether a string looks like a lowercase-hex SHA-256 digest.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
}
