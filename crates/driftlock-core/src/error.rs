// crates/driftlock-core/src/error.rs

use thiserror::Error;

/// Workspace-wide error types for Driftlock.
///
/// The variants mirror the failure classes of the drift pipeline:
/// configuration problems are fatal for a run, storage and integrity
/// problems are fatal for one operation, validation problems degrade a
/// single file's result, and not-found surfaces unresolvable `drift://`
/// lookups.
#[derive(Debug, Error)]
pub enum DriftlockError {
    /// Missing or corrupt configuration input (lockfile, shapes path).
    #[error("Config error: {0}")]
    Config(String),

    /// Content-addressed store read/write failure or oversized blob.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Stale patch, corrupt blob, or broken attestation hash chain.
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// SHACL or RDF parse failure for a single file.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unresolvable `drift://` URI or missing blob.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Underlying filesystem I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for DriftlockError {
    fn from(e: serde_json::Error) -> Self {
        DriftlockError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for DriftlockError {
    fn from(e: std::io::Error) -> Self {
        DriftlockError::Io(e.to_string())
    }
}
