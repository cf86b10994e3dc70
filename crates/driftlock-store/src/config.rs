// crates/driftlock-store/src/config.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Configuration for the content-addressed store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Root directory of the store.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Maximum accepted blob size in bytes.
    #[serde(default = "default_max_blob_bytes")]
    pub max_blob_bytes: u64,

    /// Blobs untouched for longer than this many days become candidates
    /// for the retention sweep.
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
}

fn default_root() -> PathBuf {
    PathBuf::from(".driftlock/cas")
}

fn default_max_blob_bytes() -> u64 {
    4 * 1024 * 1024
}

fn default_retention_days() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            max_blob_bytes: default_max_blob_bytes(),
            retention_days: default_retention_days(),
        }
    }
}
