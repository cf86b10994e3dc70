// crates/driftlock-store/src/cas.rs
//
// Filesystem content-addressed store.
//
// Layout on disk:
//   - `{root}/blobs/{id[0..2]}/{id}` -> blob bytes (id = SHA-256 hex)
//   - `{root}/tmp/` -> staging area for atomic writes
//
// Writes stage into a temp file and rename into place, so a concurrent
// or interrupted writer never leaves a readable half-written blob.
// Identical bytes always map to the same ID, which makes concurrent
// writes of the same content idempotent.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use driftlock_core::hashing::{hash_hex, is_hex_digest};
use driftlock_core::DriftlockError;

use crate::config::StoreConfig;

/// Occupancy snapshot of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreOccupancy {
    pub blobs: usize,
    pub bytes: u64,
}

/// Content-addressed blob store rooted at a directory.
#[derive(Debug)]
pub struct ContentStore {
    config: StoreConfig,
    blobs_dir: PathBuf,
    tmp_dir: PathBuf,
}

impl ContentStore {
    /// Open (and if needed create) a store rooted at `config.root`.
    pub fn open(config: StoreConfig) -> Result<Self, DriftlockError> {
        let blobs_dir = config.root.join("blobs");
        let tmp_dir = config.root.join("tmp");
        fs::create_dir_all(&blobs_dir).map_err(|e| {
            DriftlockError::Storage(format!("Cannot create {}: {}", blobs_dir.display(), e))
        })?;
        fs::create_dir_all(&tmp_dir).map_err(|e| {
            DriftlockError::Storage(format!("Cannot create {}: {}", tmp_dir.display(), e))
        })?;
        Ok(Self {
            config,
            blobs_dir,
            tmp_dir,
        })
    }

    /// Path of the blob for a content ID: `blobs/{id[0..2]}/{id}`.
    fn blob_path(&self, id: &str) -> PathBuf {
        self.blobs_dir.join(&id[..2]).join(id)
    }

    /// Store bytes, returning their content ID.
    ///
    /// Rejects blobs larger than the configured maximum before hashing.
    /// Writing bytes that are already present is a no-op returning the
    /// same ID.
    pub fn put(&self, bytes: &[u8]) -> Result<String, DriftlockError> {
        if bytes.len() as u64 > self.config.max_blob_bytes {
            return Err(DriftlockError::Storage(format!(
                "Blob of {} bytes exceeds the {} byte limit",
                bytes.len(),
                self.config.max_blob_bytes
            )));
        }

        let id = hash_hex(bytes);
        let path = self.blob_path(&id);
        if path.exists() {
            debug!(content_id = %id, "blob already present, skipping write");
            return Ok(id);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DriftlockError::Storage(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }

        // Stage into tmp/ and rename into place. Rename within one
        // filesystem is atomic, and a duplicate rename of equal bytes is
        // harmless.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.tmp_dir)
            .map_err(|e| DriftlockError::Storage(format!("Cannot create temp file: {}", e)))?;
        std::io::Write::write_all(&mut tmp, bytes)
            .map_err(|e| DriftlockError::Storage(format!("Cannot write temp file: {}", e)))?;
        tmp.persist(&path).map_err(|e| {
            DriftlockError::Storage(format!("Cannot persist blob {}: {}", path.display(), e))
        })?;

        debug!(content_id = %id, size = bytes.len(), "blob stored");
        Ok(id)
    }

    /// Retrieve the bytes for a content ID.
    ///
    /// Re-hashes on read: a blob whose content no longer matches its
    /// filename-derived ID is corruption and surfaces as an integrity
    /// error, never as silently wrong data.
    pub fn get(&self, id: &str) -> Result<Vec<u8>, DriftlockError> {
        if !is_hex_digest(id) {
            return Err(DriftlockError::NotFound(format!(
                "'{}' is not a valid content ID",
                id
            )));
        }
        let path = self.blob_path(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DriftlockError::NotFound(format!("No blob for {}", id)));
            }
            Err(e) => {
                return Err(DriftlockError::Storage(format!(
                    "Cannot read blob {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        let actual = hash_hex(&bytes);
        if actual != id {
            return Err(DriftlockError::Integrity(format!(
                "Blob {} is corrupt: content hashes to {}",
                id, actual
            )));
        }
        Ok(bytes)
    }

    /// Whether a blob with this ID is present.
    pub fn contains(&self, id: &str) -> bool {
        is_hex_digest(id) && self.blob_path(id).exists()
    }

    /// Evict blobs older than the retention window.
    ///
    /// Eviction is advisory: IDs in `pinned` (blobs still referenced by
    /// unexpired reports) are never removed. Returns the number of blobs
    /// deleted. Unreadable entries are skipped with a warning rather than
    /// failing the sweep.
    pub fn evict_expired(&self, pinned: &HashSet<String>) -> Result<usize, DriftlockError> {
        let cutoff = SystemTime::now()
            - std::time::Duration::from_secs(self.config.retention_days * 24 * 60 * 60);
        let mut evicted = 0;
        for (id, path, meta) in self.iter_blobs()? {
            if pinned.contains(&id) {
                continue;
            }
            let modified = match meta.modified() {
                Ok(m) => m,
                Err(e) => {
                    warn!(content_id = %id, "cannot read blob mtime: {}", e);
                    continue;
                }
            };
            if modified < cutoff {
                match fs::remove_file(&path) {
                    Ok(()) => evicted += 1,
                    Err(e) => warn!(content_id = %id, "cannot evict blob: {}", e),
                }
            }
        }
        if evicted > 0 {
            debug!(evicted, "retention sweep complete");
        }
        Ok(evicted)
    }

    /// Count blobs and total bytes currently stored.
    pub fn occupancy(&self) -> Result<StoreOccupancy, DriftlockError> {
        let mut occupancy = StoreOccupancy::default();
        for (_, _, meta) in self.iter_blobs()? {
            occupancy.blobs += 1;
            occupancy.bytes += meta.len();
        }
        Ok(occupancy)
    }

    /// Iterate `(id, path, metadata)` for every blob in the store.
    fn iter_blobs(
        &self,
    ) -> Result<Vec<(String, PathBuf, fs::Metadata)>, DriftlockError> {
        let mut blobs = Vec::new();
        let shards = fs::read_dir(&self.blobs_dir).map_err(|e| {
            DriftlockError::Storage(format!("Cannot read {}: {}", self.blobs_dir.display(), e))
        })?;
        for shard in shards {
            let shard = shard.map_err(|e| DriftlockError::Storage(e.to_string()))?;
            if !shard.path().is_dir() {
                continue;
            }
            let entries = fs::read_dir(shard.path())
                .map_err(|e| DriftlockError::Storage(e.to_string()))?;
            for entry in entries {
                let entry = entry.map_err(|e| DriftlockError::Storage(e.to_string()))?;
                let name = entry.file_name().to_string_lossy().to_string();
                if !is_hex_digest(&name) {
                    continue;
                }
                let meta = entry
                    .metadata()
                    .map_err(|e| DriftlockError::Storage(e.to_string()))?;
                blobs.push((name, entry.path(), meta));
            }
        }
        Ok(blobs)
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.config.root
    }
}
