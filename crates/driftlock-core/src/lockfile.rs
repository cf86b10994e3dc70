// crates/driftlock-core/src/lockfile.rs
//
// Lockfile snapshot: the recorded expected state of a generated artifact
// directory. One `LockEntry` per tracked file, keyed by the path relative
// to the snapshot root. The detection engine treats a loaded snapshot as
// read-only; only `record` ever produces a new one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DriftlockError;
use crate::hashing::hash_file;

/// Current lockfile schema version.
pub const LOCKFILE_VERSION: u32 = 1;

/// Expected state of one tracked file at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    /// SHA-256 of the file's exact bytes at snapshot time, lowercase hex.
    pub hash: String,
    /// Byte size at snapshot time.
    pub size: u64,
    /// Last-modified timestamp at snapshot time.
    pub modified: DateTime<Utc>,
}

/// Recorded expected state of a directory of generated artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockSnapshot {
    /// Lockfile schema version.
    pub version: u32,
    /// When the snapshot was recorded.
    pub timestamp: DateTime<Utc>,
    /// Root directory the relative paths are resolved against.
    pub directory: String,
    /// Tracked files keyed by relative path. BTreeMap keeps the on-disk
    /// JSON and all iteration order path-sorted.
    pub files: BTreeMap<String, LockEntry>,
}

impl LockSnapshot {
    /// Load a snapshot from a JSON lockfile.
    ///
    /// A missing or unparseable lockfile is a `Config` error: detection
    /// cannot run without a baseline.
    pub fn load(path: &Path) -> Result<Self, DriftlockError> {
        let text = fs::read_to_string(path).map_err(|e| {
            DriftlockError::Config(format!("Cannot read lockfile {}: {}", path.display(), e))
        })?;
        let snapshot: LockSnapshot = serde_json::from_str(&text).map_err(|e| {
            DriftlockError::Config(format!("Corrupt lockfile {}: {}", path.display(), e))
        })?;
        if snapshot.version != LOCKFILE_VERSION {
            return Err(DriftlockError::Config(format!(
                "Unsupported lockfile version {} in {} (expected {})",
                snapshot.version,
                path.display(),
                LOCKFILE_VERSION
            )));
        }
        Ok(snapshot)
    }

    /// Save the snapshot as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), DriftlockError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| {
            DriftlockError::Io(format!("Cannot write lockfile {}: {}", path.display(), e))
        })
    }

    /// Record a fresh snapshot of `directory`, hashing every file for
    /// which `track` returns true. Paths are stored relative to
    /// `directory` with forward slashes.
    pub fn record<F>(directory: &Path, track: F) -> Result<Self, DriftlockError>
    where
        F: Fn(&Path) -> bool,
    {
        let mut files = BTreeMap::new();
        record_dir(directory, directory, &track, &mut files)?;
        Ok(LockSnapshot {
            version: LOCKFILE_VERSION,
            timestamp: Utc::now(),
            directory: directory.to_string_lossy().to_string(),
            files,
        })
    }

    /// Resolve a tracked relative path against the snapshot root.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        Path::new(&self.directory).join(relative)
    }
}

fn record_dir<F>(
    root: &Path,
    dir: &Path,
    track: &F,
    files: &mut BTreeMap<String, LockEntry>,
) -> Result<(), DriftlockError>
where
    F: Fn(&Path) -> bool,
{
    let entries = fs::read_dir(dir)
        .map_err(|e| DriftlockError::Io(format!("Cannot read {}: {}", dir.display(), e)))?;
    for entry in entries {
        let entry = entry.map_err(|e| DriftlockError::Io(e.to_string()))?;
        let path = entry.path();
        if path.is_dir() {
            record_dir(root, &path, track, files)?;
        } else if track(&path) {
            let meta = entry.metadata().map_err(|e| DriftlockError::Io(e.to_string()))?;
            let modified: DateTime<Utc> = meta
                .modified()
                .map(DateTime::from)
                .unwrap_or_else(|_| Utc::now());
            let relative = path
                .strip_prefix(root)
                .map_err(|e| DriftlockError::Io(e.to_string()))?
                .to_string_lossy()
                .replace('\\', "/");
            files.insert(
                relative,
                LockEntry {
                    hash: hash_file(&path)?,
                    size: meta.len(),
                    modified,
                },
            );
        }
    }
    Ok(())
}
