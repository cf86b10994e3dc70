// crates/driftlock-engine/src/walk.rs
//
// Untracked-file scan: walk the artifact tree and report files absent
// from the snapshot, honoring include/ignore glob patterns. Driftlock's
// own state (the lockfile, baseline store, attestation sidecars) is
// always ignored.

use std::collections::BTreeMap;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;
use walkdir::WalkDir;

use driftlock_core::{DriftlockError, LockEntry};

/// Globs that are never reported as drift.
const BUILTIN_IGNORES: &[&str] = &["**/.driftlock/**", "**/*.attest.json", "**/driftlock.json"];

fn build_globset(patterns: &[String], builtin: &[&str]) -> Result<GlobSet, DriftlockError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.iter().map(String::as_str).chain(builtin.iter().copied()) {
        let glob = Glob::new(pattern).map_err(|e| {
            DriftlockError::Config(format!("Invalid glob pattern '{}': {}", pattern, e))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| DriftlockError::Config(format!("Cannot build glob set: {}", e)))
}

/// Find files under `root` that the snapshot does not track.
///
/// Returns relative paths with forward slashes, sorted.
pub fn scan_untracked(
    root: &Path,
    tracked: &BTreeMap<String, LockEntry>,
    include: &[String],
    ignore: &[String],
) -> Result<Vec<String>, DriftlockError> {
    let include_set = build_globset(include, &[])?;
    let ignore_set = build_globset(ignore, BUILTIN_IGNORES)?;

    let mut untracked = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        // An unreadable entry degrades to a skip; tracked-path results
        // collected elsewhere in the run must survive a bad subtree.
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry during scan: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(root) {
            Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
            Err(_) => continue,
        };
        if tracked.contains_key(&relative) {
            continue;
        }
        if ignore_set.is_match(&relative) {
            continue;
        }
        if !include.is_empty() && !include_set.is_match(&relative) {
            continue;
        }
        untracked.push(relative);
    }
    untracked.sort();
    Ok(untracked)
}
