// crates/driftlock-cli/src/commands/lock.rs
//
// `driftlock lock` — record a lockfile snapshot of a directory, and
// store baseline content blobs so later detection runs can diff RDF
// files against what was recorded.

use std::path::{Component, Path, PathBuf};

use clap::Args;

use driftlock_core::LockSnapshot;
use driftlock_store::{ContentStore, StoreConfig};

/// Arguments for the lock command.
#[derive(Args, Debug)]
pub struct LockArgs {
    /// Directory to snapshot.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Lockfile path; defaults to `<dir>/driftlock.json`.
    #[arg(long)]
    pub lockfile: Option<PathBuf>,

    /// Skip storing baseline content blobs.
    #[arg(long)]
    pub no_baselines: bool,
}

/// Run the lock command.
pub fn run(args: &LockArgs) -> Result<(), Box<dyn std::error::Error>> {
    let lockfile_path = args
        .lockfile
        .clone()
        .unwrap_or_else(|| args.dir.join("driftlock.json"));

    let snapshot = LockSnapshot::record(&args.dir, is_trackable)?;
    snapshot.save(&lockfile_path)?;
    println!(
        "Recorded {} file(s) into {}",
        snapshot.files.len(),
        lockfile_path.display()
    );

    if args.no_baselines {
        return Ok(());
    }

    let store = ContentStore::open(StoreConfig {
        root: args.dir.join(".driftlock/baselines"),
        ..StoreConfig::default()
    })?;
    let mut stored = 0usize;
    for relative in snapshot.files.keys() {
        let path = args.dir.join(relative);
        let bytes = std::fs::read(&path)?;
        match store.put(&bytes) {
            Ok(_) => stored += 1,
            // Oversized files just lose semantic analysis later.
            Err(e) => tracing::warn!("Baseline for {} not stored: {}", relative, e),
        }
    }
    println!("Stored {} baseline blob(s)", stored);
    Ok(())
}

/// Driftlock's own state never counts as a tracked artifact.
fn is_trackable(path: &Path) -> bool {
    if path
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name == ".driftlock"))
    {
        return false;
    }
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name != "driftlock.json" && !name.ends_with(".attest.json"),
        None => false,
    }
}
