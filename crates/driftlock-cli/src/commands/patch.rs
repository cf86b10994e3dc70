// crates/driftlock-cli/src/commands/patch.rs
//
// `driftlock patch` — inspect, apply, and maintain stored drift://
// patches directly against a content-addressed patch store.

use std::path::PathBuf;

use clap::Subcommand;

use driftlock_resolver::{DriftResolver, PatchMeta, PatchSource, ResolverConfig};
use driftlock_store::{ContentStore, StoreConfig};

use crate::output::format_json;

/// Patch subcommands.
#[derive(Debug, Subcommand)]
pub enum PatchCmd {
    /// Show a stored patch record.
    Show {
        /// drift:// address of the patch.
        uri: String,
        /// Path of the patch store root.
        #[arg(long, default_value = ".driftlock/cas")]
        store: PathBuf,
    },

    /// Apply a stored patch to a baseline JSON document.
    Apply {
        /// drift:// address of the patch.
        uri: String,
        /// Baseline JSON file the patch applies to.
        baseline: PathBuf,
        /// Write the result here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, default_value = ".driftlock/cas")]
        store: PathBuf,
    },

    /// Diff two JSON documents, store the patch, and print its address.
    Store {
        baseline: PathBuf,
        current: PathBuf,
        #[arg(long, default_value = ".driftlock/cas")]
        store: PathBuf,
    },

    /// Print resolver metrics and store occupancy.
    Metrics {
        #[arg(long, default_value = ".driftlock/cas")]
        store: PathBuf,
    },

    /// Evict patches past the retention period.
    Evict {
        #[arg(long, default_value = ".driftlock/cas")]
        store: PathBuf,
    },
}

/// Run a patch subcommand.
pub fn run(cmd: &PatchCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        PatchCmd::Show { uri, store } => {
            let resolver = open_resolver(store)?;
            let (parsed, record) = resolver.retrieve_patch(uri)?;
            println!("URI:          {}", parsed);
            println!("Significance: {:.2}", record.significance);
            println!("Baseline:     {}", record.baseline_hash);
            println!("Result:       {}", record.result_hash);
            println!("Operations:");
            println!("{}", format_json(&record.patch));
        }
        PatchCmd::Apply {
            uri,
            baseline,
            output,
            store,
        } => {
            let resolver = open_resolver(store)?;
            let text = std::fs::read_to_string(baseline)?;
            let value: serde_json::Value = serde_json::from_str(&text)?;
            let applied = resolver.apply_patch(&value, PatchSource::Uri(uri))?;
            let rendered = format_json(&applied.result);
            match output {
                Some(path) => {
                    std::fs::write(path, rendered)?;
                    println!("Wrote {} (result hash {})", path.display(), applied.result_hash);
                }
                None => println!("{}", rendered),
            }
        }
        PatchCmd::Store {
            baseline,
            current,
            store,
        } => {
            let resolver = open_resolver(store)?;
            let a: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(baseline)?)?;
            let b: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(current)?)?;
            let outcome = resolver.store_patch(&a, &b, &PatchMeta::default())?;
            match outcome.uri {
                Some(uri) => println!("{}", uri),
                None if outcome.byte_identical => println!("Inputs are identical; nothing stored."),
                None => println!("Inputs are canonically equivalent; nothing stored."),
            }
        }
        PatchCmd::Metrics { store } => {
            let resolver = open_resolver(store)?;
            let (snapshot, occupancy) = resolver.metrics()?;
            println!("Patches stored:    {}", snapshot.patches_stored);
            println!("Patches retrieved: {}", snapshot.patches_retrieved);
            println!(
                "Avg retrieval:     {:.2} ms",
                snapshot.avg_retrieval_latency_ms
            );
            println!("Store blobs:       {}", occupancy.blobs);
            println!("Store bytes:       {}", occupancy.bytes);
        }
        PatchCmd::Evict { store } => {
            let resolver = open_resolver(store)?;
            let removed = resolver.evict_expired()?;
            println!("Evicted {} blob(s)", removed);
        }
    }
    Ok(())
}

fn open_resolver(root: &PathBuf) -> Result<DriftResolver, Box<dyn std::error::Error>> {
    let store = ContentStore::open(StoreConfig {
        root: root.clone(),
        ..StoreConfig::default()
    })?;
    Ok(DriftResolver::new(store, ResolverConfig::default()))
}
