// crates/driftlock-cli/src/commands/detect.rs
//
// `driftlock detect` — run one drift detection pass against the
// lockfile snapshot and print the report.
//
// Exit codes: 0 = no drift, 3 = drift detected (with --exit-code or
// --ci), non-zero on fatal engine errors.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use driftlock_core::LockSnapshot;
use driftlock_engine::{CancellationFlag, DetectionConfig, DriftEngine};
use driftlock_rdf::CanonicalDriftProcessor;
use driftlock_resolver::{DriftResolver, ResolverConfig};
use driftlock_store::{ContentStore, StoreConfig};

use crate::output;

/// Arguments for the detect command.
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Lockfile path (overrides the config file).
    #[arg(long)]
    pub lockfile: Option<PathBuf>,

    /// Artifact root (overrides the directory recorded in the lockfile).
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Non-interactive mode for CI pipelines; implies --exit-code.
    #[arg(long)]
    pub ci: bool,

    /// Print per-change hashes and validation details.
    #[arg(long)]
    pub verbose: bool,

    /// Exit with code 3 when drift is detected.
    #[arg(long)]
    pub exit_code: bool,

    /// Also report files absent from the snapshot.
    #[arg(long)]
    pub scan_new: bool,

    /// Print the raw report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Run the detect command.
pub async fn run(
    config_path: Option<&str>,
    args: &DetectArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path);
    if let Some(lockfile) = &args.lockfile {
        config.lockfile_path = lockfile.clone();
    }
    if let Some(dir) = &args.dir {
        config.directory = Some(dir.clone());
    }
    if args.scan_new {
        config.scan_new = true;
    }

    // The artifact root decides where snapshot-time state lives.
    let root = match &config.directory {
        Some(dir) => dir.clone(),
        None => PathBuf::from(LockSnapshot::load(&config.lockfile_path)?.directory),
    };
    let state_dir = root.join(".driftlock");

    let processor = if config.generate_drift_uris {
        let store = ContentStore::open(StoreConfig {
            root: state_dir.join("cas"),
            ..StoreConfig::default()
        })?;
        let resolver = DriftResolver::new(store, ResolverConfig::default());
        CanonicalDriftProcessor::with_resolver(Arc::new(resolver))
    } else {
        CanonicalDriftProcessor::new()
    };

    let mut engine = DriftEngine::new(config).with_rdf_processor(Arc::new(processor));
    if state_dir.join("baselines").exists() {
        let baselines = ContentStore::open(StoreConfig {
            root: state_dir.join("baselines"),
            ..StoreConfig::default()
        })?;
        engine = engine.with_baseline_store(baselines);
    }
    if args.verbose && !args.json {
        engine = engine.with_observer(Arc::new(output::ProgressObserver));
    }

    // Ctrl-C cancels between files; a partial report still prints.
    let cancel = CancellationFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_flag.cancel();
        }
    });

    let report = engine.detect_drift(&cancel).await?;

    if args.json {
        println!("{}", output::format_json(&report));
    } else {
        output::render_report(&report, args.verbose);
    }

    if (args.exit_code || args.ci) && report.has_drift() {
        std::process::exit(3);
    }
    Ok(())
}

/// Load the detection config, falling back to defaults when no file is
/// given or the file cannot be read.
fn load_config(path: Option<&str>) -> DetectionConfig {
    let Some(path) = path else {
        return DetectionConfig::default();
    };
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", path);
                config
            }
            Err(e) => {
                tracing::warn!("Invalid config {}: {}. Using defaults.", path, e);
                DetectionConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!("Could not read config {}: {}. Using defaults.", path, e);
            DetectionConfig::default()
        }
    }
}
