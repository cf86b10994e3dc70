// crates/driftlock-engine/src/config.rs
//
// Runtime configuration for the drift detection engine. Loaded from a
// TOML file by the CLI or populated with defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Configuration for one detection engine instance.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Path of the JSON lockfile to detect against.
    #[serde(default = "default_lockfile_path")]
    pub lockfile_path: PathBuf,

    /// Override for the artifact root; defaults to the directory
    /// recorded in the lockfile.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Also walk the tree for files absent from the snapshot.
    #[serde(default)]
    pub scan_new: bool,

    /// Include globs for the untracked scan; empty means everything.
    #[serde(default)]
    pub include: Vec<String>,

    /// Ignore globs for the untracked scan. The lockfile, attestation
    /// sidecars, and the `.driftlock` state directory are always ignored.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Run the SHACL collaborator on modified shape-bearing files.
    #[serde(default = "default_true")]
    pub validate_shacl: bool,

    /// Shapes file handed to the SHACL collaborator.
    #[serde(default)]
    pub shapes_path: Option<String>,

    /// Run canonical drift analysis on modified RDF files.
    #[serde(default = "default_true")]
    pub analyze_rdf: bool,

    /// Store triple-level patches and attach drift:// URIs to results.
    #[serde(default)]
    pub generate_drift_uris: bool,

    /// Extensions treated as RDF/shape-bearing content. Only Turtle and
    /// N-Triples/N-Quads serializations are parseable, so RDF/XML
    /// extensions do not belong here.
    #[serde(default = "default_rdf_extensions")]
    pub rdf_extensions: Vec<String>,

    /// Bounded worker pool size for hashing and validation.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-file timeout for the SHACL collaborator, in seconds.
    #[serde(default = "default_shacl_timeout_secs")]
    pub shacl_timeout_secs: u64,

    /// Engine-scoped baseline cache: maximum entries.
    #[serde(default = "default_cache_capacity")]
    pub baseline_cache_capacity: usize,

    /// Engine-scoped baseline cache: entry time-to-live in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub baseline_cache_ttl_secs: u64,
}

fn default_lockfile_path() -> PathBuf {
    PathBuf::from("driftlock.json")
}

fn default_true() -> bool {
    true
}

fn default_rdf_extensions() -> Vec<String> {
    vec!["ttl".to_string(), "nt".to_string(), "nq".to_string()]
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_shacl_timeout_secs() -> u64 {
    30
}

fn default_cache_capacity() -> usize {
    256
}

fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            lockfile_path: default_lockfile_path(),
            directory: None,
            scan_new: false,
            include: Vec::new(),
            ignore: Vec::new(),
            validate_shacl: default_true(),
            shapes_path: None,
            analyze_rdf: default_true(),
            generate_drift_uris: false,
            rdf_extensions: default_rdf_extensions(),
            workers: default_workers(),
            shacl_timeout_secs: default_shacl_timeout_secs(),
            baseline_cache_capacity: default_cache_capacity(),
            baseline_cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl DetectionConfig {
    /// Whether a relative path counts as RDF/shape-bearing content.
    pub fn is_rdf_path(&self, path: &str) -> bool {
        std::path::Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.rdf_extensions.iter().any(|known| known == ext))
            .unwrap_or(false)
    }
}
