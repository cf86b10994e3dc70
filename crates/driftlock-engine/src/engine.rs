// crates/driftlock-engine/src/engine.rs
//
// The drift detection engine. One `detect_drift` call loads the lockfile
// snapshot, fans tracked paths out over a bounded worker pool (hashing,
// SHACL validation, canonical RDF analysis, attestation verification),
// optionally scans for untracked files, and folds everything into a
// path-sorted, immutable report.
//
// Failure semantics: one file's hashing or validation failure degrades
// that file's result and never aborts the run. Only a missing or corrupt
// lockfile is fatal. Cancellation between files returns a partial report
// marked incomplete.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use driftlock_core::{
    Attestation, AttestationCounts, ChangeType, ChangeValidation, DriftChange, DriftReport,
    DriftlockError, LockEntry, LockSnapshot, RegenRequirement, SemanticSummary, Severity,
    ShaclValidator,
};
use driftlock_rdf::{CanonicalDriftProcessor, DriftOptions, RdfFormat};
use driftlock_store::ContentStore;

use crate::cache::BaselineCache;
use crate::config::DetectionConfig;
use crate::observer::{CancellationFlag, DriftObserver, NullObserver, PathState};
use crate::summary::{recommend, summarize};
use crate::walk::scan_untracked;

/// Semantic significance at or above which a modification is high risk.
const SEMANTIC_HIGH_THRESHOLD: f64 = 0.3;

/// Terminal detection state of one tracked path.
#[derive(Debug)]
enum PathOutcome {
    Unchanged,
    Deleted,
    Modified {
        actual_hash: String,
        validation: Option<ChangeValidation>,
    },
    /// Hashing or reading failed; the result is degraded, not fatal.
    Degraded { reason: String },
    /// The run was cancelled before this path was processed.
    Skipped,
}

/// Attestation sidecar verdict for one path.
#[derive(Debug)]
enum AttestationStatus {
    Missing,
    Valid { requirements: Vec<RegenRequirement> },
    Invalid,
}

struct PathResult {
    outcome: PathOutcome,
    attestation: AttestationStatus,
}

/// Drift detection engine. Stateless across runs: every `detect_drift`
/// call re-reads the lockfile and walks the tree fresh.
pub struct DriftEngine {
    config: Arc<DetectionConfig>,
    shacl: Option<Arc<dyn ShaclValidator>>,
    rdf: Option<Arc<CanonicalDriftProcessor>>,
    baselines: Arc<BaselineCache>,
    observer: Arc<dyn DriftObserver>,
}

impl DriftEngine {
    pub fn new(config: DetectionConfig) -> Self {
        let baselines = Arc::new(BaselineCache::new(
            None,
            config.baseline_cache_capacity,
            Duration::from_secs(config.baseline_cache_ttl_secs),
        ));
        Self {
            config: Arc::new(config),
            shacl: None,
            rdf: None,
            baselines,
            observer: Arc::new(NullObserver),
        }
    }

    /// Attach the external SHACL collaborator.
    pub fn with_shacl_validator(mut self, validator: Arc<dyn ShaclValidator>) -> Self {
        self.shacl = Some(validator);
        self
    }

    /// Attach the RDF canonical drift processor.
    pub fn with_rdf_processor(mut self, processor: Arc<CanonicalDriftProcessor>) -> Self {
        self.rdf = Some(processor);
        self
    }

    /// Attach the baseline blob store recorded at snapshot time.
    pub fn with_baseline_store(mut self, store: ContentStore) -> Self {
        self.baselines = Arc::new(BaselineCache::new(
            Some(store),
            self.config.baseline_cache_capacity,
            Duration::from_secs(self.config.baseline_cache_ttl_secs),
        ));
        self
    }

    /// Attach a progress observer.
    pub fn with_observer(mut self, observer: Arc<dyn DriftObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run one detection pass against the lockfile snapshot.
    pub async fn detect_drift(
        &self,
        cancel: &CancellationFlag,
    ) -> Result<DriftReport, DriftlockError> {
        let snapshot = LockSnapshot::load(&self.config.lockfile_path)?;
        let root = self
            .config
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(&snapshot.directory));
        info!(
            lockfile = %self.config.lockfile_path.display(),
            tracked = snapshot.files.len(),
            "drift detection started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut tasks: JoinSet<(String, PathResult)> = JoinSet::new();
        let mut incomplete = false;

        for (relative, entry) in snapshot.files.clone() {
            if cancel.is_cancelled() {
                incomplete = true;
                break;
            }
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            let config = self.config.clone();
            let shacl = self.shacl.clone();
            let rdf = self.rdf.clone();
            let baselines = self.baselines.clone();
            let root = root.clone();
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            relative,
                            PathResult {
                                outcome: PathOutcome::Degraded {
                                    reason: "worker pool closed".to_string(),
                                },
                                attestation: AttestationStatus::Missing,
                            },
                        );
                    }
                };
                if cancel.is_cancelled() {
                    return (
                        relative,
                        PathResult {
                            outcome: PathOutcome::Skipped,
                            attestation: AttestationStatus::Missing,
                        },
                    );
                }
                let result =
                    process_path(&config, &root, &relative, &entry, shacl, rdf, baselines).await;
                (relative, result)
            });
        }

        // Buffer results, then sort by path: the report order stays
        // deterministic regardless of completion order.
        let mut results: Vec<(String, PathResult)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((path, result)) => {
                    self.observer
                        .on_file_processed(&path, progress_state(&result.outcome));
                    results.push((path, result));
                }
                Err(e) => {
                    warn!("detection worker panicked: {}", e);
                    incomplete = true;
                }
            }
        }
        results.sort_by(|a, b| a.0.cmp(&b.0));

        let mut report = self.assemble(&snapshot, results, incomplete)?;

        if self.config.scan_new && !cancel.is_cancelled() {
            let untracked = scan_untracked(
                &root,
                &snapshot.files,
                &self.config.include,
                &self.config.ignore,
            )?;
            for path in untracked {
                self.observer.on_file_processed(&path, PathState::Added);
                report.added += 1;
                report.total += 1;
                report.changes.push(DriftChange {
                    change_type: ChangeType::Added,
                    path,
                    expected_hash: None,
                    actual_hash: None,
                    severity: Severity::Low,
                    validation: None,
                    can_regenerate: false,
                    regeneration_requirements: Vec::new(),
                });
            }
            report.changes.sort_by(|a, b| a.path.cmp(&b.path));
            // Added files shift the aggregate; recompute.
            report.summary = summarize(
                &report.changes,
                &report.attestations,
                self.validation_enabled(),
            );
            report.recommendations = recommend(&report.changes, &report.attestations);
        }

        info!(
            drift_score = report.summary.drift_score,
            risk = ?report.summary.risk_level,
            changes = report.changes.len(),
            incomplete = report.incomplete,
            "drift detection finished"
        );
        self.observer.on_complete(&report);
        Ok(report)
    }

    fn validation_enabled(&self) -> bool {
        self.config.validate_shacl && self.shacl.is_some()
    }

    fn assemble(
        &self,
        snapshot: &LockSnapshot,
        results: Vec<(String, PathResult)>,
        incomplete: bool,
    ) -> Result<DriftReport, DriftlockError> {
        let mut attestations = AttestationCounts::default();
        let mut changes = Vec::new();
        let mut unchanged = 0;
        let mut modified = 0;
        let mut deleted = 0;
        let mut skipped = 0;

        for (path, result) in results {
            match &result.attestation {
                AttestationStatus::Missing => attestations.missing += 1,
                AttestationStatus::Valid { .. } => attestations.valid += 1,
                AttestationStatus::Invalid => attestations.invalid += 1,
            }
            let (can_regenerate, requirements) = match result.attestation {
                AttestationStatus::Valid { requirements } => {
                    (requirements.is_empty(), requirements)
                }
                AttestationStatus::Missing | AttestationStatus::Invalid => {
                    (false, vec![RegenRequirement::Attestation])
                }
            };
            let expected_hash = snapshot.files.get(&path).map(|e| e.hash.clone());

            match result.outcome {
                PathOutcome::Unchanged => unchanged += 1,
                PathOutcome::Skipped => skipped += 1,
                PathOutcome::Deleted => {
                    deleted += 1;
                    changes.push(DriftChange {
                        change_type: ChangeType::Deleted,
                        path,
                        expected_hash,
                        actual_hash: None,
                        severity: Severity::Critical,
                        validation: None,
                        can_regenerate,
                        regeneration_requirements: requirements,
                    });
                }
                PathOutcome::Modified {
                    actual_hash,
                    validation,
                } => {
                    modified += 1;
                    changes.push(DriftChange {
                        change_type: ChangeType::Modified,
                        path,
                        expected_hash,
                        actual_hash: Some(actual_hash),
                        severity: modified_severity(&validation),
                        validation,
                        can_regenerate,
                        regeneration_requirements: requirements,
                    });
                }
                PathOutcome::Degraded { reason } => {
                    modified += 1;
                    changes.push(DriftChange {
                        change_type: ChangeType::Modified,
                        path,
                        expected_hash,
                        actual_hash: None,
                        severity: Severity::Medium,
                        validation: Some(ChangeValidation {
                            shacl: None,
                            semantic: None,
                            degraded: Some(reason),
                        }),
                        can_regenerate,
                        regeneration_requirements: requirements,
                    });
                }
            }
        }

        let summary = summarize(&changes, &attestations, self.validation_enabled());
        let recommendations = recommend(&changes, &attestations);

        Ok(DriftReport {
            total: snapshot.files.len(),
            unchanged,
            modified,
            deleted,
            added: 0,
            changes,
            summary,
            recommendations,
            attestations,
            incomplete: incomplete || skipped > 0,
        })
    }
}

fn progress_state(outcome: &PathOutcome) -> PathState {
    match outcome {
        PathOutcome::Unchanged | PathOutcome::Skipped => PathState::Unchanged,
        PathOutcome::Deleted => PathState::Deleted,
        PathOutcome::Modified { .. } => PathState::Modified,
        PathOutcome::Degraded { .. } => PathState::Degraded,
    }
}

/// Process one tracked path: hash, compare, validate, check attestation.
async fn process_path(
    config: &DetectionConfig,
    root: &Path,
    relative: &str,
    entry: &LockEntry,
    shacl: Option<Arc<dyn ShaclValidator>>,
    rdf: Option<Arc<CanonicalDriftProcessor>>,
    baselines: Arc<BaselineCache>,
) -> PathResult {
    let absolute = root.join(relative);
    let attestation = check_attestation(&absolute, relative);

    if !absolute.exists() {
        return PathResult {
            outcome: PathOutcome::Deleted,
            attestation,
        };
    }

    let hash_path = absolute.clone();
    let hashed = tokio::task::spawn_blocking(move || driftlock_core::hash_file(&hash_path)).await;
    let actual_hash = match hashed {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => {
            return PathResult {
                outcome: PathOutcome::Degraded {
                    reason: format!("hashing failed: {}", e),
                },
                attestation,
            };
        }
        Err(e) => {
            return PathResult {
                outcome: PathOutcome::Degraded {
                    reason: format!("hashing task failed: {}", e),
                },
                attestation,
            };
        }
    };

    if actual_hash == entry.hash {
        return PathResult {
            outcome: PathOutcome::Unchanged,
            attestation,
        };
    }

    debug!(path = relative, "hash mismatch, validating");
    let validation = if config.is_rdf_path(relative) {
        Some(validate_modified(config, &absolute, entry, shacl, rdf, baselines).await)
    } else {
        None
    };

    PathResult {
        outcome: PathOutcome::Modified {
            actual_hash,
            validation,
        },
        attestation,
    }
}

/// Run SHACL and canonical RDF analysis on a modified shape-bearing
/// file. Failures and timeouts degrade this file's validation instead of
/// propagating.
async fn validate_modified(
    config: &DetectionConfig,
    absolute: &Path,
    entry: &LockEntry,
    shacl: Option<Arc<dyn ShaclValidator>>,
    rdf: Option<Arc<CanonicalDriftProcessor>>,
    baselines: Arc<BaselineCache>,
) -> ChangeValidation {
    let mut validation = ChangeValidation::default();

    let content = match tokio::fs::read_to_string(absolute).await {
        Ok(content) => content,
        Err(e) => {
            validation.degraded = Some(format!("cannot read file: {}", e));
            return validation;
        }
    };

    if config.validate_shacl {
        if let (Some(validator), Some(shapes)) = (&shacl, &config.shapes_path) {
            let timeout = Duration::from_secs(config.shacl_timeout_secs);
            match tokio::time::timeout(timeout, validator.validate(&content, shapes)).await {
                Ok(Ok(result)) => validation.shacl = Some(result),
                Ok(Err(e)) => {
                    validation.degraded = Some(format!("shacl validation failed: {}", e));
                }
                Err(_) => {
                    validation.degraded = Some("validation-timeout".to_string());
                }
            }
        }
    }

    if config.analyze_rdf {
        if let Some(processor) = &rdf {
            match baselines.get(&entry.hash) {
                Some(baseline) => {
                    let format = absolute
                        .extension()
                        .and_then(|e| e.to_str())
                        .map(RdfFormat::from_extension)
                        .unwrap_or_default();
                    let options = DriftOptions {
                        format,
                        generate_drift_uri: config.generate_drift_uris,
                    };
                    match processor.analyze_canonical_drift(&baseline, &content, &options) {
                        Ok(report) => {
                            validation.semantic = Some(SemanticSummary {
                                syntactically_identical: report.syntactically_identical,
                                canonically_equivalent: report.canonically_equivalent,
                                significance: report.significance,
                                changes: report.semantic_changes.len(),
                                drift_uri: report.drift_uri,
                            });
                        }
                        Err(e) => {
                            validation.degraded = Some(format!("semantic analysis failed: {}", e));
                        }
                    }
                }
                None => {
                    debug!(
                        path = %absolute.display(),
                        "baseline content unavailable, skipping semantic analysis"
                    );
                }
            }
        }
    }

    validation
}

/// Load and verify the attestation sidecar for a path.
fn check_attestation(absolute: &Path, relative: &str) -> AttestationStatus {
    match Attestation::load_sidecar(absolute) {
        Ok(None) => AttestationStatus::Missing,
        Ok(Some(attestation)) => match attestation.verify_chain() {
            Ok(()) => AttestationStatus::Valid {
                requirements: attestation.regeneration_requirements(),
            },
            Err(e) => {
                warn!(path = relative, "attestation chain invalid: {}", e);
                AttestationStatus::Invalid
            }
        },
        Err(e) => {
            warn!(path = relative, "attestation unreadable: {}", e);
            AttestationStatus::Invalid
        }
    }
}

/// Severity of a modified file, derived from its validation results.
fn modified_severity(validation: &Option<ChangeValidation>) -> Severity {
    let Some(validation) = validation else {
        return Severity::Medium;
    };
    if validation.degraded.is_some() {
        return Severity::Medium;
    }
    if let Some(shacl) = &validation.shacl {
        if !shacl.conforms {
            return Severity::High;
        }
    }
    if let Some(semantic) = &validation.semantic {
        if semantic.canonically_equivalent {
            // Cosmetic-only edit: formatting or ordering, no meaning change.
            return Severity::Low;
        }
        if semantic.significance >= SEMANTIC_HIGH_THRESHOLD {
            return Severity::High;
        }
    }
    Severity::Medium
}
