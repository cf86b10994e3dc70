// crates/driftlock-engine/tests/integration_detection.rs
//
// End-to-end detection tests: record a lockfile snapshot over a real
// temporary directory, mutate the tree, and run the engine against it.
//
// The SHACL collaborator is mocked; canonical RDF analysis runs for real
// with baseline content served from a blob store recorded alongside the
// snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use driftlock_core::{
    ArtifactRef, Attestation, ChainEntry, ChangeType, ComplianceStatus, DriftReport,
    DriftlockError, Integrity, LockSnapshot, Provenance, RegenRequirement, RiskLevel, Severity,
    ShaclReport, ShaclValidator,
};
use driftlock_engine::{
    CancellationFlag, DetectionConfig, DriftEngine, DriftObserver, PathState,
};
use driftlock_rdf::CanonicalDriftProcessor;
use driftlock_store::{ContentStore, StoreConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const PEOPLE_TTL: &str = "@prefix ex: <http://example.org/> .\n\
                          @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
                          ex:alice a ex:Person ;\n\
                              rdfs:label \"Alice\" .\n";

const NOTES_TXT: &str = "generated notes\n";

/// SHACL collaborator returning a fixed verdict, counting invocations.
struct FixedShacl {
    conforms: bool,
    calls: AtomicUsize,
}

impl FixedShacl {
    fn new(conforms: bool) -> Arc<Self> {
        Arc::new(Self {
            conforms,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ShaclValidator for FixedShacl {
    async fn validate(
        &self,
        _content: &str,
        _shapes_path: &str,
    ) -> Result<ShaclReport, DriftlockError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ShaclReport {
            conforms: self.conforms,
            violations: if self.conforms { 0 } else { 1 },
            details: if self.conforms {
                Vec::new()
            } else {
                vec!["ex:alice violates ex:PersonShape".to_string()]
            },
        })
    }
}

/// SHACL collaborator that never answers within any sane deadline.
struct StalledShacl;

#[async_trait]
impl ShaclValidator for StalledShacl {
    async fn validate(
        &self,
        _content: &str,
        _shapes_path: &str,
    ) -> Result<ShaclReport, DriftlockError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(ShaclReport {
            conforms: true,
            violations: 0,
            details: Vec::new(),
        })
    }
}

/// Write a sealed attestation sidecar for a tracked artifact. With
/// `tamper` set, one chain link is corrupted after sealing.
fn write_attestation(dir: &TempDir, relative: &str, tamper: bool) {
    let path = dir.path().join(relative);
    let attestation = Attestation {
        artifact: ArtifactRef {
            path: relative.to_string(),
            hash: driftlock_core::hash_file(&path).unwrap(),
            size: fs::metadata(&path).unwrap().len(),
        },
        provenance: Provenance {
            source_snapshot: Some("snapshot-2026-08".to_string()),
            template_path: Some("templates/person.hbs".to_string()),
            template_hash: Some("ab".repeat(32)),
            template_version: Some("1.2.0".to_string()),
            variables: BTreeMap::new(),
            generated_at: chrono::Utc::now(),
            agent: "artifact-gen".to_string(),
        },
        integrity: Integrity {
            hash_algorithm: "sha256".to_string(),
            verification_chain: vec![ChainEntry {
                entry_type: "render".to_string(),
                hash: String::new(),
                version: Some("1.0".to_string()),
                entities: Some(1),
            }],
            previous_hash: None,
            chain_index: 0,
        },
        attestation_hash: String::new(),
    };
    let mut sealed = attestation.seal().unwrap();
    if tamper {
        sealed.integrity.verification_chain[0].hash = "0".repeat(64);
    }
    fs::write(
        Attestation::sidecar_path(&path),
        serde_json::to_string_pretty(&sealed).unwrap(),
    )
    .unwrap();
}

/// Observer recording every per-file event.
#[derive(Default)]
struct RecordingObserver {
    events: std::sync::Mutex<Vec<(String, PathState)>>,
    completed: AtomicUsize,
}

impl DriftObserver for RecordingObserver {
    fn on_file_processed(&self, path: &str, state: PathState) {
        if let Ok(mut events) = self.events.lock() {
            events.push((path.to_string(), state));
        }
    }

    fn on_complete(&self, _report: &DriftReport) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Write the standard two-file tree and record its snapshot + baselines.
fn seed_workspace(dir: &TempDir) -> (DetectionConfig, ContentStore) {
    fs::write(dir.path().join("people.ttl"), PEOPLE_TTL).unwrap();
    fs::write(dir.path().join("notes.txt"), NOTES_TXT).unwrap();

    let snapshot = LockSnapshot::record(dir.path(), |_| true).unwrap();
    let lockfile_path = dir.path().join("driftlock.json");
    snapshot.save(&lockfile_path).unwrap();

    let store = ContentStore::open(StoreConfig {
        root: dir.path().join(".driftlock/baselines"),
        ..StoreConfig::default()
    })
    .unwrap();
    store.put(PEOPLE_TTL.as_bytes()).unwrap();
    store.put(NOTES_TXT.as_bytes()).unwrap();

    let config = DetectionConfig {
        lockfile_path,
        directory: Some(dir.path().to_path_buf()),
        shapes_path: Some("shapes.ttl".to_string()),
        workers: 2,
        ..DetectionConfig::default()
    };
    (config, store)
}

fn engine_with_defaults(config: DetectionConfig, store: ContentStore) -> DriftEngine {
    DriftEngine::new(config)
        .with_rdf_processor(Arc::new(CanonicalDriftProcessor::new()))
        .with_baseline_store(store)
}

fn change_for<'a>(report: &'a DriftReport, path: &str) -> &'a driftlock_core::DriftChange {
    report
        .changes
        .iter()
        .find(|c| c.path == path)
        .unwrap_or_else(|| panic!("no change recorded for {}", path))
}

// ---------------------------------------------------------------------------
// Clean runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unchanged_tree_reports_no_drift() {
    let dir = TempDir::new().unwrap();
    let (config, store) = seed_workspace(&dir);
    let engine = engine_with_defaults(config, store);

    let report = engine.detect_drift(&CancellationFlag::new()).await.unwrap();

    assert!(!report.has_drift());
    assert_eq!(report.total, 2); // people.ttl and notes.txt
    assert_eq!(report.unchanged, 2);
    assert!(report.changes.is_empty());
    assert_eq!(report.summary.drift_score, 0.0);
    assert_eq!(report.summary.risk_level, RiskLevel::Low);
    assert!(!report.summary.action_required);
    assert!(!report.incomplete);
}

#[tokio::test]
async fn missing_lockfile_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = DetectionConfig {
        lockfile_path: dir.path().join("absent.json"),
        ..DetectionConfig::default()
    };
    let engine = DriftEngine::new(config);

    let err = engine
        .detect_drift(&CancellationFlag::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DriftlockError::Config(_)));
}

// ---------------------------------------------------------------------------
// Modifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shacl_violation_marks_modified_file_high() {
    let dir = TempDir::new().unwrap();
    let (config, store) = seed_workspace(&dir);
    let shacl = FixedShacl::new(false);
    let engine = engine_with_defaults(config, store).with_shacl_validator(shacl.clone());

    // Meaningful edit: the type changes.
    fs::write(
        dir.path().join("people.ttl"),
        "@prefix ex: <http://example.org/> .\n\
         ex:alice a ex:Organization .\n",
    )
    .unwrap();

    let report = engine.detect_drift(&CancellationFlag::new()).await.unwrap();

    assert_eq!(report.modified, 1);
    assert_eq!(shacl.calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.summary.compliance_status, ComplianceStatus::Violations);
    assert!(report.summary.action_required);

    let change = change_for(&report, "people.ttl");
    assert_eq!(change.change_type, ChangeType::Modified);
    assert_eq!(change.severity, Severity::High);
    let validation = change.validation.as_ref().unwrap();
    assert!(!validation.shacl.as_ref().unwrap().conforms);
    let semantic = validation.semantic.as_ref().unwrap();
    assert!(!semantic.canonically_equivalent);
    assert!(semantic.significance > 0.0);
}

#[tokio::test]
async fn cosmetic_rdf_edit_is_low_severity() {
    let dir = TempDir::new().unwrap();
    let (config, store) = seed_workspace(&dir);
    let engine = engine_with_defaults(config, store).with_shacl_validator(FixedShacl::new(true));

    // Same triples, different prefix name and whitespace.
    fs::write(
        dir.path().join("people.ttl"),
        "@prefix p: <http://example.org/> .\n\
         @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
         p:alice  a  p:Person ; rdfs:label \"Alice\" .\n",
    )
    .unwrap();

    let report = engine.detect_drift(&CancellationFlag::new()).await.unwrap();

    let change = change_for(&report, "people.ttl");
    assert_eq!(change.severity, Severity::Low);
    let semantic = change.validation.as_ref().unwrap().semantic.as_ref().unwrap();
    assert!(!semantic.syntactically_identical);
    assert!(semantic.canonically_equivalent);
    assert_eq!(semantic.significance, 0.0);
    assert_eq!(report.summary.compliance_status, ComplianceStatus::Compliant);
}

#[tokio::test]
async fn non_rdf_modification_skips_validation() {
    let dir = TempDir::new().unwrap();
    let (config, store) = seed_workspace(&dir);
    let shacl = FixedShacl::new(false);
    let engine = engine_with_defaults(config, store).with_shacl_validator(shacl.clone());

    fs::write(dir.path().join("notes.txt"), "edited notes\n").unwrap();

    let report = engine.detect_drift(&CancellationFlag::new()).await.unwrap();

    assert_eq!(shacl.calls.load(Ordering::SeqCst), 0);
    let change = change_for(&report, "notes.txt");
    assert_eq!(change.severity, Severity::Medium);
    assert!(change.validation.is_none());
}

// ---------------------------------------------------------------------------
// Deletions and additions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deleted_file_forces_critical_risk() {
    let dir = TempDir::new().unwrap();
    let (config, store) = seed_workspace(&dir);
    let engine = engine_with_defaults(config, store);

    fs::remove_file(dir.path().join("people.ttl")).unwrap();

    let report = engine.detect_drift(&CancellationFlag::new()).await.unwrap();

    assert_eq!(report.deleted, 1);
    let change = change_for(&report, "people.ttl");
    assert_eq!(change.change_type, ChangeType::Deleted);
    assert_eq!(change.severity, Severity::Critical);
    assert!(change.actual_hash.is_none());
    assert_eq!(report.summary.risk_level, RiskLevel::Critical);
    assert!(report.summary.action_required);
    assert!(!report.recommendations.is_empty());
}

#[tokio::test]
async fn scan_new_reports_untracked_files_as_low() {
    let dir = TempDir::new().unwrap();
    let (mut config, store) = seed_workspace(&dir);
    config.scan_new = true;
    let engine = engine_with_defaults(config, store);

    fs::write(dir.path().join("extra.ttl"), "@prefix ex: <http://example.org/> .\n").unwrap();
    // State files never count as drift.
    fs::write(dir.path().join("people.ttl.attest.json"), "{}").unwrap();

    let report = engine.detect_drift(&CancellationFlag::new()).await.unwrap();

    assert_eq!(report.added, 1);
    let change = change_for(&report, "extra.ttl");
    assert_eq!(change.change_type, ChangeType::Added);
    assert_eq!(change.severity, Severity::Low);
    assert!(change.expected_hash.is_none());
    assert!(report.has_drift());
    assert_eq!(report.summary.risk_level, RiskLevel::Low);
}

// ---------------------------------------------------------------------------
// Attestations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_attestation_enables_regeneration() {
    let dir = TempDir::new().unwrap();
    let (config, store) = seed_workspace(&dir);
    write_attestation(&dir, "people.ttl", false);
    let engine = engine_with_defaults(config, store);

    fs::write(
        dir.path().join("people.ttl"),
        "@prefix ex: <http://example.org/> .\nex:alice a ex:Organization .\n",
    )
    .unwrap();

    let report = engine.detect_drift(&CancellationFlag::new()).await.unwrap();

    // people.ttl carries a verified sidecar; notes.txt has none.
    assert_eq!(report.attestations.valid, 1);
    assert_eq!(report.attestations.invalid, 0);
    assert_eq!(report.attestations.missing, 1);

    let change = change_for(&report, "people.ttl");
    assert!(change.can_regenerate);
    assert!(change.regeneration_requirements.is_empty());
}

#[tokio::test]
async fn tampered_attestation_forces_critical_risk() {
    let dir = TempDir::new().unwrap();
    let (config, store) = seed_workspace(&dir);
    write_attestation(&dir, "people.ttl", true);
    let engine = engine_with_defaults(config, store);

    fs::write(
        dir.path().join("people.ttl"),
        "@prefix ex: <http://example.org/> .\nex:alice a ex:Organization .\n",
    )
    .unwrap();

    let report = engine.detect_drift(&CancellationFlag::new()).await.unwrap();

    assert_eq!(report.attestations.invalid, 1);
    assert_eq!(report.summary.risk_level, RiskLevel::Critical);
    assert!(report.summary.action_required);

    // A broken record trusts nothing: regeneration needs a fresh sidecar.
    let change = change_for(&report, "people.ttl");
    assert!(!change.can_regenerate);
    assert_eq!(
        change.regeneration_requirements,
        vec![RegenRequirement::Attestation]
    );
}

// ---------------------------------------------------------------------------
// Degradation and cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stalled_shacl_validator_degrades_to_timeout() {
    let dir = TempDir::new().unwrap();
    let (mut config, store) = seed_workspace(&dir);
    config.shacl_timeout_secs = 1;
    let engine = engine_with_defaults(config, store).with_shacl_validator(Arc::new(StalledShacl));

    fs::write(
        dir.path().join("people.ttl"),
        "@prefix ex: <http://example.org/> .\nex:bob a ex:Person .\n",
    )
    .unwrap();

    let report = engine.detect_drift(&CancellationFlag::new()).await.unwrap();

    let change = change_for(&report, "people.ttl");
    assert_eq!(change.severity, Severity::Medium);
    let validation = change.validation.as_ref().unwrap();
    assert_eq!(validation.degraded.as_deref(), Some("validation-timeout"));
    assert!(validation.shacl.is_none());
    // The timeout stalls one file, never the run.
    assert!(!report.incomplete);
}

#[tokio::test]
async fn missing_baseline_skips_semantic_analysis() {
    let dir = TempDir::new().unwrap();
    let (config, _store) = seed_workspace(&dir);
    // No baseline store attached at all.
    let engine = DriftEngine::new(config)
        .with_rdf_processor(Arc::new(CanonicalDriftProcessor::new()))
        .with_shacl_validator(FixedShacl::new(true));

    fs::write(
        dir.path().join("people.ttl"),
        "@prefix ex: <http://example.org/> .\nex:bob a ex:Person .\n",
    )
    .unwrap();

    let report = engine.detect_drift(&CancellationFlag::new()).await.unwrap();

    let change = change_for(&report, "people.ttl");
    let validation = change.validation.as_ref().unwrap();
    assert!(validation.semantic.is_none());
    assert!(validation.shacl.is_some());
    assert!(validation.degraded.is_none());
}

#[tokio::test]
async fn cancelled_run_returns_partial_report() {
    let dir = TempDir::new().unwrap();
    let (config, store) = seed_workspace(&dir);
    let engine = engine_with_defaults(config, store);

    let cancel = CancellationFlag::new();
    cancel.cancel();

    let report = engine.detect_drift(&cancel).await.unwrap();

    assert!(report.incomplete);
    assert!(report.changes.is_empty());
}

#[tokio::test]
async fn observer_sees_every_file_and_completion() {
    let dir = TempDir::new().unwrap();
    let (config, store) = seed_workspace(&dir);
    let observer = Arc::new(RecordingObserver::default());
    let engine = engine_with_defaults(config, store).with_observer(observer.clone());

    fs::write(dir.path().join("notes.txt"), "edited notes\n").unwrap();

    let report = engine.detect_drift(&CancellationFlag::new()).await.unwrap();

    assert_eq!(observer.completed.load(Ordering::SeqCst), 1);
    let events = observer.events.lock().unwrap();
    assert_eq!(events.len(), report.total);
    assert!(events
        .iter()
        .any(|(path, state)| path == "notes.txt" && *state == PathState::Modified));
}
