// crates/driftlock-core/src/report.rs
//
// Report types produced by one drift detection run. A report is built
// once per run, sorted by path, and immutable after it is returned.

use serde::{Deserialize, Serialize};

use crate::attestation::RegenRequirement;

/// Kind of detected change for one tracked path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Modified,
    Deleted,
    Added,
}

/// Severity of one detected change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Weight used for the aggregate drift score.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Critical => 1.0,
            Severity::High => 0.6,
            Severity::Medium => 0.3,
            Severity::Low => 0.1,
        }
    }
}

/// Overall risk level of a detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// SHACL compliance status across the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComplianceStatus {
    /// Every validated file conformed.
    Compliant,
    /// At least one validated file had violations.
    Violations,
    /// Validation was skipped or degraded for every changed file.
    Unknown,
}

/// Result returned by the external SHACL collaborator for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaclReport {
    pub conforms: bool,
    pub violations: u32,
    /// Human-readable violation details, opaque to the engine.
    #[serde(default)]
    pub details: Vec<String>,
}

/// Condensed result of RDF canonical drift analysis for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticSummary {
    /// True when the two inputs were byte-identical.
    pub syntactically_identical: bool,
    /// True when the canonical forms were equal (cosmetic-only change).
    pub canonically_equivalent: bool,
    /// Normalized semantic significance in [0, 1].
    pub significance: f64,
    /// Number of triple-level semantic changes.
    pub changes: usize,
    /// `drift://` URI of the stored patch, when one was generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drift_uri: Option<String>,
}

/// Validation results attached to a modified file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChangeValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shacl: Option<ShaclReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic: Option<SemanticSummary>,
    /// Set when validation could not run (parse failure, timeout) —
    /// the file's result is degraded rather than the run aborted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

/// One detected difference between the snapshot and the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftChange {
    pub change_type: ChangeType,
    /// Path relative to the snapshot root.
    pub path: String,
    /// Hash recorded in the lockfile, absent for added files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_hash: Option<String>,
    /// Current on-disk hash, absent for deleted files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hash: Option<String>,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ChangeValidation>,
    /// True iff the attestation's provenance suffices to regenerate.
    pub can_regenerate: bool,
    /// Provenance fields that block regeneration, when it is blocked.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regeneration_requirements: Vec<RegenRequirement>,
}

/// Aggregate summary of one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Normalized weighted drift score in [0, 1].
    pub drift_score: f64,
    pub risk_level: RiskLevel,
    pub action_required: bool,
    pub compliance_status: ComplianceStatus,
}

/// Attestation verification tallies, tracked separately from file counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttestationCounts {
    pub valid: usize,
    pub invalid: usize,
    pub missing: usize,
}

/// Aggregate result of one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub total: usize,
    pub unchanged: usize,
    pub modified: usize,
    pub deleted: usize,
    pub added: usize,
    /// Changes sorted by path for deterministic output.
    pub changes: Vec<DriftChange>,
    pub summary: ReportSummary,
    /// Urgent recommendations first.
    pub recommendations: Vec<String>,
    pub attestations: AttestationCounts,
    /// True when the run was cancelled and results are partial.
    pub incomplete: bool,
}

impl DriftReport {
    /// True when the run found any drift at all.
    pub fn has_drift(&self) -> bool {
        !self.changes.is_empty()
    }
}
