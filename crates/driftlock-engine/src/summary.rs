// crates/driftlock-engine/src/summary.rs
//
// Risk scoring and recommendation generation. The drift score is the
// normalized severity-weighted sum over all changes; the risk level is
// forced to CRITICAL by any deletion or broken attestation chain and
// otherwise derived from score thresholds.

use driftlock_core::{
    AttestationCounts, ChangeType, ComplianceStatus, DriftChange, ReportSummary, RiskLevel,
    Severity,
};

/// Score threshold at or above which risk is HIGH.
const HIGH_THRESHOLD: f64 = 0.6;
/// Score threshold at or above which risk is MEDIUM.
const MEDIUM_THRESHOLD: f64 = 0.3;

/// Build the run summary from the collected changes.
pub fn summarize(
    changes: &[DriftChange],
    attestations: &AttestationCounts,
    validation_ran: bool,
) -> ReportSummary {
    let drift_score = if changes.is_empty() {
        0.0
    } else {
        let weighted: f64 = changes.iter().map(|c| c.severity.weight()).sum();
        (weighted / changes.len() as f64).min(1.0)
    };

    let any_deletion = changes.iter().any(|c| c.change_type == ChangeType::Deleted);
    let risk_level = if any_deletion || attestations.invalid > 0 {
        RiskLevel::Critical
    } else if drift_score >= HIGH_THRESHOLD {
        RiskLevel::High
    } else if drift_score >= MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let any_violation = changes.iter().any(|c| {
        c.validation
            .as_ref()
            .and_then(|v| v.shacl.as_ref())
            .map(|s| !s.conforms)
            .unwrap_or(false)
    });
    let any_shacl_result = changes
        .iter()
        .any(|c| c.validation.as_ref().map(|v| v.shacl.is_some()).unwrap_or(false));
    let compliance_status = if any_violation {
        ComplianceStatus::Violations
    } else if any_shacl_result && validation_ran {
        ComplianceStatus::Compliant
    } else {
        ComplianceStatus::Unknown
    };

    ReportSummary {
        drift_score,
        action_required: risk_level >= RiskLevel::High
            || compliance_status == ComplianceStatus::Violations,
        risk_level,
        compliance_status,
    }
}

/// Build the recommendation list: one entry per CRITICAL/HIGH change
/// (highest severity first), then general guidance.
pub fn recommend(changes: &[DriftChange], attestations: &AttestationCounts) -> Vec<String> {
    let mut recommendations = Vec::new();

    let mut urgent: Vec<&DriftChange> = changes
        .iter()
        .filter(|c| c.severity >= Severity::High)
        .collect();
    urgent.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.path.cmp(&b.path)));

    for change in urgent {
        let message = match change.change_type {
            ChangeType::Deleted => format!(
                "Restore or regenerate deleted artifact '{}'; deletions cannot be diffed",
                change.path
            ),
            ChangeType::Modified => format!(
                "Review high-risk modification to '{}' before regenerating",
                change.path
            ),
            ChangeType::Added => format!(
                "Review unexpected new artifact '{}' and add it to the snapshot if intended",
                change.path
            ),
        };
        recommendations.push(message);
    }

    if attestations.invalid > 0 {
        recommendations.push(format!(
            "Investigate {} artifact(s) with broken attestation chains; provenance cannot be trusted",
            attestations.invalid
        ));
    }

    let regenerable = changes
        .iter()
        .filter(|c| c.change_type == ChangeType::Modified && c.can_regenerate)
        .count();
    if regenerable > 0 {
        recommendations.push(format!(
            "Consider regenerating {} modified artifact(s) from their recorded templates",
            regenerable
        ));
    }

    let unvalidated = changes.iter().any(|c| {
        c.change_type == ChangeType::Modified
            && c.validation.as_ref().map(|v| v.shacl.is_none()).unwrap_or(true)
    });
    if unvalidated {
        recommendations
            .push("Run SHACL validation on modified files to confirm compliance".to_string());
    }

    recommendations
}
