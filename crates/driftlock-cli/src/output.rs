// crates/driftlock-cli/src/output.rs
//
// Report rendering for the Driftlock CLI.
// Supports plain-text and JSON output modes.

use driftlock_core::{
    ChangeType, ComplianceStatus, DriftChange, DriftReport, RiskLevel, Severity,
};
use driftlock_engine::{DriftObserver, PathState};

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: serde::Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

pub fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "LOW",
        Severity::Medium => "MEDIUM",
        Severity::High => "HIGH",
        Severity::Critical => "CRITICAL",
    }
}

pub fn risk_label(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Low => "LOW",
        RiskLevel::Medium => "MEDIUM",
        RiskLevel::High => "HIGH",
        RiskLevel::Critical => "CRITICAL",
    }
}

fn change_label(change_type: ChangeType) -> &'static str {
    match change_type {
        ChangeType::Modified => "modified",
        ChangeType::Deleted => "deleted",
        ChangeType::Added => "added",
    }
}

fn compliance_label(status: ComplianceStatus) -> &'static str {
    match status {
        ComplianceStatus::Compliant => "COMPLIANT",
        ComplianceStatus::Violations => "VIOLATIONS",
        ComplianceStatus::Unknown => "UNKNOWN",
    }
}

/// Print the report as a plain-text summary.
pub fn render_report(report: &DriftReport, verbose: bool) {
    println!("Drift Report");
    println!("------------");
    println!(
        "  Files:        {} tracked ({} unchanged, {} modified, {} deleted, {} added)",
        report.total, report.unchanged, report.modified, report.deleted, report.added
    );
    println!("  Drift score:  {:.2}", report.summary.drift_score);
    println!("  Risk:         {}", risk_label(report.summary.risk_level));
    println!(
        "  Compliance:   {}",
        compliance_label(report.summary.compliance_status)
    );
    println!(
        "  Attestations: {} valid, {} invalid, {} missing",
        report.attestations.valid, report.attestations.invalid, report.attestations.missing
    );
    if report.incomplete {
        println!("  NOTE: run was cancelled; results are partial.");
    }

    if !report.changes.is_empty() {
        println!();
        println!("Changes:");
        for change in &report.changes {
            render_change(change, verbose);
        }
    }

    if !report.recommendations.is_empty() {
        println!();
        println!("Recommendations:");
        for recommendation in &report.recommendations {
            println!("  - {}", recommendation);
        }
    }
}

fn render_change(change: &DriftChange, verbose: bool) {
    println!(
        "  [{}] {} {}",
        severity_label(change.severity),
        change_label(change.change_type),
        change.path
    );
    if !verbose {
        return;
    }
    if let (Some(expected), Some(actual)) = (&change.expected_hash, &change.actual_hash) {
        println!("        expected {} -> actual {}", expected, actual);
    }
    if let Some(validation) = &change.validation {
        if let Some(shacl) = &validation.shacl {
            if shacl.conforms {
                println!("        shacl: conforms");
            } else {
                println!("        shacl: {} violation(s)", shacl.violations);
                for detail in &shacl.details {
                    println!("          {}", detail);
                }
            }
        }
        if let Some(semantic) = &validation.semantic {
            println!(
                "        semantic: significance {:.2}, {} change(s){}",
                semantic.significance,
                semantic.changes,
                semantic
                    .drift_uri
                    .as_deref()
                    .map(|uri| format!(", {}", uri))
                    .unwrap_or_default()
            );
        }
        if let Some(reason) = &validation.degraded {
            println!("        degraded: {}", reason);
        }
    }
    if change.can_regenerate {
        println!("        regenerable from attestation provenance");
    } else if !change.regeneration_requirements.is_empty() {
        let missing: Vec<String> = change
            .regeneration_requirements
            .iter()
            .map(|r| r.to_string())
            .collect();
        println!("        missing for regeneration: {}", missing.join(", "));
    }
}

/// Observer printing one line per processed file.
pub struct ProgressObserver;

impl DriftObserver for ProgressObserver {
    fn on_file_processed(&self, path: &str, state: PathState) {
        let label = match state {
            PathState::Unchanged => return,
            PathState::Modified => "modified",
            PathState::Deleted => "deleted",
            PathState::Added => "added",
            PathState::Degraded => "degraded",
        };
        println!("  {} {}", label, path);
    }

    fn on_complete(&self, _report: &DriftReport) {}
}
