// crates/driftlock-core/src/lib.rs
//
// driftlock-core: Core types, errors, and hashing for Driftlock.
//
// This is the leaf crate the rest of the workspace depends on. It defines
// the lockfile snapshot model, attestation sidecars with hash-chain
// verification, the drift report types, the shared error enum, and the
// trait interfaces for external collaborators (SHACL validation and
// artifact regeneration).

pub mod attestation;
pub mod error;
pub mod hashing;
pub mod lockfile;
pub mod report;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use driftlock_core::DriftReport;`

// Lockfile types
pub use lockfile::{LockEntry, LockSnapshot, LOCKFILE_VERSION};

// Attestation types
pub use attestation::{
    ArtifactRef, Attestation, ChainEntry, Integrity, Provenance, RegenRequirement,
};

// Report types
pub use report::{
    AttestationCounts, ChangeType, ChangeValidation, ComplianceStatus, DriftChange, DriftReport,
    ReportSummary, RiskLevel, SemanticSummary, Severity, ShaclReport,
};

// Error type
pub use error::DriftlockError;

// Hashing helpers
pub use hashing::{hash_bytes, hash_file, hash_hex, is_hex_digest};

// Traits
pub use traits::{ArtifactRegenerator, ShaclValidator};
