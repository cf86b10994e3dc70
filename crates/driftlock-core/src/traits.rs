// crates/driftlock-core/src/traits.rs

use async_trait::async_trait;

use crate::attestation::Provenance;
use crate::error::DriftlockError;
use crate::report::ShaclReport;

/// External SHACL constraint-validation engine.
///
/// Opaque beyond this contract: the engine hands it file content plus a
/// shapes path and records whatever conformance result comes back.
#[async_trait]
pub trait ShaclValidator: Send + Sync {
    /// Validate `content` against the shapes at `shapes_path`.
    async fn validate(&self, content: &str, shapes_path: &str)
        -> Result<ShaclReport, DriftlockError>;
}

/// The template/render pipeline that originally produced an artifact.
///
/// Invoked only for artifacts whose attestation provenance resolves to a
/// template path and hash.
#[async_trait]
pub trait ArtifactRegenerator: Send + Sync {
    /// Re-render the artifact described by `provenance`.
    async fn regenerate(&self, provenance: &Provenance) -> Result<String, DriftlockError>;
}
