// crates/driftlock-core/src/attestation.rs
//
// Attestation sidecars: provenance + integrity records written next to
// each generated artifact (`<artifact>.attest.json`). The engine consumes
// them read-only to answer two questions: is the record itself intact
// (hash chain verifies), and does it carry enough provenance to
// regenerate the artifact.
//
// Chain rule: the verification chain starts from the artifact hash and
// each entry's hash must equal SHA-256 over the previous link plus the
// entry's type/version/entities fields. The attestation hash covers the
// JSON of the whole record with `attestation_hash` blanked out, so any
// tampering with provenance or chain entries invalidates it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DriftlockError;
use crate::hashing::hash_hex;

/// Reference to the artifact an attestation covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Path of the artifact, relative to the generation root.
    pub path: String,
    /// SHA-256 of the artifact bytes at generation time, lowercase hex.
    pub hash: String,
    /// Byte size at generation time.
    pub size: u64,
}

/// Provenance: how the artifact was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Identifier of the source data snapshot the artifact was generated from.
    pub source_snapshot: Option<String>,
    /// Path of the template that rendered the artifact.
    pub template_path: Option<String>,
    /// SHA-256 of the template at generation time.
    pub template_hash: Option<String>,
    /// Template version string.
    pub template_version: Option<String>,
    /// Template variables, sorted by name for stable serialization.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    /// When the artifact was generated.
    pub generated_at: DateTime<Utc>,
    /// Agent (tool or pipeline) that performed the generation.
    pub agent: String,
}

/// One link in the verification chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    /// Kind of verification step (e.g., "render", "shacl", "canonicalize").
    pub entry_type: String,
    /// Chain hash after this step, lowercase hex.
    pub hash: String,
    /// Version of the verifier that produced this link, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Number of entities the step covered, if meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<u64>,
}

/// Integrity section: hash algorithm, ordered chain, and linkage to the
/// previous attestation for the same artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integrity {
    /// Hash algorithm identifier. Only "sha256" is produced or accepted.
    pub hash_algorithm: String,
    /// Ordered verification chain; each entry links to the one before it.
    pub verification_chain: Vec<ChainEntry>,
    /// Attestation hash of the previous record for this artifact, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_hash: Option<String>,
    /// Position of this record in the artifact's attestation history.
    pub chain_index: u64,
}

/// Provenance + integrity record for one generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub artifact: ArtifactRef,
    pub provenance: Provenance,
    pub integrity: Integrity,
    /// Self-hash over the whole record with this field blanked.
    pub attestation_hash: String,
}

/// Fields missing from provenance that block regeneration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegenRequirement {
    /// No attestation sidecar exists for the artifact.
    Attestation,
    /// Provenance lacks a template path.
    TemplatePath,
    /// Provenance lacks a template hash.
    TemplateHash,
}

impl std::fmt::Display for RegenRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegenRequirement::Attestation => write!(f, "attestation sidecar"),
            RegenRequirement::TemplatePath => write!(f, "provenance.template_path"),
            RegenRequirement::TemplateHash => write!(f, "provenance.template_hash"),
        }
    }
}

impl Attestation {
    /// Sidecar path for an artifact: `<artifact>.attest.json`.
    pub fn sidecar_path(artifact: &Path) -> PathBuf {
        let mut name = artifact.as_os_str().to_os_string();
        name.push(".attest.json");
        PathBuf::from(name)
    }

    /// Load the sidecar for `artifact`, if one exists.
    ///
    /// A missing sidecar is `Ok(None)`; an unreadable or unparseable one
    /// is an `Integrity` error so callers can tally it as invalid rather
    /// than absent.
    pub fn load_sidecar(artifact: &Path) -> Result<Option<Self>, DriftlockError> {
        let path = Self::sidecar_path(artifact);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|e| {
            DriftlockError::Integrity(format!("Cannot read attestation {}: {}", path.display(), e))
        })?;
        let attestation: Attestation = serde_json::from_str(&text).map_err(|e| {
            DriftlockError::Integrity(format!("Corrupt attestation {}: {}", path.display(), e))
        })?;
        Ok(Some(attestation))
    }

    /// Compute the chain hash of one link given the previous link.
    fn link_hash(previous: &str, entry: &ChainEntry) -> String {
        let input = format!(
            "{}:{}:{}:{}",
            previous,
            entry.entry_type,
            entry.version.as_deref().unwrap_or(""),
            entry.entities.unwrap_or(0)
        );
        hash_hex(input.as_bytes())
    }

    /// Compute the self-hash of the record with `attestation_hash` blanked.
    pub fn compute_hash(&self) -> Result<String, DriftlockError> {
        let mut blanked = self.clone();
        blanked.attestation_hash = String::new();
        let json = serde_json::to_vec(&blanked)?;
        Ok(hash_hex(&json))
    }

    /// Recompute every chain-entry hash and the self-hash. Used when
    /// building attestations (generation-side tooling and test fixtures).
    pub fn seal(mut self) -> Result<Self, DriftlockError> {
        let mut running = self.artifact.hash.clone();
        for entry in &mut self.integrity.verification_chain {
            running = Self::link_hash(&running, entry);
            entry.hash = running.clone();
        }
        self.attestation_hash = self.compute_hash()?;
        Ok(self)
    }

    /// Verify the record: hash algorithm, chain linkage, index/previous
    /// consistency, and the self-hash.
    ///
    /// A broken chain is an `Integrity` error naming the first bad link;
    /// it is never silently repaired.
    pub fn verify_chain(&self) -> Result<(), DriftlockError> {
        if self.integrity.hash_algorithm != "sha256" {
            return Err(DriftlockError::Integrity(format!(
                "Unsupported hash algorithm '{}' in attestation for {}",
                self.integrity.hash_algorithm, self.artifact.path
            )));
        }
        if self.integrity.chain_index == 0 && self.integrity.previous_hash.is_some() {
            return Err(DriftlockError::Integrity(format!(
                "Attestation for {} has chain_index 0 but a previous_hash link",
                self.artifact.path
            )));
        }
        if self.integrity.chain_index > 0 && self.integrity.previous_hash.is_none() {
            return Err(DriftlockError::Integrity(format!(
                "Attestation for {} has chain_index {} but no previous_hash link",
                self.artifact.path, self.integrity.chain_index
            )));
        }

        let mut running = self.artifact.hash.clone();
        for (i, entry) in self.integrity.verification_chain.iter().enumerate() {
            running = Self::link_hash(&running, entry);
            if entry.hash != running {
                return Err(DriftlockError::Integrity(format!(
                    "Attestation chain for {} breaks at link {} ({})",
                    self.artifact.path, i, entry.entry_type
                )));
            }
        }

        let expected = self.compute_hash()?;
        if expected != self.attestation_hash {
            return Err(DriftlockError::Integrity(format!(
                "Attestation self-hash mismatch for {}",
                self.artifact.path
            )));
        }
        Ok(())
    }

    /// Provenance fields required for regeneration that are absent.
    ///
    /// Empty result means the artifact can be regenerated from its
    /// recorded template.
    pub fn regeneration_requirements(&self) -> Vec<RegenRequirement> {
        let mut missing = Vec::new();
        if self.provenance.template_path.is_none() {
            missing.push(RegenRequirement::TemplatePath);
        }
        if self.provenance.template_hash.is_none() {
            missing.push(RegenRequirement::TemplateHash);
        }
        missing
    }
}
