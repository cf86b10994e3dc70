// crates/driftlock-resolver/src/resolver.rs
//
// The drift:// resolver: canonicalize two states of a value, diff them,
// classify the change, persist the patch in the content-addressed store,
// and hand back a deterministic drift:// address. Retrieval reverses the
// trip; application delegates to the patch algebra with stale-baseline
// detection intact.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use driftlock_core::hashing::hash_hex;
use driftlock_core::DriftlockError;
use driftlock_patch::{apply, canonical_text, diff, invert, Patch};
use driftlock_store::{ContentStore, StoreOccupancy};

use crate::metrics::{MetricsSnapshot, ResolverMetrics};
use crate::significance::{classify, Classification};
use crate::uri::{DriftUri, UriScheme};

/// Kind of data a patch was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    Data,
    Rdf,
}

/// Caller-supplied metadata for `store_patch`.
#[derive(Debug, Clone, Default)]
pub struct PatchMeta {
    pub kind: InputKind,
    /// URI subtype (e.g. "turtle" for RDF inputs).
    pub subtype: Option<String>,
    /// Significance computed upstream (the RDF processor's vocabulary-
    /// weighted score). When absent the generic heuristic runs.
    pub significance_override: Option<f64>,
}

/// Resolver configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Significance at or above which a patch with a type or structural
    /// change is addressed under the `semantic` scheme.
    #[serde(default = "default_semantic_threshold")]
    pub semantic_threshold: f64,
}

fn default_semantic_threshold() -> f64 {
    0.3
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            semantic_threshold: default_semantic_threshold(),
        }
    }
}

/// The stored form of a patch: what `retrieve_patch` returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    pub patch: Patch,
    pub scheme: UriScheme,
    pub significance: f64,
    /// Hash of the canonical baseline text.
    pub baseline_hash: String,
    /// Hash of the canonical result text.
    pub result_hash: String,
    pub identical: bool,
}

/// Result of `store_patch`.
#[derive(Debug, Clone, PartialEq)]
pub struct StorePatchOutcome {
    /// None when the canonical forms were equal (nothing stored).
    pub uri: Option<DriftUri>,
    pub patch: Option<Patch>,
    /// Canonical-form equality: covers both true no-ops and
    /// cosmetic-only edits.
    pub identical: bool,
    /// Raw input equality, distinguishing "no edit at all" from an edit
    /// that canonicalization absorbed.
    pub byte_identical: bool,
    pub significance: f64,
}

/// Result of `apply_patch`, with hashes for caller-side verification.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub result: Value,
    pub baseline_hash: String,
    pub result_hash: String,
}

/// A patch given directly or by its drift:// address.
#[derive(Debug, Clone)]
pub enum PatchSource<'a> {
    Patch(&'a Patch),
    Uri(&'a str),
}

/// Stores and resolves drift:// patches over a content-addressed store.
pub struct DriftResolver {
    store: ContentStore,
    config: ResolverConfig,
    metrics: ResolverMetrics,
    /// Content IDs stored during this resolver's lifetime; the retention
    /// sweep never evicts them.
    pinned: Mutex<HashSet<String>>,
}

impl DriftResolver {
    pub fn new(store: ContentStore, config: ResolverConfig) -> Self {
        Self {
            store,
            config,
            metrics: ResolverMetrics::default(),
            pinned: Mutex::new(HashSet::new()),
        }
    }

    /// Diff two states of a value and persist the patch.
    ///
    /// Returns `uri: None` when the canonical forms are equal — for both
    /// byte-identical inputs and cosmetic-only differences; the
    /// `byte_identical` flag separates the two. Nothing is written in
    /// that case.
    pub fn store_patch(
        &self,
        baseline: &Value,
        current: &Value,
        meta: &PatchMeta,
    ) -> Result<StorePatchOutcome, DriftlockError> {
        let byte_identical = baseline == current;
        let baseline_text = canonical_text(baseline);
        let current_text = canonical_text(current);

        if baseline_text == current_text {
            return Ok(StorePatchOutcome {
                uri: None,
                patch: None,
                identical: true,
                byte_identical,
                significance: 0.0,
            });
        }

        let patch = diff(baseline, current);
        let class = classify(&patch);
        let significance = meta.significance_override.unwrap_or(class.significance);
        let scheme = self.choose_scheme(significance, &class, meta.kind);
        let subtype = meta.subtype.clone().or_else(|| {
            (scheme == UriScheme::Semantic && class.structural_change)
                .then(|| "structural".to_string())
        });

        let record = PatchRecord {
            patch: patch.clone(),
            scheme,
            significance,
            baseline_hash: hash_hex(baseline_text.as_bytes()),
            result_hash: hash_hex(current_text.as_bytes()),
            identical: false,
        };
        let uri = self.persist(&record, subtype)?;

        Ok(StorePatchOutcome {
            uri: Some(uri),
            patch: Some(patch),
            identical: false,
            byte_identical,
            significance,
        })
    }

    /// Compute and store the reverse patch for (original → modified).
    ///
    /// Applying the stored patch to `modified` restores `original`.
    pub fn generate_reverse_patch(
        &self,
        original: &Value,
        modified: &Value,
    ) -> Result<StorePatchOutcome, DriftlockError> {
        let forward = diff(original, modified);
        if forward.is_empty() {
            return Ok(StorePatchOutcome {
                uri: None,
                patch: None,
                identical: true,
                byte_identical: original == modified,
                significance: 0.0,
            });
        }
        let reverse = invert(&forward);
        let class = classify(&reverse);
        let scheme = self.choose_scheme(class.significance, &class, InputKind::Data);

        let record = PatchRecord {
            patch: reverse.clone(),
            scheme,
            significance: class.significance,
            baseline_hash: hash_hex(canonical_text(modified).as_bytes()),
            result_hash: hash_hex(canonical_text(original).as_bytes()),
            identical: false,
        };
        let uri = self.persist(&record, None)?;

        Ok(StorePatchOutcome {
            uri: Some(uri),
            patch: Some(reverse),
            identical: false,
            byte_identical: false,
            significance: class.significance,
        })
    }

    /// Resolve a drift:// URI to its stored patch record.
    pub fn retrieve_patch(&self, uri: &str) -> Result<(DriftUri, PatchRecord), DriftlockError> {
        let started = Instant::now();
        let parsed = DriftUri::parse(uri)?;
        let bytes = self.store.get(&parsed.content_id)?;
        let record: PatchRecord = serde_json::from_slice(&bytes)?;
        self.metrics.record_retrieval(started.elapsed());
        debug!(uri = %parsed, ops = record.patch.len(), "patch retrieved");
        Ok((parsed, record))
    }

    /// Apply a patch (given directly or by URI) to a baseline value.
    ///
    /// The returned hashes let the caller verify the transition matches
    /// what the patch record claims.
    pub fn apply_patch(
        &self,
        baseline: &Value,
        source: PatchSource<'_>,
    ) -> Result<ApplyOutcome, DriftlockError> {
        let resolved;
        let patch = match source {
            PatchSource::Patch(patch) => patch,
            PatchSource::Uri(uri) => {
                resolved = self.retrieve_patch(uri)?.1;
                &resolved.patch
            }
        };
        let result = apply(baseline, patch)?;
        Ok(ApplyOutcome {
            baseline_hash: hash_hex(canonical_text(baseline).as_bytes()),
            result_hash: hash_hex(canonical_text(&result).as_bytes()),
            result,
        })
    }

    /// Run the retention sweep, keeping every blob this resolver wrote.
    pub fn evict_expired(&self) -> Result<usize, DriftlockError> {
        let pinned = self
            .pinned
            .lock()
            .map_err(|_| DriftlockError::Storage("pinned set lock poisoned".to_string()))?
            .clone();
        self.store.evict_expired(&pinned)
    }

    /// Resolver counters plus store occupancy.
    pub fn metrics(&self) -> Result<(MetricsSnapshot, StoreOccupancy), DriftlockError> {
        Ok((self.metrics.snapshot(), self.store.occupancy()?))
    }

    fn choose_scheme(
        &self,
        significance: f64,
        class: &Classification,
        kind: InputKind,
    ) -> UriScheme {
        if significance >= self.config.semantic_threshold
            && (class.type_change || class.structural_change)
        {
            UriScheme::Semantic
        } else if kind == InputKind::Rdf {
            UriScheme::Rdf
        } else {
            UriScheme::Hash
        }
    }

    fn persist(
        &self,
        record: &PatchRecord,
        subtype: Option<String>,
    ) -> Result<DriftUri, DriftlockError> {
        let bytes = serde_json::to_vec(record)?;
        let content_id = self.store.put(&bytes)?;
        if let Ok(mut pinned) = self.pinned.lock() {
            pinned.insert(content_id.clone());
        }
        self.metrics.record_store();
        let uri = DriftUri::new(record.scheme, subtype, content_id);
        debug!(uri = %uri, significance = record.significance, "patch stored");
        Ok(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftlock_store::StoreConfig;
    use serde_json::json;

    fn resolver() -> (tempfile::TempDir, DriftResolver) {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(StoreConfig {
            root: dir.path().join("cas"),
            ..StoreConfig::default()
        })
        .unwrap();
        (dir, DriftResolver::new(store, ResolverConfig::default()))
    }

    #[test]
    fn identical_inputs_store_nothing() {
        let (_dir, resolver) = resolver();
        let value = json!({"type": "Person", "name": "Alice"});
        let outcome = resolver
            .store_patch(&value, &value, &PatchMeta::default())
            .unwrap();
        assert!(outcome.identical);
        assert!(outcome.byte_identical);
        assert!(outcome.uri.is_none());
        assert!(outcome.patch.is_none());
        assert_eq!(resolver.metrics().unwrap().1.blobs, 0);
    }

    #[test]
    fn cosmetic_difference_is_identical_but_not_byte_identical() {
        let (_dir, resolver) = resolver();
        let outcome = resolver
            .store_patch(&json!({"n": 2.0}), &json!({"n": 2}), &PatchMeta::default())
            .unwrap();
        assert!(outcome.identical);
        assert!(!outcome.byte_identical);
        assert!(outcome.uri.is_none());
    }

    #[test]
    fn type_change_gets_semantic_scheme() {
        let (_dir, resolver) = resolver();
        let outcome = resolver
            .store_patch(
                &json!({"type": "Person"}),
                &json!({"type": "Organization"}),
                &PatchMeta::default(),
            )
            .unwrap();
        let uri = outcome.uri.unwrap();
        assert_eq!(uri.scheme, UriScheme::Semantic);
        assert!(outcome.significance >= 0.3);
    }

    #[test]
    fn rdf_kind_falls_back_to_rdf_scheme() {
        let (_dir, resolver) = resolver();
        let outcome = resolver
            .store_patch(
                &json!({"label": "old"}),
                &json!({"label": "new"}),
                &PatchMeta {
                    kind: InputKind::Rdf,
                    subtype: Some("turtle".to_string()),
                    significance_override: Some(0.1),
                },
            )
            .unwrap();
        let uri = outcome.uri.unwrap();
        assert_eq!(uri.scheme, UriScheme::Rdf);
        assert_eq!(uri.subtype.as_deref(), Some("turtle"));
    }

    #[test]
    fn storing_same_pair_twice_yields_same_content_id() {
        let (_dir, resolver) = resolver();
        let a = json!({"v": 1});
        let b = json!({"v": 2, "w": [1, 2]});
        let first = resolver.store_patch(&a, &b, &PatchMeta::default()).unwrap();
        let second = resolver.store_patch(&a, &b, &PatchMeta::default()).unwrap();
        assert_eq!(
            first.uri.unwrap().content_id,
            second.uri.unwrap().content_id
        );
        assert_eq!(resolver.metrics().unwrap().1.blobs, 1);
    }

    #[test]
    fn round_trip_through_uri() {
        let (_dir, resolver) = resolver();
        let a = json!({"nodes": [{"id": 1}], "kind": "graph"});
        let b = json!({"nodes": [{"id": 1}, {"id": 2}], "kind": "graph"});
        let outcome = resolver.store_patch(&a, &b, &PatchMeta::default()).unwrap();
        let uri = outcome.uri.unwrap().to_string();

        let applied = resolver.apply_patch(&a, PatchSource::Uri(&uri)).unwrap();
        assert_eq!(canonical_text(&applied.result), canonical_text(&b));

        let (_, record) = resolver.retrieve_patch(&uri).unwrap();
        assert_eq!(record.baseline_hash, applied.baseline_hash);
        assert_eq!(record.result_hash, applied.result_hash);
    }

    #[test]
    fn reverse_patch_restores_original() {
        let (_dir, resolver) = resolver();
        let original = json!({"a": 1, "list": [1, 2, 3]});
        let modified = json!({"a": 2, "list": [1, 3]});
        let outcome = resolver
            .generate_reverse_patch(&original, &modified)
            .unwrap();
        let uri = outcome.uri.unwrap().to_string();

        let applied = resolver
            .apply_patch(&modified, PatchSource::Uri(&uri))
            .unwrap();
        assert_eq!(canonical_text(&applied.result), canonical_text(&original));
    }

    #[test]
    fn missing_blob_is_not_found() {
        let (_dir, resolver) = resolver();
        let uri = format!("drift://hash/{}", "cd".repeat(32));
        let err = resolver.retrieve_patch(&uri).unwrap_err();
        assert!(matches!(err, DriftlockError::NotFound(_)));
    }

    #[test]
    fn metrics_track_stores_and_retrievals() {
        let (_dir, resolver) = resolver();
        let outcome = resolver
            .store_patch(&json!({"v": 1}), &json!({"v": 2}), &PatchMeta::default())
            .unwrap();
        let uri = outcome.uri.unwrap().to_string();
        resolver.retrieve_patch(&uri).unwrap();

        let (snapshot, occupancy) = resolver.metrics().unwrap();
        assert_eq!(snapshot.patches_stored, 1);
        assert_eq!(snapshot.patches_retrieved, 1);
        assert_eq!(occupancy.blobs, 1);
    }
}
