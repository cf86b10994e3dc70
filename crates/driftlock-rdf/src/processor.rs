// crates/driftlock-rdf/src/processor.rs
//
// Canonical drift analysis: distinguish cosmetic RDF edits (reordering,
// reformatting, blank-node renaming) from true semantic changes. Two
// graphs are compared by canonical form; only additions and removals of
// canonical triples count as drift, and each change is weighted by its
// predicate's vocabulary weight.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use driftlock_core::DriftlockError;
use driftlock_resolver::{DriftResolver, InputKind, PatchMeta};

use crate::canon::canonical_triples;
use crate::parse::{parse_triples, RdfFormat};
use crate::vocab::predicate_weight;

/// Options for one drift analysis.
#[derive(Debug, Clone, Default)]
pub struct DriftOptions {
    pub format: RdfFormat,
    /// Store the triple-level diff and return its drift:// address.
    pub generate_drift_uri: bool,
}

/// One triple-level semantic difference, paired by subject + predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticChange {
    /// Canonical subject term.
    pub subject: String,
    /// Predicate IRI, without angle brackets.
    pub predicate: String,
    /// Canonical objects removed for this subject + predicate.
    pub removed: Vec<String>,
    /// Canonical objects added for this subject + predicate.
    pub added: Vec<String>,
    /// Vocabulary weight of the predicate.
    pub weight: f64,
}

/// Result of comparing two RDF documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDriftReport {
    /// Raw-text equality: distinguishes "no edit at all" from an edit
    /// that canonicalization absorbed.
    pub syntactically_identical: bool,
    /// Canonical-form equality: true for cosmetic-only changes.
    pub canonically_equivalent: bool,
    /// Canonical triples present only in the baseline.
    pub removed_triples: Vec<String>,
    /// Canonical triples present only in the current document.
    pub added_triples: Vec<String>,
    pub semantic_changes: Vec<SemanticChange>,
    /// Normalized vocabulary-weighted significance in [0, 1].
    pub significance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drift_uri: Option<String>,
}

/// Analyzes canonical drift between two states of an RDF document.
pub struct CanonicalDriftProcessor {
    resolver: Option<Arc<DriftResolver>>,
}

impl CanonicalDriftProcessor {
    /// Processor without patch storage; `generate_drift_uri` requests
    /// are ignored.
    pub fn new() -> Self {
        Self { resolver: None }
    }

    /// Processor that can store triple-level patches under drift:// URIs.
    pub fn with_resolver(resolver: Arc<DriftResolver>) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }

    /// Compare two RDF documents.
    ///
    /// Reordering triples or renaming blank nodes between the two inputs
    /// never produces semantic changes; only additions and removals of
    /// canonical triples do.
    pub fn analyze_canonical_drift(
        &self,
        rdf_a: &str,
        rdf_b: &str,
        options: &DriftOptions,
    ) -> Result<CanonicalDriftReport, DriftlockError> {
        let syntactically_identical = rdf_a == rdf_b;

        let canon_a = canonical_triples(&parse_triples(rdf_a, options.format)?);
        let canon_b = canonical_triples(&parse_triples(rdf_b, options.format)?);

        if canon_a == canon_b {
            return Ok(CanonicalDriftReport {
                syntactically_identical,
                canonically_equivalent: true,
                removed_triples: Vec::new(),
                added_triples: Vec::new(),
                semantic_changes: Vec::new(),
                significance: 0.0,
                drift_uri: None,
            });
        }

        // Symmetric difference of the canonical triple sets.
        let removed_triples: Vec<String> = canon_a
            .iter()
            .filter(|line| canon_b.binary_search(line).is_err())
            .cloned()
            .collect();
        let added_triples: Vec<String> = canon_b
            .iter()
            .filter(|line| canon_a.binary_search(line).is_err())
            .cloned()
            .collect();

        let semantic_changes = pair_changes(&removed_triples, &added_triples);
        let graph_size = canon_a.len().max(canon_b.len()).max(1);
        let weighted: f64 = semantic_changes
            .iter()
            .map(|c| c.weight * c.removed.len().max(c.added.len()) as f64)
            .sum();
        let significance = (weighted / graph_size as f64).min(1.0);

        let drift_uri = if options.generate_drift_uri {
            self.store_triple_patch(&canon_a, &canon_b, significance, options)?
        } else {
            None
        };

        debug!(
            removed = removed_triples.len(),
            added = added_triples.len(),
            significance,
            "canonical drift analyzed"
        );

        Ok(CanonicalDriftReport {
            syntactically_identical,
            canonically_equivalent: false,
            removed_triples,
            added_triples,
            semantic_changes,
            significance,
            drift_uri,
        })
    }

    /// Store the canonical triple lists as a patch under the rdf scheme
    /// family.
    fn store_triple_patch(
        &self,
        canon_a: &[String],
        canon_b: &[String],
        significance: f64,
        options: &DriftOptions,
    ) -> Result<Option<String>, DriftlockError> {
        let Some(resolver) = &self.resolver else {
            return Ok(None);
        };
        let outcome = resolver.store_patch(
            &json!(canon_a),
            &json!(canon_b),
            &PatchMeta {
                kind: InputKind::Rdf,
                subtype: Some(options.format.as_str().to_string()),
                significance_override: Some(significance),
            },
        )?;
        Ok(outcome.uri.map(|u| u.to_string()))
    }
}

impl Default for CanonicalDriftProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Pair removed and added triples by subject + predicate.
fn pair_changes(removed: &[String], added: &[String]) -> Vec<SemanticChange> {
    let mut buckets: BTreeMap<(String, String), (Vec<String>, Vec<String>)> = BTreeMap::new();
    for line in removed {
        if let Some((subject, predicate, object)) = split_line(line) {
            buckets
                .entry((subject, predicate))
                .or_default()
                .0
                .push(object);
        }
    }
    for line in added {
        if let Some((subject, predicate, object)) = split_line(line) {
            buckets
                .entry((subject, predicate))
                .or_default()
                .1
                .push(object);
        }
    }
    buckets
        .into_iter()
        .map(|((subject, predicate), (removed, added))| SemanticChange {
            weight: predicate_weight(&predicate),
            subject,
            predicate,
            removed,
            added,
        })
        .collect()
}

/// Split a canonical N-Triples line into subject, predicate IRI (angle
/// brackets stripped), and object. Subject and predicate tokens never
/// contain spaces, so two splits suffice even for literal objects.
fn split_line(line: &str) -> Option<(String, String, String)> {
    let mut parts = line.splitn(3, ' ');
    let subject = parts.next()?.to_string();
    let predicate = parts.next()?.trim_matches(['<', '>']).to_string();
    let object = parts.next()?.strip_suffix(" .")?.to_string();
    Some((subject, predicate, object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::RDF_TYPE;
    use driftlock_resolver::ResolverConfig;
    use driftlock_store::{ContentStore, StoreConfig};

    const PERSON: &str = "@prefix ex: <http://example.org/> .\n\
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
        ex:acme a ex:Person ;\n\
            rdfs:label \"Acme\" .";

    fn processor() -> CanonicalDriftProcessor {
        CanonicalDriftProcessor::new()
    }

    #[test]
    fn identical_text_is_fully_identical() {
        let report = processor()
            .analyze_canonical_drift(PERSON, PERSON, &DriftOptions::default())
            .unwrap();
        assert!(report.syntactically_identical);
        assert!(report.canonically_equivalent);
        assert_eq!(report.significance, 0.0);
    }

    #[test]
    fn reordered_triples_are_canonically_equivalent() {
        let reordered = "@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
            @prefix ex: <http://example.org/> .\n\
            ex:acme rdfs:label \"Acme\" .\n\
            ex:acme a ex:Person .";
        let report = processor()
            .analyze_canonical_drift(PERSON, reordered, &DriftOptions::default())
            .unwrap();
        assert!(!report.syntactically_identical);
        assert!(report.canonically_equivalent);
        assert!(report.semantic_changes.is_empty());
    }

    #[test]
    fn blank_node_renaming_is_cosmetic() {
        let a = "@prefix ex: <http://example.org/> .\n_:n1 ex:knows _:n2 .";
        let b = "@prefix ex: <http://example.org/> .\n_:left ex:knows _:right .";
        let report = processor()
            .analyze_canonical_drift(a, b, &DriftOptions::default())
            .unwrap();
        assert!(report.canonically_equivalent);
    }

    #[test]
    fn type_change_is_high_significance() {
        let changed = PERSON.replace("ex:Person", "ex:Organization");
        let report = processor()
            .analyze_canonical_drift(PERSON, &changed, &DriftOptions::default())
            .unwrap();
        assert!(!report.canonically_equivalent);
        assert_eq!(report.removed_triples.len(), 1);
        assert_eq!(report.added_triples.len(), 1);

        let change = &report.semantic_changes[0];
        assert_eq!(change.predicate, RDF_TYPE);
        assert_eq!(change.weight, 1.0);
        assert!(report.significance >= 0.3);
    }

    #[test]
    fn label_change_is_moderate() {
        let changed = PERSON.replace("\"Acme\"", "\"Acme Corp\"");
        let report = processor()
            .analyze_canonical_drift(PERSON, &changed, &DriftOptions::default())
            .unwrap();
        let change = &report.semantic_changes[0];
        assert_eq!(change.removed, vec!["\"Acme\"".to_string()]);
        assert_eq!(change.added, vec!["\"Acme Corp\"".to_string()]);
        assert!(change.weight < 1.0);
        assert!(report.significance < 0.5);
    }

    #[test]
    fn generate_drift_uri_stores_rdf_patch() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(StoreConfig {
            root: dir.path().join("cas"),
            ..StoreConfig::default()
        })
        .unwrap();
        let resolver = Arc::new(DriftResolver::new(store, ResolverConfig::default()));
        let processor = CanonicalDriftProcessor::with_resolver(resolver.clone());

        let changed = PERSON.replace("ex:Person", "ex:Organization");
        let report = processor
            .analyze_canonical_drift(
                PERSON,
                &changed,
                &DriftOptions {
                    format: RdfFormat::Turtle,
                    generate_drift_uri: true,
                },
            )
            .unwrap();

        let uri = report.drift_uri.expect("uri generated");
        assert!(uri.starts_with("drift://"));
        let (parsed, record) = resolver.retrieve_patch(&uri).unwrap();
        assert!(!record.patch.is_empty());
        // Type change at high significance lands in the semantic family.
        assert!(matches!(
            parsed.scheme,
            driftlock_resolver::UriScheme::Semantic | driftlock_resolver::UriScheme::Rdf
        ));
    }

    #[test]
    fn parse_failure_surfaces_as_validation_error() {
        let err = processor()
            .analyze_canonical_drift("@@nonsense", PERSON, &DriftOptions::default())
            .unwrap_err();
        assert!(matches!(err, DriftlockError::Validation(_)));
    }
}
