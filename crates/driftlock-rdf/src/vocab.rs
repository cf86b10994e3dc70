// crates/driftlock-rdf/src/vocab.rs
//
// Vocabulary weights for semantic significance. A type assertion change
// is the strongest possible drift; label/comment edits are moderate;
// unrecognized predicates get a low default so large annotation-only
// diffs do not drown out structural ones.

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const RDFS_COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";

pub const WEIGHT_DEFAULT: f64 = 0.2;

/// Weight of a change on the given predicate IRI (without angle
/// brackets).
pub fn predicate_weight(iri: &str) -> f64 {
    match iri {
        RDF_TYPE => 1.0,
        RDFS_LABEL => 0.6,
        RDFS_COMMENT => 0.5,
        _ => WEIGHT_DEFAULT,
    }
}
