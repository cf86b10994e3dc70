// crates/driftlock-rdf/src/lib.rs
//
// driftlock-rdf: RDF canonical drift analysis for Driftlock.
//
// Canonicalizes RDF graphs (deterministic blank-node relabeling plus
// triple sorting) so cosmetic edits compare equal, computes the
// triple-level semantic diff between two documents, weights it by
// vocabulary, and optionally stores the diff under a drift:// URI.

pub mod canon;
pub mod parse;
pub mod processor;
pub mod vocab;

// Re-export key types for ergonomic access from downstream crates.
pub use canon::{canonical_graph_text, canonical_triples};
pub use parse::{parse_triples, RdfFormat};
pub use processor::{CanonicalDriftProcessor, CanonicalDriftReport, DriftOptions, SemanticChange};
pub use vocab::predicate_weight;
