// crates/driftlock-rdf/src/parse.rs
//
// RDF input parsing. The parser itself is delegated to oxttl; this
// module only maps formats and turns parse failures into per-file
// validation errors so the detection engine can degrade a single file
// instead of aborting a run.

use oxrdf::Triple;
use oxttl::{NTriplesParser, TurtleParser};
use serde::{Deserialize, Serialize};

use driftlock_core::DriftlockError;

/// Supported RDF serializations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RdfFormat {
    #[default]
    Turtle,
    NTriples,
}

impl RdfFormat {
    /// URI subtype string for drift:// addresses.
    pub fn as_str(&self) -> &'static str {
        match self {
            RdfFormat::Turtle => "turtle",
            RdfFormat::NTriples => "ntriples",
        }
    }

    /// Guess the format from a file extension, defaulting to Turtle.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "nt" | "nq" => RdfFormat::NTriples,
            _ => RdfFormat::Turtle,
        }
    }
}

/// Parse an RDF document into its triples.
pub fn parse_triples(text: &str, format: RdfFormat) -> Result<Vec<Triple>, DriftlockError> {
    let mut triples = Vec::new();
    match format {
        RdfFormat::Turtle => {
            for triple in TurtleParser::new().for_reader(text.as_bytes()) {
                triples.push(triple.map_err(|e| {
                    DriftlockError::Validation(format!("Turtle parse failure: {}", e))
                })?);
            }
        }
        RdfFormat::NTriples => {
            for triple in NTriplesParser::new().for_reader(text.as_bytes()) {
                triples.push(triple.map_err(|e| {
                    DriftlockError::Validation(format!("N-Triples parse failure: {}", e))
                })?);
            }
        }
    }
    Ok(triples)
}
