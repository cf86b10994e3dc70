// crates/driftlock-resolver/src/significance.rs
//
// Semantic significance for generic (non-RDF) patches. RDF inputs get a
// vocabulary-weighted score from driftlock-rdf instead; this heuristic
// only looks at the shape of the patch.

use serde_json::Value;

use driftlock_patch::{categorize, Patch, PatchOp};

/// Per-bucket weights. Structural (collection-shape) changes weigh
/// highest, value replacements next, key additions/removals least.
const WEIGHT_STRUCTURAL: f64 = 1.0;
const WEIGHT_MODIFICATION: f64 = 0.6;
const WEIGHT_ADDITION: f64 = 0.4;
const WEIGHT_DELETION: f64 = 0.4;

/// Significance classification of one patch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Normalized weighted score in [0, 1].
    pub significance: f64,
    /// True when the patch changes a value's type or a declared `type`
    /// field — the strongest kind of semantic shift for generated data.
    pub type_change: bool,
    /// True when the patch changes collection shape.
    pub structural_change: bool,
}

/// Classify a generic patch.
///
/// The score is the weighted bucket sum divided by the operation count,
/// so a patch made entirely of structural changes scores 1.0 and one of
/// pure additions scores 0.4.
pub fn classify(patch: &Patch) -> Classification {
    let stats = categorize(patch);
    let total = stats.total();
    if total == 0 {
        return Classification {
            significance: 0.0,
            type_change: false,
            structural_change: false,
        };
    }

    let weighted = stats.structural as f64 * WEIGHT_STRUCTURAL
        + stats.modifications as f64 * WEIGHT_MODIFICATION
        + stats.additions as f64 * WEIGHT_ADDITION
        + stats.deletions as f64 * WEIGHT_DELETION;

    Classification {
        significance: (weighted / total as f64).min(1.0),
        type_change: patch.ops.iter().any(is_type_change),
        structural_change: stats.structural > 0,
    }
}

/// A replace is a type change when the JSON kind of the value flips, or
/// when the replaced field is itself a type declaration (`type`/`@type`).
fn is_type_change(op: &PatchOp) -> bool {
    match op {
        PatchOp::Replace {
            path,
            old_value,
            new_value,
        } => {
            kind_tag(old_value) != kind_tag(new_value)
                || matches!(path.0.last().map(String::as_str), Some("type") | Some("@type"))
        }
        _ => false,
    }
}

fn kind_tag(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
