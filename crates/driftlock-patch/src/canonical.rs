// crates/driftlock-patch/src/canonical.rs
//
// Canonicalization of structured (non-RDF) data. Mapping keys are sorted,
// number formatting is normalized, and array order is left intact: for
// plain structured data, element order is semantically meaningful.
//
// Two values have equal canonical text iff they are structurally
// equivalent, which is the equality the resolver and patch algebra
// operate on.

use serde_json::{Map, Number, Value};

/// Normalize a value into its canonical form.
///
/// Objects are rebuilt with sorted keys, integral floats collapse to
/// integers (`1.0` and `1` canonicalize identically), and arrays keep
/// their order with each element canonicalized in place.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: Vec<(&String, &Value)> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = Map::new();
            for (k, v) in sorted {
                out.insert(k.clone(), canonicalize(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        Value::Number(n) => Value::Number(canonical_number(n)),
        other => other.clone(),
    }
}

/// Collapse integral floats to integers so `2.0 == 2` canonically.
fn canonical_number(n: &Number) -> Number {
    if let Some(f) = n.as_f64() {
        if n.as_i64().is_none() && n.as_u64().is_none() && f.fract() == 0.0 {
            if f >= 0.0 && f <= u64::MAX as f64 {
                return Number::from(f as u64);
            }
            if f < 0.0 && f >= i64::MIN as f64 {
                return Number::from(f as i64);
            }
        }
    }
    n.clone()
}

/// Compact canonical text of a value. Whitespace-free, keys sorted.
pub fn canonical_text(value: &Value) -> String {
    // Compact serde_json output carries no whitespace; with sorted keys
    // the text is a canonical form.
    serde_json::to_string(&canonicalize(value)).unwrap_or_else(|_| "null".to_string())
}

/// Structural equivalence: equal canonical forms.
pub fn equivalent(a: &Value, b: &Value) -> bool {
    canonicalize(a) == canonicalize(b)
}
