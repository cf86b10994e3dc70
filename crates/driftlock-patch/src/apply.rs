// crates/driftlock-patch/src/apply.rs
//
// Patch application with stale-baseline detection. Every destructive
// operation carries the value it expects to find; a mismatch means the
// patch was produced against a different baseline and application fails
// with an integrity error instead of corrupting the value.

use serde_json::Value;

use driftlock_core::DriftlockError;

use crate::canonical::canonicalize;
use crate::ops::{ArrayEdit, Patch, PatchOp, PatchPath};

/// Apply a patch to `baseline`, returning the canonical result.
///
/// Deterministic and total for any patch produced by `diff`: the result
/// equals the canonical form of the value the patch was diffed against.
pub fn apply(baseline: &Value, patch: &Patch) -> Result<Value, DriftlockError> {
    let mut value = canonicalize(baseline);
    for op in &patch.ops {
        apply_op(&mut value, op)?;
    }
    Ok(value)
}

fn apply_op(root: &mut Value, op: &PatchOp) -> Result<(), DriftlockError> {
    match op {
        PatchOp::Add { path, value } => {
            let (parent, key) = split_parent(root, path)?;
            match parent {
                Value::Object(map) => {
                    if map.contains_key(key) {
                        return Err(stale(path, "add target already exists"));
                    }
                    map.insert(key.to_string(), value.clone());
                    Ok(())
                }
                _ => Err(stale(path, "add parent is not an object")),
            }
        }
        PatchOp::Remove { path, old_value } => {
            let (parent, key) = split_parent(root, path)?;
            match parent {
                Value::Object(map) => match map.get(key) {
                    Some(live) if live == old_value => {
                        map.remove(key);
                        Ok(())
                    }
                    Some(_) => Err(stale(path, "remove target does not match expected value")),
                    None => Err(stale(path, "remove target is missing")),
                },
                _ => Err(stale(path, "remove parent is not an object")),
            }
        }
        PatchOp::Replace {
            path,
            old_value,
            new_value,
        } => {
            let live = resolve_mut(root, path)?;
            if live != old_value {
                return Err(stale(path, "replace target does not match expected value"));
            }
            *live = new_value.clone();
            Ok(())
        }
        PatchOp::ArrayOp { path, edit } => {
            let live = resolve_mut(root, path)?;
            let items = match live {
                Value::Array(items) => items,
                _ => return Err(stale(path, "array op target is not an array")),
            };
            match edit {
                ArrayEdit::Insertion { index, value } => {
                    if *index > items.len() {
                        return Err(stale(path, "insertion index out of bounds"));
                    }
                    items.insert(*index, value.clone());
                    Ok(())
                }
                ArrayEdit::Deletion { index, old_value } => {
                    if *index >= items.len() {
                        return Err(stale(path, "deletion index out of bounds"));
                    }
                    if &items[*index] != old_value {
                        return Err(stale(path, "deletion target does not match expected value"));
                    }
                    items.remove(*index);
                    Ok(())
                }
                ArrayEdit::Move { from, to } => {
                    if *from >= items.len() || *to >= items.len() {
                        return Err(stale(path, "move index out of bounds"));
                    }
                    let item = items.remove(*from);
                    items.insert(*to, item);
                    Ok(())
                }
            }
        }
    }
}

fn stale(path: &PatchPath, reason: &str) -> DriftlockError {
    DriftlockError::Integrity(format!("Stale patch at {}: {}", path, reason))
}

/// Resolve a path to the value it addresses.
fn resolve_mut<'a>(root: &'a mut Value, path: &PatchPath) -> Result<&'a mut Value, DriftlockError> {
    let mut current = root;
    for segment in &path.0 {
        current = descend(current, segment)
            .ok_or_else(|| stale(path, "path does not resolve in baseline"))?;
    }
    Ok(current)
}

/// Resolve a path to its parent plus the final segment. Root has no
/// parent, so a root path is rejected here (root edits are `Replace`).
fn split_parent<'a>(
    root: &'a mut Value,
    path: &'a PatchPath,
) -> Result<(&'a mut Value, &'a str), DriftlockError> {
    let (last, parents) = path
        .0
        .split_last()
        .ok_or_else(|| stale(path, "operation needs a parent path"))?;
    let mut current = root;
    for segment in parents {
        current = descend(current, segment)
            .ok_or_else(|| stale(path, "path does not resolve in baseline"))?;
    }
    Ok((current, last.as_str()))
}

fn descend<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => {
            let index: usize = segment.parse().ok()?;
            items.get_mut(index)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::canonical_text;
    use crate::diff::{diff, invert};
    use serde_json::json;

    fn round_trip(a: Value, b: Value) {
        let patch = diff(&a, &b);
        let result = apply(&a, &patch).unwrap();
        assert_eq!(
            canonical_text(&result),
            canonical_text(&b),
            "apply(diff(a, b)) must reproduce b"
        );

        let inverse = invert(&patch);
        let restored = apply(&result, &inverse).unwrap();
        assert_eq!(
            canonical_text(&restored),
            canonical_text(&a),
            "apply(invert) must restore a"
        );
    }

    #[test]
    fn round_trips_scalars_and_objects() {
        round_trip(json!({"type": "Person"}), json!({"type": "Organization"}));
        round_trip(json!({"a": 1}), json!({"a": 1, "b": {"c": [1, 2]}}));
        round_trip(json!({"x": {"deep": true}}), json!({"x": {"deep": false}}));
    }

    #[test]
    fn round_trips_array_shapes() {
        round_trip(json!([1, 2, 3]), json!([1, 3]));
        round_trip(json!([]), json!([1, 2, 3]));
        round_trip(json!([1, 2, 3, 4]), json!([4, 3, 2, 1]));
        round_trip(json!({"list": [1, 2]}), json!({"list": [2, 2, 2]}));
    }

    #[test]
    fn round_trips_mixed_documents() {
        round_trip(
            json!({"nodes": [{"id": "a", "label": "A"}], "edges": []}),
            json!({"nodes": [{"id": "a", "label": "A2"}, {"id": "b", "label": "B"}], "edges": [["a", "b"]]}),
        );
    }

    #[test]
    fn stale_replace_is_integrity_error() {
        let patch = diff(&json!({"v": 1}), &json!({"v": 2}));
        // Live value drifted to 3, so the expected old value 1 mismatches.
        let err = apply(&json!({"v": 3}), &patch).unwrap_err();
        assert!(matches!(err, DriftlockError::Integrity(_)));
    }

    #[test]
    fn stale_array_deletion_is_integrity_error() {
        let patch = diff(&json!([1, 2, 3]), &json!([1, 3]));
        let err = apply(&json!([1, 9, 3]), &patch).unwrap_err();
        assert!(matches!(err, DriftlockError::Integrity(_)));
    }

    #[test]
    fn move_edit_applies_and_inverts() {
        let patch = Patch {
            ops: vec![PatchOp::ArrayOp {
                path: PatchPath::root(),
                edit: ArrayEdit::Move { from: 0, to: 2 },
            }],
        };
        let moved = apply(&json!([1, 2, 3]), &patch).unwrap();
        assert_eq!(moved, json!([2, 3, 1]));
        let restored = apply(&moved, &invert(&patch)).unwrap();
        assert_eq!(restored, json!([1, 2, 3]));
    }

    #[test]
    fn empty_patch_is_identity() {
        let value = json!({"a": [1, {"b": 2}]});
        let result = apply(&value, &Patch::default()).unwrap();
        assert_eq!(canonical_text(&result), canonical_text(&value));
    }
}
