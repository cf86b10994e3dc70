// crates/driftlock-patch/src/diff.rs
//
// Structural diff between two canonical values.
//
// Objects diff key-by-key. Arrays trim a common prefix and suffix first;
// an equal-length middle diffs element-wise, an unequal-length middle
// becomes deletions followed by insertions at the splice point. The
// resulting operation list applied in order transforms baseline into
// current exactly (see apply.rs for the round-trip guarantee).

use serde_json::Value;

use crate::canonical::canonicalize;
use crate::ops::{ArrayEdit, Patch, PatchOp, PatchPath};

/// Compute the patch transforming `baseline` into `current`.
///
/// Both inputs are canonicalized first, so cosmetic differences (key
/// order, number formatting) produce an empty patch.
pub fn diff(baseline: &Value, current: &Value) -> Patch {
    let baseline = canonicalize(baseline);
    let current = canonicalize(current);
    let mut ops = Vec::new();
    diff_value(&baseline, &current, &PatchPath::root(), &mut ops);
    Patch { ops }
}

fn diff_value(baseline: &Value, current: &Value, path: &PatchPath, ops: &mut Vec<PatchOp>) {
    if baseline == current {
        return;
    }
    match (baseline, current) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            // Canonical objects iterate in sorted key order.
            for (key, old_value) in old_map {
                match new_map.get(key) {
                    Some(new_value) => diff_value(old_value, new_value, &path.key(key), ops),
                    None => ops.push(PatchOp::Remove {
                        path: path.key(key),
                        old_value: old_value.clone(),
                    }),
                }
            }
            for (key, new_value) in new_map {
                if !old_map.contains_key(key) {
                    ops.push(PatchOp::Add {
                        path: path.key(key),
                        value: new_value.clone(),
                    });
                }
            }
        }
        (Value::Array(old_items), Value::Array(new_items)) => {
            diff_array(old_items, new_items, path, ops);
        }
        (old_value, new_value) => ops.push(PatchOp::Replace {
            path: path.clone(),
            old_value: old_value.clone(),
            new_value: new_value.clone(),
        }),
    }
}

fn diff_array(old_items: &[Value], new_items: &[Value], path: &PatchPath, ops: &mut Vec<PatchOp>) {
    // Trim the common prefix.
    let mut start = 0;
    while start < old_items.len() && start < new_items.len() && old_items[start] == new_items[start]
    {
        start += 1;
    }
    // Trim the common suffix, never overlapping the prefix.
    let mut old_end = old_items.len();
    let mut new_end = new_items.len();
    while old_end > start && new_end > start && old_items[old_end - 1] == new_items[new_end - 1] {
        old_end -= 1;
        new_end -= 1;
    }

    let old_mid = &old_items[start..old_end];
    let new_mid = &new_items[start..new_end];

    if old_mid.len() == new_mid.len() {
        // Same shape: element-wise diff keeps changes minimal.
        for (offset, (old_value, new_value)) in old_mid.iter().zip(new_mid.iter()).enumerate() {
            diff_value(old_value, new_value, &path.index(start + offset), ops);
        }
        return;
    }

    // Shape change: delete the old middle (index stays fixed as elements
    // shift down), then insert the new middle.
    for old_value in old_mid {
        ops.push(PatchOp::ArrayOp {
            path: path.clone(),
            edit: ArrayEdit::Deletion {
                index: start,
                old_value: old_value.clone(),
            },
        });
    }
    for (offset, new_value) in new_mid.iter().enumerate() {
        ops.push(PatchOp::ArrayOp {
            path: path.clone(),
            edit: ArrayEdit::Insertion {
                index: start + offset,
                value: new_value.clone(),
            },
        });
    }
}

/// Compute the reverse of a patch produced by `diff`.
///
/// Applying a patch and then its inverse restores the canonical baseline.
/// Operations are reversed in order and each op swaps its direction.
pub fn invert(patch: &Patch) -> Patch {
    let ops = patch
        .ops
        .iter()
        .rev()
        .map(|op| match op {
            PatchOp::Add { path, value } => PatchOp::Remove {
                path: path.clone(),
                old_value: value.clone(),
            },
            PatchOp::Remove { path, old_value } => PatchOp::Add {
                path: path.clone(),
                value: old_value.clone(),
            },
            PatchOp::Replace {
                path,
                old_value,
                new_value,
            } => PatchOp::Replace {
                path: path.clone(),
                old_value: new_value.clone(),
                new_value: old_value.clone(),
            },
            PatchOp::ArrayOp { path, edit } => PatchOp::ArrayOp {
                path: path.clone(),
                edit: match edit {
                    ArrayEdit::Insertion { index, value } => ArrayEdit::Deletion {
                        index: *index,
                        old_value: value.clone(),
                    },
                    ArrayEdit::Deletion { index, old_value } => ArrayEdit::Insertion {
                        index: *index,
                        value: old_value.clone(),
                    },
                    ArrayEdit::Move { from, to } => ArrayEdit::Move {
                        from: *to,
                        to: *from,
                    },
                },
            },
        })
        .collect();
    Patch { ops }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_values_yield_empty_patch() {
        let a = json!({"b": 1, "a": [1, 2]});
        let b = json!({"a": [1, 2], "b": 1.0});
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn scalar_change_is_replace() {
        let patch = diff(&json!({"type": "Person"}), &json!({"type": "Organization"}));
        assert_eq!(patch.len(), 1);
        assert!(matches!(patch.ops[0], PatchOp::Replace { .. }));
    }

    #[test]
    fn added_and_removed_keys() {
        let patch = diff(&json!({"a": 1, "b": 2}), &json!({"b": 2, "c": 3}));
        let stats = crate::ops::categorize(&patch);
        assert_eq!(stats.deletions, 1);
        assert_eq!(stats.additions, 1);
        assert_eq!(stats.modifications, 0);
    }

    #[test]
    fn array_growth_is_structural() {
        let patch = diff(&json!([1, 2, 3]), &json!([1, 2, 3, 4]));
        assert_eq!(patch.len(), 1);
        match &patch.ops[0] {
            PatchOp::ArrayOp {
                edit: ArrayEdit::Insertion { index, value },
                ..
            } => {
                assert_eq!(*index, 3);
                assert_eq!(value, &json!(4));
            }
            other => panic!("expected insertion, got {:?}", other),
        }
    }

    #[test]
    fn equal_length_array_change_recurses() {
        let patch = diff(&json!([{"n": 1}, {"n": 2}]), &json!([{"n": 1}, {"n": 9}]));
        assert_eq!(patch.len(), 1);
        match &patch.ops[0] {
            PatchOp::Replace { path, .. } => assert_eq!(path.to_string(), "/1/n"),
            other => panic!("expected replace, got {:?}", other),
        }
    }

    #[test]
    fn invert_mirrors_every_op() {
        let patch = diff(&json!({"a": 1, "list": [1, 2]}), &json!({"b": 2, "list": [1]}));
        let inverse = invert(&patch);
        assert_eq!(inverse.len(), patch.len());
        let stats = crate::ops::categorize(&patch);
        let inverse_stats = crate::ops::categorize(&inverse);
        assert_eq!(stats.additions, inverse_stats.deletions);
        assert_eq!(stats.deletions, inverse_stats.additions);
        assert_eq!(stats.structural, inverse_stats.structural);
    }
}
