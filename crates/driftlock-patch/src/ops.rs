// crates/driftlock-patch/src/ops.rs
//
// Patch representation: a closed set of operations over JSON-pointer-like
// paths. Every consumer matches exhaustively on `PatchOp`, so adding a
// new operation kind is a compile-visible change.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path into a structured value. Segments address object keys or array
/// indices; the display form is a JSON-pointer-like `/a/0/b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PatchPath(pub Vec<String>);

impl PatchPath {
    /// The root path (whole document).
    pub fn root() -> Self {
        PatchPath(Vec::new())
    }

    /// Extend the path with an object key.
    pub fn key(&self, k: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(k.to_string());
        PatchPath(segments)
    }

    /// Extend the path with an array index.
    pub fn index(&self, i: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(i.to_string());
        PatchPath(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// Edit applied to an ordered collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ArrayEdit {
    /// Insert `value` so it ends up at `index`.
    Insertion { index: usize, value: Value },
    /// Delete the element at `index`, which must equal `old_value`.
    Deletion { index: usize, old_value: Value },
    /// Move the element at `from` to position `to`.
    Move { from: usize, to: usize },
}

/// One structural diff operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    /// Introduce a value at a path that did not exist.
    Add { path: PatchPath, value: Value },
    /// Remove the value at `path`, which must equal `old_value`.
    Remove { path: PatchPath, old_value: Value },
    /// Replace the value at `path`; the live value must equal `old_value`.
    Replace {
        path: PatchPath,
        old_value: Value,
        new_value: Value,
    },
    /// Ordered-collection edit; `path` addresses the array itself.
    ArrayOp { path: PatchPath, edit: ArrayEdit },
}

/// An ordered list of operations transforming one canonical value into
/// another. Empty iff the canonical forms are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Patch {
    pub ops: Vec<PatchOp>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Operation counts used by significance heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PatchStats {
    pub modifications: usize,
    pub additions: usize,
    pub deletions: usize,
    /// Array/collection shape changes.
    pub structural: usize,
}

impl PatchStats {
    pub fn total(&self) -> usize {
        self.modifications + self.additions + self.deletions + self.structural
    }
}

/// Count operations per bucket. Heuristic input only; correctness of
/// apply/invert never depends on these counts.
pub fn categorize(patch: &Patch) -> PatchStats {
    let mut stats = PatchStats::default();
    for op in &patch.ops {
        match op {
            PatchOp::Add { .. } => stats.additions += 1,
            PatchOp::Remove { .. } => stats.deletions += 1,
            PatchOp::Replace { .. } => stats.modifications += 1,
            PatchOp::ArrayOp { .. } => stats.structural += 1,
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_display_is_pointer_like() {
        let path = PatchPath::root().key("users").index(0).key("name");
        assert_eq!(path.to_string(), "/users/0/name");
        assert_eq!(PatchPath::root().to_string(), "/");
    }

    #[test]
    fn categorize_counts_buckets() {
        let patch = Patch {
            ops: vec![
                PatchOp::Add {
                    path: PatchPath::root().key("a"),
                    value: json!(1),
                },
                PatchOp::Remove {
                    path: PatchPath::root().key("b"),
                    old_value: json!(2),
                },
                PatchOp::Replace {
                    path: PatchPath::root().key("c"),
                    old_value: json!(3),
                    new_value: json!(4),
                },
                PatchOp::ArrayOp {
                    path: PatchPath::root().key("d"),
                    edit: ArrayEdit::Insertion {
                        index: 0,
                        value: json!(5),
                    },
                },
            ],
        };
        let stats = categorize(&patch);
        assert_eq!(stats.additions, 1);
        assert_eq!(stats.deletions, 1);
        assert_eq!(stats.modifications, 1);
        assert_eq!(stats.structural, 1);
        assert_eq!(stats.total(), 4);
    }

    #[test]
    fn patch_serialization_round_trips() {
        let patch = Patch {
            ops: vec![PatchOp::ArrayOp {
                path: PatchPath::root().key("items"),
                edit: ArrayEdit::Move { from: 2, to: 0 },
            }],
        };
        let json = serde_json::to_string(&patch).unwrap();
        let back: Patch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, patch);
    }
}
