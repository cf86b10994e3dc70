// crates/driftlock-patch/src/lib.rs
//
// driftlock-patch: Canonicalization and patch algebra for Driftlock.
//
// Provides the canonical form for structured (non-RDF) data and the
// diff/apply/invert operations shared by the generic drift resolver and
// the RDF processor. Guarantees: `diff` of equivalent values is empty,
// `apply(baseline, diff(baseline, current))` reproduces `current`, and
// `apply(apply(x, p), invert(p))` restores `x`.

pub mod apply;
pub mod canonical;
pub mod diff;
pub mod ops;

// Re-export key functions and types for ergonomic access.
pub use apply::apply;
pub use canonical::{canonical_text, canonicalize, equivalent};
pub use diff::{diff, invert};
pub use ops::{categorize, ArrayEdit, Patch, PatchOp, PatchPath, PatchStats};
