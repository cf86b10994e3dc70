// crates/driftlock-resolver/src/lib.rs
//
// driftlock-resolver: drift:// identifiers over the content-addressed
// store. Builds on the patch algebra to store, retrieve, apply, and
// invert structural diffs, classifying each patch's semantic
// significance to pick its URI scheme.

pub mod metrics;
pub mod resolver;
pub mod significance;
pub mod uri;

// Re-export key types for ergonomic access from downstream crates.
pub use metrics::{MetricsSnapshot, ResolverMetrics};
pub use resolver::{
    ApplyOutcome, DriftResolver, InputKind, PatchMeta, PatchRecord, PatchSource, ResolverConfig,
    StorePatchOutcome,
};
pub use significance::{classify, Classification};
pub use uri::{DriftUri, UriScheme};
