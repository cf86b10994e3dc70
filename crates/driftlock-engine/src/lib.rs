// crates/driftlock-engine/src/lib.rs
//
// driftlock-engine: Drift detection engine for Driftlock.
//
// Compares a directory tree against its lockfile snapshot over a bounded
// async worker pool, layering SHACL validation, canonical RDF analysis,
// and attestation verification on top of hash comparison, and produces a
// deterministic drift report with recommendations.

pub mod cache;
pub mod config;
pub mod engine;
pub mod observer;
pub mod summary;
pub mod walk;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use driftlock_engine::DriftEngine;`

// Engine
pub use engine::DriftEngine;

// Configuration
pub use config::DetectionConfig;

// Progress and cancellation
pub use observer::{CancellationFlag, DriftObserver, NullObserver, PathState};

// Baseline content cache
pub use cache::BaselineCache;
