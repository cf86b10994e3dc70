// crates/driftlock-store/src/lib.rs
//
// driftlock-store: Content-addressed storage for Driftlock.
//
// Persists immutable byte blobs keyed by the SHA-256 of their content.
// Writes are atomic (stage + rename) and idempotent; reads verify the
// content against the filename-derived ID. A retention sweep evicts
// stale blobs while honoring pins from unexpired reports.

pub mod cas;
pub mod config;

// Re-export key types for ergonomic access from downstream crates.
pub use cas::{ContentStore, StoreOccupancy};
pub use config::StoreConfig;
