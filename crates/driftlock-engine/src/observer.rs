// crates/driftlock-engine/src/observer.rs
//
// Progress notification interface. The engine stays decoupled from any
// CLI or logging framework by pushing per-file and final-report events
// through an injected observer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use driftlock_core::DriftReport;

/// Terminal state of one path within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    Unchanged,
    Modified,
    Deleted,
    Added,
    /// Hashing or validation failed; the file's result was degraded.
    Degraded,
}

/// Observer of detection progress.
///
/// Implementations must be cheap and non-blocking; the engine calls them
/// inline as results arrive.
pub trait DriftObserver: Send + Sync {
    /// One path reached its terminal state.
    fn on_file_processed(&self, path: &str, state: PathState);

    /// The run finished (complete or cancelled) and the report is final.
    fn on_complete(&self, report: &DriftReport);
}

/// Observer that discards all events.
#[derive(Debug, Default)]
pub struct NullObserver;

impl DriftObserver for NullObserver {
    fn on_file_processed(&self, _path: &str, _state: PathState) {}
    fn on_complete(&self, _report: &DriftReport) {}
}

/// Cooperative cancellation signal for `detect_drift`.
///
/// Cancellation between files leaves already-collected results intact;
/// the engine returns a partial report marked incomplete rather than
/// failing.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
