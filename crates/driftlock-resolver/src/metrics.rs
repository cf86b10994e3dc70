// crates/driftlock-resolver/src/metrics.rs

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Lock-free counters maintained by the resolver.
#[derive(Debug, Default)]
pub struct ResolverMetrics {
    patches_stored: AtomicU64,
    patches_retrieved: AtomicU64,
    retrieval_nanos: AtomicU64,
}

/// Point-in-time view of the resolver counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub patches_stored: u64,
    pub patches_retrieved: u64,
    /// Mean retrieval latency in milliseconds, 0.0 before any retrieval.
    pub avg_retrieval_latency_ms: f64,
}

impl ResolverMetrics {
    pub fn record_store(&self) {
        self.patches_stored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retrieval(&self, elapsed: Duration) {
        self.patches_retrieved.fetch_add(1, Ordering::Relaxed);
        self.retrieval_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let retrieved = self.patches_retrieved.load(Ordering::Relaxed);
        let nanos = self.retrieval_nanos.load(Ordering::Relaxed);
        MetricsSnapshot {
            patches_stored: self.patches_stored.load(Ordering::Relaxed),
            patches_retrieved: retrieved,
            avg_retrieval_latency_ms: if retrieved == 0 {
                0.0
            } else {
                nanos as f64 / retrieved as f64 / 1_000_000.0
            },
        }
    }
}
