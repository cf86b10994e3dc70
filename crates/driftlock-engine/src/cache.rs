// crates/driftlock-engine/src/cache.rs
//
// Engine-scoped baseline content cache. The RDF processor needs the
// lockfile-recorded content of a modified file; that content lives in a
// baseline blob store written at snapshot time, keyed by the lockfile
// hash. The cache bounds repeated reads with an explicit capacity and
// TTL scoped to one engine instance, never a process-wide singleton.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use driftlock_store::ContentStore;

struct CacheEntry {
    content: String,
    inserted: Instant,
}

/// Bounded, TTL'd cache over a baseline blob store.
pub struct BaselineCache {
    store: Option<ContentStore>,
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: usize,
    ttl: Duration,
}

impl BaselineCache {
    pub fn new(store: Option<ContentStore>, capacity: usize, ttl: Duration) -> Self {
        Self {
            store,
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Fetch baseline content by its lockfile hash.
    ///
    /// Returns `None` when no baseline store is configured, the blob is
    /// absent, or the blob is not valid UTF-8 text.
    pub fn get(&self, hash: &str) -> Option<String> {
        if let Ok(mut entries) = self.entries.lock() {
            if let Some(entry) = entries.get(hash) {
                if entry.inserted.elapsed() < self.ttl {
                    return Some(entry.content.clone());
                }
                entries.remove(hash);
            }
        }

        let store = self.store.as_ref()?;
        let bytes = match store.get(hash) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(hash, "baseline content unavailable: {}", e);
                return None;
            }
        };
        let content = String::from_utf8(bytes).ok()?;
        self.insert(hash, content.clone());
        Some(content)
    }

    fn insert(&self, hash: &str, content: String) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if entries.len() >= self.capacity {
            // Evict the oldest entry to stay within capacity.
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            hash.to_string(),
            CacheEntry {
                content,
                inserted: Instant::now(),
            },
        );
    }
}
