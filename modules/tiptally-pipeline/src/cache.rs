use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::info;

use tiptally_common::{CacheStats, ContentFingerprint, ExtractionResult};

/// Content-addressed cache of extraction results.
///
/// Entries expire after the configured time-to-live and are removed lazily
/// when a lookup finds them stale. Size is otherwise unbounded. Shared by all
/// concurrent pipeline invocations; entries are immutable snapshots, and the
/// cache alone owns them.
pub struct ContentCache {
    entries: RwLock<HashMap<ContentFingerprint, CacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

struct CacheEntry {
    result: ExtractionResult,
    inserted_at: Instant,
}

impl ContentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a result. An entry older than the TTL counts as a miss and is
    /// removed on the way out.
    pub async fn get(&self, fingerprint: &ContentFingerprint) -> Option<ExtractionResult> {
        {
            let entries = self.entries.read().await;
            match entries.get(fingerprint) {
                Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.result.clone());
                }
                Some(_) => {} // expired: fall through to remove under the write lock
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        }

        let mut entries = self.entries.write().await;
        // Re-check: a concurrent put may have refreshed the entry.
        if let Some(entry) = entries.get(fingerprint) {
            if entry.inserted_at.elapsed() >= self.ttl {
                entries.remove(fingerprint);
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a result, overwriting any entry for the same fingerprint with a
    /// fresh insertion time.
    pub async fn put(&self, fingerprint: ContentFingerprint, result: ExtractionResult) {
        let mut entries = self.entries.write().await;
        entries.insert(
            fingerprint,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Clear all entries. Returns how many were removed.
    pub async fn flush(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        info!(removed, "Cache flushed");
        removed
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        CacheStats {
            entries: entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
