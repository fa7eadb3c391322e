//! In-memory cache of scaled covers.
//!
//! Bounded by entry count and by pixel bytes; the least recently used
//! entry goes first. Also tracks recent download failures so a broken
//! cover URL isn't hammered on every repaint.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use super::key::RequestKey;
use super::scale::{CoverImage, Size};

/// Memory cache key: the same cover at two sizes is two entries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub request: RequestKey,
    pub size: Size,
}

impl CacheKey {
    pub fn new(request: RequestKey, size: Size) -> Self {
        Self { request, size }
    }
}

struct Entries {
    lru: LruCache<CacheKey, Arc<CoverImage>>,
    bytes: usize,
}

/// Thread-safe LRU of scaled covers.
pub struct MemoryCache {
    entries: Mutex<Entries>,
    /// 0 = no byte limit
    max_bytes: usize,
}

impl MemoryCache {
    /// `max_entries` of 0 is treated as 1.
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(Entries {
                lru: LruCache::new(capacity),
                bytes: 0,
            }),
            max_bytes,
        }
    }

    /// Look up a cover, marking it as recently used.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CoverImage>> {
        self.entries.lock().lru.get(key).cloned()
    }

    /// Check for a cover without touching its recency.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().lru.contains(key)
    }

    /// Insert a cover, evicting older entries to stay within bounds.
    ///
    /// A single cover bigger than the byte limit is not cached at all.
    pub fn insert(&self, key: CacheKey, image: Arc<CoverImage>) {
        let size = image.byte_len();
        if self.max_bytes > 0 && size > self.max_bytes {
            tracing::debug!(
                "Cover {} ({} bytes) exceeds cache limit of {} bytes, not caching",
                key.size,
                size,
                self.max_bytes
            );
            return;
        }

        let mut guard = self.entries.lock();
        let entries = &mut *guard;

        // push returns either the replaced value for this key or the evicted LRU entry
        if let Some((_, displaced)) = entries.lru.push(key, image) {
            entries.bytes = entries.bytes.saturating_sub(displaced.byte_len());
        }
        entries.bytes += size;

        while self.max_bytes > 0 && entries.bytes > self.max_bytes {
            let Some((_, evicted)) = entries.lru.pop_lru() else {
                break;
            };
            entries.bytes = entries.bytes.saturating_sub(evicted.byte_len());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total pixel bytes currently held
    pub fn bytes(&self) -> usize {
        self.entries.lock().bytes
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.lru.clear();
        entries.bytes = 0;
    }
}

/// Remembers which requests failed to download, and when.
pub struct FailureLog {
    failures: Mutex<HashMap<RequestKey, Instant>>,
    cooldown: Duration,
}

impl FailureLog {
    /// A zero cool-down disables the log.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            failures: Mutex::new(HashMap::new()),
            cooldown,
        }
    }

    pub fn record(&self, key: RequestKey) {
        if self.cooldown.is_zero() {
            return;
        }
        let mut failures = self.failures.lock();
        let cooldown = self.cooldown;
        failures.retain(|_, failed_at| failed_at.elapsed() < cooldown);
        failures.insert(key, Instant::now());
    }

    /// True while the last failure for `key` is within the cool-down window
    pub fn is_cooling_down(&self, key: &RequestKey) -> bool {
        let mut failures = self.failures.lock();
        match failures.get(key) {
            Some(failed_at) if failed_at.elapsed() < self.cooldown => true,
            Some(_) => {
                failures.remove(key);
                false
            }
            None => false,
        }
    }

    pub fn forget(&self, key: &RequestKey) {
        self.failures.lock().remove(key);
    }
}
