//! Memoizing result cache with per-key single flight.
//!
//! Entries hold the result coverage weakly and its pixel buffer strongly.
//! The weak handle lets callers control the lifetime of result objects:
//! once the last external strong reference drops, the entry is dead and
//! the next lookup recomputes. The strong buffer pin is owned by the
//! entry itself and released on eviction or replacement, so no other
//! reference-counted owner can dispose pixel data out from under a live
//! entry.
//!
//! Computation is guarded per key, not globally. Concurrent calls for
//! the same key block on one mutex and re-check the map after acquiring
//! it; calls for distinct keys never contend beyond the brief map locks.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use coverage_common::{Coverage, PixelBuffer};
use lru::LruCache;
use tracing::{debug, info};

use crate::error::Result;
use crate::executor::OperationExecutor;
use crate::params::{CacheKey, ParameterSet};

struct CacheEntry {
    coverage: Weak<Coverage>,
    pin: Arc<PixelBuffer>,
}

/// Statistics about the result cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub memory_bytes: u64,
    pub evictions: u64,
    pub reclaimed: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU-bounded cache of operation results keyed by resolved parameters.
///
/// `hits` counts calls served from the cache, `misses` calls that ran
/// the operation; a call that waits out another thread's computation and
/// then reads its result counts as a hit.
pub struct ResultCache {
    executor: OperationExecutor,
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    in_flight: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    reclaimed: AtomicU64,
}

impl ResultCache {
    /// A cache over the given executor tracking at most `capacity`
    /// results.
    pub fn new(executor: OperationExecutor, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is nonzero");
        Self {
            executor,
            entries: Mutex::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            reclaimed: AtomicU64::new(0),
        }
    }

    pub fn executor(&self) -> &OperationExecutor {
        &self.executor
    }

    /// Run a named operation, serving a previously computed result when
    /// one is still alive under the same key.
    ///
    /// Lookup and parameter resolution errors surface before the cache
    /// is touched, so a failed call leaves no trace.
    pub fn apply(&self, name: &str, params: &ParameterSet) -> Result<Arc<Coverage>> {
        let descriptor = self.executor.registry().lookup(name)?;
        let resolved = descriptor.resolve(params)?;
        let key = resolved.cache_key();

        if let Some(coverage) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(operation = %name, key = %key, "Result cache hit");
            return Ok(coverage);
        }

        let lock = self.key_lock(&key);
        let guard = lock.lock().expect("key lock poisoned");

        // Another thread may have stored the result while this one
        // waited on the key lock.
        if let Some(coverage) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(operation = %name, key = %key, "Result cache hit");
            drop(guard);
            self.prune_key_lock(&key, lock);
            return Ok(coverage);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(operation = %name, key = %key, "Result cache miss");
        let outcome = self.executor.run(&descriptor, &resolved);
        if let Ok(coverage) = &outcome {
            self.store(key.clone(), coverage);
        }

        drop(guard);
        self.prune_key_lock(&key, lock);
        outcome
    }

    /// Drop entries whose coverage has already been released by every
    /// caller. Returns the number of entries removed.
    pub fn purge_reclaimed(&self) -> usize {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let dead: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| entry.coverage.upgrade().is_none())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &dead {
            entries.pop(key);
        }
        if !dead.is_empty() {
            self.reclaimed.fetch_add(dead.len() as u64, Ordering::Relaxed);
            debug!(purged = dead.len(), "Purged reclaimed cache entries");
        }
        dead.len()
    }

    /// Drop every entry. Returns the number of entries removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let count = entries.len();
        entries.clear();
        count
    }

    /// Get cache statistics.
    ///
    /// `memory_bytes` counts the pixel data pinned by live entries.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().expect("cache lock poisoned");
        let memory_bytes = entries
            .iter()
            .map(|(_, entry)| (entry.pin.samples().len() * std::mem::size_of::<f32>()) as u64)
            .sum();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: entries.len(),
            memory_bytes,
            evictions: self.evictions.load(Ordering::Relaxed),
            reclaimed: self.reclaimed.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look a key up, discarding the entry when its coverage is gone.
    fn lookup(&self, key: &CacheKey) -> Option<Arc<Coverage>> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) => match entry.coverage.upgrade() {
                Some(coverage) => Some(coverage),
                None => {
                    entries.pop(key);
                    self.reclaimed.fetch_add(1, Ordering::Relaxed);
                    None
                }
            },
            None => None,
        }
    }

    fn store(&self, key: CacheKey, coverage: &Arc<Coverage>) {
        let entry = CacheEntry {
            coverage: Arc::downgrade(coverage),
            pin: Arc::clone(coverage.buffer()),
        };
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        if let Some((evicted_key, _)) = entries.push(key.clone(), entry) {
            // push returns the displaced pair: the old entry when the key
            // matches, or the least recently used entry at capacity.
            if evicted_key != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                info!(
                    operation = evicted_key.operation(),
                    entries = entries.len(),
                    "Evicted least recently used coverage result"
                );
            }
        }
    }

    /// Fetch or create the single-flight lock for a key.
    fn key_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut locks = self.in_flight.lock().expect("lock table poisoned");
        locks.entry(key.clone()).or_default().clone()
    }

    /// Drop a key lock handle and remove the table slot when no other
    /// thread holds one. Removal happens under the table lock, which
    /// every acquisition also goes through, so a new waiter cannot clone
    /// the slot while it is being pruned.
    fn prune_key_lock(&self, key: &CacheKey, lock: Arc<Mutex<()>>) {
        let mut locks = self.in_flight.lock().expect("lock table poisoned");
        drop(lock);
        if let Some(slot) = locks.get(key) {
            if Arc::strong_count(slot) == 1 {
                locks.remove(key);
            }
        }
    }
}
