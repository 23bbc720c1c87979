//! Intelligent cache - TTL-bounded LRU memoization for hot lookups.
//!
//! Keeps category filters and letter distributions warm so repeated
//! generation calls stay well inside a frame budget.
//!
//! ## Flow
//! ```text
//! get(key) → [LruCache] → fresh?   hit (promote, bump access count)
//!                       → expired? remove, count expiration + miss
//!                       → absent?  miss
//! set(key) → at capacity? evict least-recently-used → insert
//! ```
//!
//! Specializations (category cache, letter cache) are just different
//! [`CacheProfile`]s over the same type.

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::constants::{
    CATEGORY_CACHE_SIZE, CATEGORY_CACHE_TTL_MS, LETTER_CACHE_SIZE, LETTER_CACHE_TTL_MS,
};
use crate::storage::{save_json, Storage, StorageResult};

// ============================================================================
// Clock
// ============================================================================

/// Monotonic time source for cache bookkeeping
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary, fixed origin
    fn now(&self) -> Duration;
}

pub type SharedClock = Arc<dyn Clock>;

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock for tests and replays
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, at: Duration) {
        self.nanos.store(at.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

// ============================================================================
// Profiles & bookkeeping
// ============================================================================

/// TTL and capacity for one cache specialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheProfile {
    pub ttl_ms: u64,
    pub max_size: usize,
}

impl CacheProfile {
    /// Category filter/search results
    pub fn categories() -> Self {
        Self {
            ttl_ms: CATEGORY_CACHE_TTL_MS,
            max_size: CATEGORY_CACHE_SIZE,
        }
    }

    /// Letter sampling distributions
    pub fn letter_weights() -> Self {
        Self {
            ttl_ms: LETTER_CACHE_TTL_MS,
            max_size: LETTER_CACHE_SIZE,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

/// A cached value plus access bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Duration,
    pub last_access_at: Duration,
    pub access_count: u64,
}

/// Counters exposed by [`IntelligentCache::get_stats`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub inserts: u64,
    pub size: usize,
    pub capacity: usize,
    pub hit_rate: f64,
}

// ============================================================================
// Cache
// ============================================================================

/// Generic key → value cache with TTL expiry and LRU eviction
pub struct IntelligentCache<K: Hash + Eq, V> {
    entries: LruCache<K, CacheEntry<V>>,
    ttl: Duration,
    clock: SharedClock,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
    inserts: u64,
}

impl<K: Hash + Eq + Clone, V: Clone> IntelligentCache<K, V> {
    /// A zero `max_size` is treated as 1.
    pub fn new(profile: CacheProfile, clock: SharedClock) -> Self {
        let capacity = NonZeroUsize::new(profile.max_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl: profile.ttl(),
            clock,
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
            inserts: 0,
        }
    }

    /// Cached value if present and fresh. Expired entries are dropped on read.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let ttl = self.ttl;

        let expired = match self.entries.get_mut(key) {
            Some(entry) if now.saturating_sub(entry.created_at) < ttl => {
                entry.last_access_at = now;
                entry.access_count += 1;
                self.hits += 1;
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.pop(key);
            self.expirations += 1;
        }
        self.misses += 1;
        None
    }

    /// Insert or replace. At capacity the least-recently-used entry goes first.
    pub fn set(&mut self, key: K, value: V) {
        let now = self.clock.now();
        let entry = CacheEntry {
            value,
            created_at: now,
            last_access_at: now,
            access_count: 0,
        };

        if let Some((displaced, _)) = self.entries.push(key.clone(), entry) {
            if displaced != key {
                self.evictions += 1;
                debug!("Cache evicted least-recently-used entry");
            }
        }
        self.inserts += 1;
    }

    /// Entry bookkeeping without touching recency or counters
    pub fn peek_entry(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.entries.peek(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.pop(key).map(|entry| entry.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove every expired entry. Returns how many were removed.
    /// Running it twice in a row is harmless: the second pass finds nothing.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;

        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| now.saturating_sub(entry.created_at) >= ttl)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.pop(key);
        }
        self.expirations += expired.len() as u64;

        if !expired.is_empty() {
            debug!(removed = expired.len(), "Cache sweep removed expired entries");
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            expirations: self.expirations,
            inserts: self.inserts,
            size: self.entries.len(),
            capacity: self.entries.cap().get(),
            hit_rate: if lookups == 0 {
                0.0
            } else {
                self.hits as f64 / lookups as f64
            },
        }
    }

    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
        self.expirations = 0;
        self.inserts = 0;
    }
}

// ============================================================================
// Periodic sweep
// ============================================================================

/// Something holding a cache that can be swept without blocking
pub trait Sweepable {
    /// Remove expired entries. `None` when a sweep is already in progress.
    fn try_sweep(&self) -> Option<usize>;
}

impl<K: Hash + Eq + Clone, V: Clone> Sweepable for Mutex<IntelligentCache<K, V>> {
    fn try_sweep(&self) -> Option<usize> {
        self.try_lock().map(|mut cache| cache.cleanup())
    }
}

/// Result of one [`CacheSweeper::tick`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Whether the interval had elapsed
    pub ran: bool,
    pub removed: usize,
    /// Targets skipped because they were busy
    pub skipped: usize,
}

/// Interval scheduler driving cache cleanup from the host's frame loop
pub struct CacheSweeper {
    interval: Duration,
    last_sweep: Duration,
    clock: SharedClock,
    sweeps: u64,
}

impl CacheSweeper {
    pub fn new(interval: Duration, clock: SharedClock) -> Self {
        let last_sweep = clock.now();
        Self {
            interval,
            last_sweep,
            clock,
            sweeps: 0,
        }
    }

    pub fn is_due(&self) -> bool {
        self.clock.now().saturating_sub(self.last_sweep) >= self.interval
    }

    /// Sweep every target if the interval elapsed. Busy targets are skipped
    /// and picked up on the next interval.
    pub fn tick(&mut self, targets: &[&dyn Sweepable]) -> SweepOutcome {
        if !self.is_due() {
            return SweepOutcome::default();
        }

        let mut outcome = SweepOutcome {
            ran: true,
            ..Default::default()
        };
        for target in targets {
            match target.try_sweep() {
                Some(removed) => outcome.removed += removed,
                None => outcome.skipped += 1,
            }
        }

        self.last_sweep = self.clock.now();
        self.sweeps += 1;
        outcome
    }

    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }
}

/// Save cache hit statistics through the storage collaborator
pub async fn persist_stats<T: Serialize + Sync>(
    storage: &dyn Storage,
    key: &str,
    stats: &T,
) -> StorageResult<()> {
    save_json(storage, key, stats).await
}
