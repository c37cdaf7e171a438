//! Bounded in-memory TTL cache.
//!
//! Entries expire `ttl` after they were written and are dropped lazily on
//! access or by a sweep. When the cache is full, inserting a new key evicts
//! the oldest-inserted entry (FIFO, reads never reorder). Overwriting an
//! existing key replaces value, timestamp and TTL but keeps its original
//! insertion slot.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};

/// Observability snapshot of the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries currently held (expired ones included until removed)
    pub size: usize,
    /// Capacity
    pub max_size: usize,
    /// Per-entry detail in insertion order
    pub entries: Vec<EntryStats>,
}

/// Per-entry part of [`CacheStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryStats {
    /// Cache key
    pub key: String,
    /// Milliseconds since the entry was written
    pub age_ms: u64,
    /// Entry TTL in milliseconds
    pub ttl_ms: u64,
    /// Whether the entry is past its TTL
    pub expired: bool,
}

struct Entry<V> {
    value: V,
    created_at: DateTime<Utc>,
    ttl: Duration,
    seq: u64,
}

impl<V> Entry<V> {
    fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).to_std().unwrap_or(Duration::ZERO)
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.age(now) > self.ttl
    }
}

struct CacheState<V> {
    entries: HashMap<String, Entry<V>>,
    /// Insertion sequence -> key. First entry is the eviction candidate.
    order: BTreeMap<u64, String>,
    next_seq: u64,
}

impl<V> CacheState<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.order.remove(&entry.seq);
                true
            }
            None => false,
        }
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// Thread-safe key/value cache with per-entry TTL and FIFO eviction.
///
/// All state sits behind a single mutex; no method holds it across an
/// `.await`, so the cache can be shared freely between tasks.
pub struct TtlCache<V> {
    state: Mutex<CacheState<V>>,
    max_size: usize,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache holding at most `max_size` entries (at least one).
    pub fn new(max_size: usize) -> Self {
        Self::with_clock(max_size, Arc::new(SystemClock))
    }

    /// Create a cache that reads time from `clock`.
    pub fn with_clock(max_size: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState::new()),
            max_size: max_size.max(1),
            clock,
        }
    }

    /// Insert or overwrite `key`.
    ///
    /// A new key arriving at capacity evicts exactly one entry, the
    /// oldest-inserted one.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let now = self.clock.now();
        let mut state = self.state.lock();

        if let Some(entry) = state.entries.get_mut(&key) {
            entry.value = value;
            entry.created_at = now;
            entry.ttl = ttl;
            trace!(key = %key, "cache entry overwritten");
            return;
        }

        if state.entries.len() >= self.max_size {
            if let Some(evicted) = state.evict_oldest() {
                debug!(key = %evicted, "evicted oldest cache entry");
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.order.insert(seq, key.clone());
        state.entries.insert(
            key,
            Entry {
                value,
                created_at: now,
                ttl,
                seq,
            },
        );
    }

    /// Get an unexpired value. An expired entry found here is removed.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let expired = state.entries.get(key)?.is_expired(now);
        if expired {
            state.remove(key);
            trace!(key = %key, "expired cache entry removed on read");
            return None;
        }
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Whether `key` holds an unexpired value. Same expiry rule as [`get`](Self::get).
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let expired = match state.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return false,
        };
        if expired {
            state.remove(key);
        }
        !expired
    }

    /// Remove `key`. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        self.state.lock().remove(key)
    }

    /// Remove everything.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
    }

    /// Remove every entry expired at the moment of the call.
    ///
    /// Runs under one lock acquisition, so a sweep is never observed half done.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            state.remove(key);
        }
        expired.len()
    }

    /// Snapshot for observability. Never removes anything.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let state = self.state.lock();

        let entries = state
            .order
            .values()
            .filter_map(|key| {
                state.entries.get(key).map(|entry| EntryStats {
                    key: key.clone(),
                    age_ms: duration_ms(entry.age(now)),
                    ttl_ms: duration_ms(entry.ttl),
                    expired: entry.is_expired(now),
                })
            })
            .collect();

        CacheStats {
            size: state.entries.len(),
            max_size: self.max_size,
            entries,
        }
    }

    /// Number of entries held, expired ones included until removed.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity.
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
