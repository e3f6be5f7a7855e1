//! Cache Store Module
//!
//! The bounded priority/frequency/TTL cache: a hash index and a min-heap
//! eviction queue mutated together, so the two views never disagree.

use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;

use crate::cache::{CacheEntry, EvictionQueue};

// == Cache Error ==
/// Construction-time failure; every other cache operation is total.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache capacity must be greater than zero")]
    InvalidCapacity,
}

// == Cache Snapshot ==
/// Point-in-time view of the cache's counters, taken under the lock.
///
/// `evictions` counts entries pushed out by capacity pressure;
/// `expirations` counts entries found stale on read. The split matters when
/// tuning `cache.capacity` against `cache.emissionTtlInMinutes`: a high
/// eviction count wants a bigger cache, a high expiration count a longer TTL.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub capacity: usize,
    pub resident_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

// == Priority Cache ==
/// Bounded keyed store with composite-priority eviction and per-entry TTL.
///
/// Eviction victims are chosen by priority first, then frequency (least
/// frequently used), then soonest expiry. Expiry itself is lazy: an expired
/// entry occupies its slot until the next `get` discovers it.
///
/// The store is not internally synchronized; share it behind a single
/// exclusive lock. Reads bump `frequency` and repair the heap, so there is
/// nothing to gain from a reader/writer split.
#[derive(Debug)]
pub struct PriorityCache {
    /// Maximum number of resident entries
    capacity: usize,
    /// Heap plus key index, kept consistent as one unit
    queue: EvictionQueue,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl PriorityCache {
    // == Constructor ==
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity);
        }
        Ok(Self {
            capacity,
            queue: EvictionQueue::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        })
    }

    // == Get ==
    /// Looks up a live entry.
    ///
    /// An entry found past its expiry is removed on the spot and reported as
    /// a miss. A live hit increments the entry's frequency and repairs its
    /// heap position before the value is returned.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let pos = match self.queue.position(key) {
            Some(pos) => pos,
            None => {
                self.misses += 1;
                return None;
            }
        };

        if self.queue.entry(pos).is_expired(Instant::now()) {
            self.queue.remove(pos);
            self.expirations += 1;
            self.misses += 1;
            return None;
        }

        let entry = self.queue.entry_mut(pos);
        entry.frequency += 1;
        let value = entry.value.clone();
        self.queue.repair(pos);
        self.hits += 1;
        Some(value)
    }

    // == Set ==
    /// Inserts or overwrites an entry.
    ///
    /// Overwriting updates the value, priority and expiry, bumps the
    /// frequency and repairs the heap position. Inserting into a full cache
    /// first pops minimum entries until a slot is free; each `set` adds one
    /// entry, so in steady state this evicts at most one.
    pub fn set(&mut self, key: String, value: Value, priority: i64, ttl: Duration) {
        let now = Instant::now();

        if let Some(pos) = self.queue.position(&key) {
            let entry = self.queue.entry_mut(pos);
            entry.value = value;
            entry.priority = priority;
            entry.expires_at = now + ttl;
            entry.frequency += 1;
            self.queue.repair(pos);
            return;
        }

        while self.queue.len() >= self.capacity {
            self.queue.pop_min();
            self.evictions += 1;
        }

        self.queue.push(CacheEntry::new(key, value, priority, now + ttl));
    }

    // == Evict ==
    /// Removes an entry by key. Returns false (and does nothing) when the
    /// key is not resident.
    pub fn evict(&mut self, key: &str) -> bool {
        match self.queue.position(key) {
            Some(pos) => {
                self.queue.remove(pos);
                true
            }
            None => false,
        }
    }

    // == Introspection ==
    /// Current number of resident entries.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether `key` is resident, expired or not. Does not touch counters.
    pub fn contains(&self, key: &str) -> bool {
        self.queue.contains(key)
    }

    /// The resident entry's frequency, without counting an access.
    pub fn frequency(&self, key: &str) -> Option<u64> {
        self.queue.position(key).map(|pos| self.queue.entry(pos).frequency)
    }

    /// The resident entry's priority, without counting an access.
    pub fn priority(&self, key: &str) -> Option<i64> {
        self.queue.position(key).map(|pos| self.queue.entry(pos).priority)
    }

    /// The entry the next overflow would evict.
    pub fn peek_eviction_candidate(&self) -> Option<&CacheEntry> {
        self.queue.peek_min()
    }

    /// All resident entries in unspecified order.
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.queue.iter()
    }

    // == Snapshot ==
    /// Copies the counters out for reporting.
    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            capacity: self.capacity,
            resident_entries: self.queue.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            expirations: self.expirations,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use std::thread::sleep;

    use serde_json::json;

    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert_eq!(PriorityCache::new(0).unwrap_err(), CacheError::InvalidCapacity);
    }

    #[test]
    fn test_set_and_get() {
        let mut cache = PriorityCache::new(10).unwrap();

        cache.set("nytimes.com_emission".to_string(), json!({"co2": 1.2}), 0, TTL);
        let value = cache.get("nytimes.com_emission").unwrap();

        assert_eq!(value, json!({"co2": 1.2}));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_absent_key() {
        let mut cache = PriorityCache::new(10).unwrap();
        assert!(cache.get("missing").is_none());
        assert_eq!(cache.snapshot().misses, 1);
    }

    #[test]
    fn test_get_increments_frequency() {
        let mut cache = PriorityCache::new(10).unwrap();
        cache.set("k".to_string(), json!(1), 0, TTL);
        assert_eq!(cache.frequency("k"), Some(1));

        cache.get("k");
        cache.get("k");
        assert_eq!(cache.frequency("k"), Some(3));
    }

    #[test]
    fn test_overwrite_updates_fields_and_bumps_frequency() {
        let mut cache = PriorityCache::new(10).unwrap();
        cache.set("k".to_string(), json!(1), 0, TTL);
        cache.set("k".to_string(), json!(2), 7, TTL);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k"), Some(json!(2)));
        assert_eq!(cache.priority("k"), Some(7));
        // set + set + get
        assert_eq!(cache.frequency("k"), Some(3));
    }

    #[test]
    fn test_expired_entry_removed_on_read() {
        let mut cache = PriorityCache::new(10).unwrap();
        cache.set("k".to_string(), json!(1), 0, Duration::from_millis(20));

        assert!(cache.get("k").is_some());
        sleep(Duration::from_millis(30));

        assert!(cache.get("k").is_none());
        assert!(!cache.contains("k"));

        // The stale read counts as both an expiration and a miss, not an
        // eviction.
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.expirations, 1);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.evictions, 0);
    }

    #[test]
    fn test_expired_entry_stays_resident_until_read() {
        let mut cache = PriorityCache::new(10).unwrap();
        cache.set("k".to_string(), json!(1), 0, Duration::from_millis(10));
        sleep(Duration::from_millis(20));

        // No sweeper: the slot is still occupied until the next lookup.
        assert!(cache.contains("k"));
        assert!(cache.get("k").is_none());
        assert!(!cache.contains("k"));
    }

    #[test]
    fn test_overflow_evicts_least_frequent_within_equal_priority() {
        let mut cache = PriorityCache::new(2).unwrap();
        cache.set("warm".to_string(), json!(1), 0, TTL);
        cache.get("warm");
        cache.set("cold".to_string(), json!(2), 0, TTL);

        cache.set("new".to_string(), json!(3), 0, TTL);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("warm"));
        assert!(cache.contains("new"));
        assert!(!cache.contains("cold"));
        assert_eq!(cache.snapshot().evictions, 1);
    }

    #[test]
    fn test_overflow_evicts_lowest_priority_regardless_of_frequency() {
        let mut cache = PriorityCache::new(2).unwrap();
        cache.set("busy-low".to_string(), json!(1), 0, TTL);
        for _ in 0..10 {
            cache.get("busy-low");
        }
        cache.set("idle-high".to_string(), json!(2), 1, TTL);

        cache.set("new".to_string(), json!(3), 2, TTL);

        assert!(!cache.contains("busy-low"));
        assert!(cache.contains("idle-high"));
        assert!(cache.contains("new"));
    }

    #[test]
    fn test_overflow_breaks_full_tie_by_soonest_expiry() {
        let mut cache = PriorityCache::new(2).unwrap();
        cache.set("short".to_string(), json!(1), 0, Duration::from_secs(10));
        cache.set("long".to_string(), json!(2), 0, Duration::from_secs(1000));

        cache.set("new".to_string(), json!(3), 0, TTL);

        assert!(!cache.contains("short"));
        assert!(cache.contains("long"));
    }

    #[test]
    fn test_evict_removes_entry_and_is_noop_on_miss() {
        let mut cache = PriorityCache::new(10).unwrap();
        cache.set("k".to_string(), json!(1), 0, TTL);

        assert!(cache.evict("k"));
        assert!(!cache.contains("k"));
        assert!(!cache.evict("k"));
        assert!(!cache.evict("never-there"));

        // Explicit removal is neither a capacity eviction nor an expiration.
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.evictions, 0);
        assert_eq!(snapshot.expirations, 0);
    }

    #[test]
    fn test_peek_eviction_candidate_tracks_minimum() {
        let mut cache = PriorityCache::new(10).unwrap();
        cache.set("a".to_string(), json!(1), 2, TTL);
        cache.set("b".to_string(), json!(2), 1, TTL);
        assert_eq!(cache.peek_eviction_candidate().unwrap().key, "b");

        // Raising b's priority on overwrite makes a the candidate.
        cache.set("b".to_string(), json!(2), 9, TTL);
        assert_eq!(cache.peek_eviction_candidate().unwrap().key, "a");
    }

    #[test]
    fn test_capacity_one_churn() {
        let mut cache = PriorityCache::new(1).unwrap();
        for i in 0..5 {
            cache.set(format!("k{}", i), json!(i), 0, TTL);
            assert_eq!(cache.len(), 1);
        }
        assert!(cache.contains("k4"));
        assert_eq!(cache.snapshot().evictions, 4);
    }

    #[test]
    fn test_snapshot_reflects_lookups_and_residency() {
        let mut cache = PriorityCache::new(10).unwrap();
        cache.set("k".to_string(), json!(1), 0, TTL);
        cache.get("k");
        cache.get("absent");

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.capacity, 10);
        assert_eq!(snapshot.resident_entries, 1);
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses, 1);
    }
}
