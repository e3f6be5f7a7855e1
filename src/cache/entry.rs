//! Cache Entry Module
//!
//! Defines a single cached emission breakdown with its eviction metadata.

use std::time::Instant;

use serde_json::Value;

// == Cache Entry ==
/// One cached per-property result.
///
/// The payload is an uninterpreted JSON value; the cache never looks inside
/// it. Eviction eligibility is derived from `priority`, `frequency` and
/// `expires_at`, in that order.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Cache key (property name plus the `_emission` suffix)
    pub key: String,
    /// Opaque emission breakdown
    pub value: Value,
    /// Caller-supplied eviction priority; lower is evicted first
    pub priority: i64,
    /// Access counter; 1 on insertion, incremented on every hit and overwrite
    pub frequency: u64,
    /// Instant strictly after which the entry is invalid
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a fresh entry with `frequency` starting at 1.
    pub fn new(key: String, value: Value, priority: i64, expires_at: Instant) -> Self {
        Self {
            key,
            value,
            priority,
            frequency: 1,
            expires_at,
        }
    }

    // == Is Expired ==
    /// An entry is valid at `expires_at` itself and invalid strictly after it.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    // == Eviction Rank ==
    /// Composite ordering key: priority, then frequency (least frequently
    /// used), then expiry (soonest first). Smaller ranks are evicted first.
    pub fn eviction_rank(&self) -> (i64, u64, Instant) {
        (self.priority, self.frequency, self.expires_at)
    }
}
