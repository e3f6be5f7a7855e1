//! Response DTOs for the proxy API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::service::EmissionsByProperty;

/// Success body for POST /api/v1/emissions.
#[derive(Debug, Clone, Serialize)]
pub struct EmissionsResponse {
    /// inventoryId -> opaque emission breakdown
    pub data: EmissionsByProperty,
}

impl EmissionsResponse {
    pub fn new(data: EmissionsByProperty) -> Self {
        Self { data }
    }
}

/// Response body for GET /stats.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub capacity: usize,
    pub resident_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(snapshot: &crate::cache::CacheSnapshot) -> Self {
        let lookups = snapshot.hits + snapshot.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            snapshot.hits as f64 / lookups as f64
        };
        Self {
            capacity: snapshot.capacity,
            resident_entries: snapshot.resident_entries,
            hits: snapshot.hits,
            misses: snapshot.misses,
            evictions: snapshot.evictions,
            expirations: snapshot.expirations,
            hit_rate,
        }
    }
}

/// Response body for GET /health.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error body for every failure condition.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
