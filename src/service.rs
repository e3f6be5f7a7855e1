//! Emission Service Module
//!
//! Read-through batching over the cache and the Scope3 client: partition a
//! batch into hits and misses, fetch the misses in one upstream call, then
//! write the fresh entries back without blocking the response.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::warn;

use crate::cache::{emission_cache_key, PriorityCache};
use crate::scope3::{MeasureFilterRow, Scope3Client, Scope3Error};

// == Filter ==
/// One inbound query row, already validated by the API layer.
#[derive(Debug, Clone)]
pub struct EmissionFilter {
    pub country: Option<String>,
    pub channel: Option<String>,
    pub inventory_id: String,
    pub impressions: i64,
    pub utc_datetime: String,
    pub priority: i64,
}

/// Per-property emission breakdowns keyed by inventory id.
pub type EmissionsByProperty = HashMap<String, Value>;

// == Emission Service ==
pub struct EmissionService {
    cache: Arc<Mutex<PriorityCache>>,
    client: Scope3Client,
    cache_ttl: Duration,
}

impl EmissionService {
    // == Constructor ==
    pub fn new(cache: Arc<Mutex<PriorityCache>>, client: Scope3Client, cache_ttl: Duration) -> Self {
        Self {
            cache,
            client,
            cache_ttl,
        }
    }

    // == Get Emissions ==
    /// Answers a batch of query rows.
    ///
    /// Cached properties are served locally; the remainder goes upstream as
    /// a single measure call, deduplicated per inventory id (the last
    /// occurrence's priority wins). Fresh results are returned immediately
    /// and inserted into the cache on spawned tasks.
    ///
    /// An upstream server failure is downgraded to a warning and the cached
    /// subset is returned; every other upstream error propagates.
    pub async fn get_emissions(
        &self,
        filters: Vec<EmissionFilter>,
    ) -> Result<EmissionsByProperty, Scope3Error> {
        let mut result = EmissionsByProperty::new();
        let mut pending_priority: HashMap<String, i64> = HashMap::new();
        let mut to_fetch: Vec<MeasureFilterRow> = Vec::new();

        for filter in filters {
            let cache_key = emission_cache_key(&filter.inventory_id);
            if let Some(emissions) = self.cache.lock().await.get(&cache_key) {
                result.insert(filter.inventory_id, emissions);
            } else {
                if !pending_priority.contains_key(&filter.inventory_id) {
                    to_fetch.push(MeasureFilterRow {
                        country: filter.country,
                        channel: filter.channel,
                        inventory_id: filter.inventory_id.clone(),
                        impressions: filter.impressions,
                        utc_datetime: filter.utc_datetime,
                    });
                }
                pending_priority.insert(filter.inventory_id, filter.priority);
            }
        }

        if to_fetch.is_empty() {
            return Ok(result);
        }

        match self.client.emissions_breakdown(&to_fetch).await {
            Ok(fresh_data) => {
                for (property_name, emissions) in fresh_data {
                    let priority = pending_priority.get(&property_name).copied().unwrap_or(0);
                    self.schedule_cache_insert(&property_name, emissions.clone(), priority);
                    result.insert(property_name, emissions);
                }
            }
            Err(err @ Scope3Error::Server(_)) => {
                // Upstream is best effort: a transient outage must not black
                // out callers the cache can still answer.
                warn!(error = %err, "failed to fetch emissions breakdown from scope3; returning cached subset");
            }
            Err(err) => return Err(err),
        }

        Ok(result)
    }

    /// Inserts one fresh entry on its own task, off the response path.
    fn schedule_cache_insert(&self, property_name: &str, emissions: Value, priority: i64) {
        let cache = Arc::clone(&self.cache);
        let cache_key = emission_cache_key(property_name);
        let ttl = self.cache_ttl;
        tokio::spawn(async move {
            cache.lock().await.set(cache_key, emissions, priority, ttl);
        });
    }
}
