//! API Handlers
//!
//! HTTP request handlers for the proxy endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::cache::PriorityCache;
use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::models::{EmissionsRequest, EmissionsResponse, HealthResponse, StatsResponse};
use crate::scope3::{Scope3Client, Scope3ClientConfig};
use crate::service::{EmissionFilter, EmissionService};

/// Application state shared across all handlers.
///
/// The cache sits behind one exclusive lock; the service holds the same
/// handle for its read-through flow and its spawned insertions.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<Mutex<PriorityCache>>,
    pub service: Arc<EmissionService>,
}

impl AppState {
    /// Wires the shared cache into a service over the given upstream client.
    pub fn new(cache: PriorityCache, client: Scope3Client, cache_ttl: std::time::Duration) -> Self {
        let cache = Arc::new(Mutex::new(cache));
        let service = Arc::new(EmissionService::new(Arc::clone(&cache), client, cache_ttl));
        Self { cache, service }
    }

    /// Builds the full state from configuration.
    pub fn from_config(config: &Config) -> std::result::Result<Self, String> {
        let cache = PriorityCache::new(config.cache.capacity)
            .map_err(|err| format!("cache.capacity: {}", err))?;
        let client = Scope3Client::new(Scope3ClientConfig {
            host: config.scope3.host.clone(),
            api_key: config.scope3.api_key.clone(),
            timeout: config.scope3.timeout(),
            max_idle_connections: config.scope3.max_idle_connections,
            idle_conn_timeout: config.scope3.idle_conn_timeout(),
        })
        .map_err(|err| format!("scope3 client: {}", err))?;

        Ok(Self::new(cache, client, config.cache.emission_ttl()))
    }
}

/// Handler for POST /api/v1/emissions
///
/// Validates the batch, runs it through the read-through service and
/// returns the per-property map. A malformed body is a 400 here, not the
/// extractor's default rejection. Upstream validation and internal errors
/// surface as a generic 500 with the offending body logged.
pub async fn emissions_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EmissionsRequest>, JsonRejection>,
) -> Result<Json<EmissionsResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(reason = %rejection.body_text(), "rejected emissions request body");
        ProxyError::InvalidRequest("Invalid request body".to_string())
    })?;

    if let Some(problem) = request.validate() {
        return Err(ProxyError::InvalidRequest(problem));
    }

    let filters: Vec<EmissionFilter> = request.rows.iter().cloned().map(Into::into).collect();

    match state.service.get_emissions(filters).await {
        Ok(data) => Ok(Json(EmissionsResponse::new(data))),
        Err(err) => {
            let request_body = serde_json::to_string(&request).unwrap_or_default();
            error!(error = %err, request_body = %request_body, "unable to fetch emissions breakdown");
            Err(ProxyError::Internal(err.to_string()))
        }
    }
}

/// Fallback for every non-POST method on the emissions route.
pub async fn method_not_allowed_handler() -> ProxyError {
    ProxyError::MethodNotAllowed
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let snapshot = state.cache.lock().await.snapshot();
    Json(StatsResponse::new(&snapshot))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    fn test_state() -> AppState {
        let cache = PriorityCache::new(16).unwrap();
        let client = Scope3Client::new(Scope3ClientConfig {
            host: "http://127.0.0.1:9".to_string(),
            api_key: String::new(),
            timeout: Duration::from_millis(200),
            max_idle_connections: 1,
            idle_conn_timeout: Duration::from_secs(1),
        })
        .unwrap();
        AppState::new(cache, client, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_emissions_handler_rejects_invalid_row() {
        let request = EmissionsRequest {
            rows: vec![serde_json::from_value(json!({
                "inventoryId": "nytimes.com",
                "impressions": 0,
                "utcDatetime": "2024-10-31"
            }))
            .unwrap()],
        };

        let result = emissions_handler(State(test_state()), Ok(Json(request))).await;
        assert!(matches!(result, Err(ProxyError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_emissions_handler_serves_cached_rows_while_upstream_is_down() {
        let state = test_state();
        state.cache.lock().await.set(
            "nytimes.com_emission".to_string(),
            json!({"total": 1.5}),
            0,
            Duration::from_secs(3600),
        );

        let request = EmissionsRequest {
            rows: vec![serde_json::from_value(json!({
                "inventoryId": "nytimes.com",
                "impressions": 1000,
                "utcDatetime": "2024-10-31"
            }))
            .unwrap()],
        };

        let response = emissions_handler(State(state), Ok(Json(request))).await.unwrap();
        assert_eq!(response.data["nytimes.com"], json!({"total": 1.5}));
    }

    #[tokio::test]
    async fn test_stats_handler_reflects_cache_activity() {
        let state = test_state();
        {
            let mut cache = state.cache.lock().await;
            cache.set("k_emission".to_string(), json!(1), 0, Duration::from_secs(60));
            cache.get("k_emission");
            cache.get("missing");
        }

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 1);
        assert_eq!(response.misses, 1);
        assert_eq!(response.resident_entries, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
