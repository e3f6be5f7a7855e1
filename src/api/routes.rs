//! API Routes
//!
//! Configures the Axum router with the proxy endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    emissions_handler, health_handler, method_not_allowed_handler, stats_handler, AppState,
};

/// Creates the main router.
///
/// # Endpoints
/// - `POST /api/v1/emissions` - Batched emission lookup (other methods: 405)
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/v1/emissions",
            post(emissions_handler).fallback(method_not_allowed_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
