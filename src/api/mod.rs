//! API Module
//!
//! HTTP handlers and routing for the proxy's REST surface.
//!
//! # Endpoints
//! - `POST /api/v1/emissions` - Batched per-property emission lookup
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
