//! Scope3 Proxy - a read-through caching proxy for emissions measurements
//!
//! Answers batched per-property queries from a bounded in-memory cache with
//! priority/frequency/TTL eviction, fetching unknown properties from the
//! Scope3 measure API in a single batched call.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod scope3;
pub mod service;

pub use api::AppState;
pub use config::Config;
