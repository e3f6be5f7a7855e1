//! Models Module
//!
//! Request and response DTOs for the proxy's HTTP surface.

pub mod requests;
pub mod responses;

pub use requests::{EmissionRow, EmissionsRequest};
pub use responses::{EmissionsResponse, ErrorResponse, HealthResponse, StatsResponse};
