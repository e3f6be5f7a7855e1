//! Scope3 Upstream Client Module
//!
//! REST client for the Scope3 emissions measurement API.

mod client;
mod measure;

pub use client::{Scope3Client, Scope3ClientConfig, Scope3Error};
pub use measure::MeasureFilterRow;
