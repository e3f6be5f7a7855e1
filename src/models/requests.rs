//! Request DTOs for the proxy API
//!
//! Defines the structure of incoming HTTP request bodies.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::service::EmissionFilter;

/// Request body for POST /api/v1/emissions.
///
/// Serialize is derived so a rejected body can be logged verbatim.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmissionsRequest {
    #[serde(default)]
    pub rows: Vec<EmissionRow>,
}

/// One per-property query row.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub inventory_id: String,
    pub impressions: i64,
    pub utc_datetime: String,
    /// Cache eviction priority; higher survives longer
    #[serde(default)]
    pub priority: i64,
}

impl EmissionsRequest {
    /// Returns the first validation problem, or None when every row is valid.
    pub fn validate(&self) -> Option<String> {
        for (index, row) in self.rows.iter().enumerate() {
            if let Some(problem) = row.validate() {
                return Some(format!("rows[{}]: {}", index, problem));
            }
        }
        None
    }
}

impl EmissionRow {
    /// Validates the row against the inbound contract.
    pub fn validate(&self) -> Option<String> {
        if self.inventory_id.is_empty() {
            return Some("inventoryId must not be empty".to_string());
        }
        if self.impressions <= 0 {
            return Some("impressions must be greater than zero".to_string());
        }
        if !is_iso8601(&self.utc_datetime) {
            return Some(format!(
                "utcDatetime '{}' is not an ISO-8601 date",
                self.utc_datetime
            ));
        }
        None
    }
}

impl From<EmissionRow> for EmissionFilter {
    fn from(row: EmissionRow) -> Self {
        Self {
            country: row.country,
            channel: row.channel,
            inventory_id: row.inventory_id,
            impressions: row.impressions,
            utc_datetime: row.utc_datetime,
            priority: row.priority,
        }
    }
}

/// Accepts a calendar date (`2024-10-31`) or a full RFC 3339 datetime.
fn is_iso8601(value: &str) -> bool {
    value.parse::<NaiveDate>().is_ok() || DateTime::parse_from_rfc3339(value).is_ok()
}
