//! Scope3 Measure API
//!
//! Request and response shapes for `/v2/measure`, and the fold of a measure
//! response into a per-property breakdown map.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scope3::{Scope3Client, Scope3Error};

const MEASURE_PATH: &str = "/measure?includeRows=true&latest=true&fields=emissionsBreakdown";

// == Request Row ==
/// One property query as the measure API expects it. Deliberately carries no
/// priority: that is proxy-local eviction metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureFilterRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub inventory_id: String,
    pub impressions: i64,
    pub utc_datetime: String,
}

#[derive(Debug, Serialize)]
struct MeasureRequest<'a> {
    rows: &'a [MeasureFilterRow],
}

// == Response Rows ==
#[derive(Debug, Deserialize)]
struct MeasureResponse {
    #[serde(default)]
    rows: Vec<MeasureRow>,
}

/// Scope3 returns HTTP 200 but sets `error.message` on rows that failed
/// field validation (missing fields, impressions < 1, ...).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeasureRow {
    #[serde(default)]
    error: Option<MeasureRowError>,
    #[serde(default)]
    emissions_breakdown: Option<EmissionsBreakdown>,
    #[serde(default)]
    internal: Option<MeasureRowInternal>,
}

#[derive(Debug, Deserialize)]
struct MeasureRowError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct EmissionsBreakdown {
    breakdown: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeasureRowInternal {
    property_name: Option<String>,
}

impl Scope3Client {
    // == Get Emissions Breakdown ==
    /// Fetches emission breakdowns for a batch of properties in one call.
    ///
    /// Returns `propertyName -> breakdown` for every row the upstream
    /// answered. Unreachable server, timeout, non-2xx status and unparseable
    /// bodies come back as `Scope3Error::Server`; a per-row validation
    /// message comes back as `Scope3Error::RowValidation`.
    pub async fn emissions_breakdown(
        &self,
        rows: &[MeasureFilterRow],
    ) -> Result<HashMap<String, Value>, Scope3Error> {
        let response = self.post_json(MEASURE_PATH, &MeasureRequest { rows }).await?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| Scope3Error::Server(format!("unable to read measure response body: {}", err)))?;

        if !status.is_success() {
            return Err(Scope3Error::Server(format!(
                "measure API returned http status {} with response body: {}",
                status,
                String::from_utf8_lossy(&body)
            )));
        }

        let parsed: MeasureResponse = serde_json::from_slice(&body).map_err(|err| {
            Scope3Error::Server(format!("unable to parse measure response body: {}", err))
        })?;

        fold_measure_response(parsed)
    }
}

/// Turns a parsed 2xx measure response into `propertyName -> breakdown`.
fn fold_measure_response(response: MeasureResponse) -> Result<HashMap<String, Value>, Scope3Error> {
    let mut result = HashMap::with_capacity(response.rows.len());

    for row in response.rows {
        if let Some(error) = &row.error {
            if !error.message.is_empty() {
                return Err(Scope3Error::RowValidation(error.message.clone()));
            }
        }

        let property_name = row
            .internal
            .and_then(|internal| internal.property_name)
            .ok_or_else(|| {
                Scope3Error::Server("measure response row is missing internal.propertyName".to_string())
            })?;
        let breakdown = row
            .emissions_breakdown
            .and_then(|eb| eb.breakdown)
            .ok_or_else(|| {
                Scope3Error::Server(format!(
                    "measure response row for {} is missing emissionsBreakdown.breakdown",
                    property_name
                ))
            })?;

        result.insert(property_name, breakdown);
    }

    Ok(result)
}
