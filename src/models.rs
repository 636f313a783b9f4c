use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============ Lookup API Schema ============

/// Fields recognized by the Placekey bulk lookup endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlacekeyField {
    QueryId,
    StreetAddress,
    City,
    Region,
    PostalCode,
    Latitude,
    Longitude,
    IsoCountryCode,
}

impl PlacekeyField {
    /// All fields in wire order.
    pub const ALL: [PlacekeyField; 8] = [
        PlacekeyField::QueryId,
        PlacekeyField::StreetAddress,
        PlacekeyField::City,
        PlacekeyField::Region,
        PlacekeyField::PostalCode,
        PlacekeyField::Latitude,
        PlacekeyField::Longitude,
        PlacekeyField::IsoCountryCode,
    ];

    /// Name of the field in the API request body.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacekeyField::QueryId => "query_id",
            PlacekeyField::StreetAddress => "street_address",
            PlacekeyField::City => "city",
            PlacekeyField::Region => "region",
            PlacekeyField::PostalCode => "postal_code",
            PlacekeyField::Latitude => "latitude",
            PlacekeyField::Longitude => "longitude",
            PlacekeyField::IsoCountryCode => "iso_country_code",
        }
    }
}

impl fmt::Display for PlacekeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the API-ready projection.
///
/// `query_id`, `region` and `postal_code` are always strings so the service
/// matches them exactly. Blank cells are omitted from the request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlacekeyQuery {
    pub query_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub iso_country_code: String,
}

/// Request body for `POST /v1/placekeys`.
#[derive(Debug, Serialize)]
pub struct BulkLookupRequest<'a> {
    pub queries: &'a [PlacekeyQuery],
}

/// One result object returned by the lookup service.
///
/// Anything besides the three known fields (diagnostics, geocode details)
/// lands in `extra` and is written out as additional columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlacekeyResult {
    #[serde(deserialize_with = "string_or_number")]
    pub query_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placekey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PlacekeyResult {
    pub fn found(query_id: impl Into<String>, placekey: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            placekey: Some(placekey.into()),
            ..Default::default()
        }
    }

    pub fn failed(query_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Cell text for a result column; `None` when the field is absent.
    pub fn cell(&self, column: &str) -> Option<String> {
        match column {
            "query_id" => Some(self.query_id.clone()),
            "placekey" => self.placekey.clone(),
            "error" => self.error.clone(),
            other => self.extra.get(other).and_then(value_to_cell),
        }
    }
}

/// Renders a JSON value the way it should appear in a CSV cell.
pub fn value_to_cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "query_id must be a string or number, got {}",
            other
        ))),
    }
}
