//! Airport record types.
//!
//! [`AirportRecord`] is the authoritative representation returned to callers
//! and persisted as the payload column. The scalar columns a store keeps for
//! filtering are always derived from it, never written independently.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical airport classifications, in ranking order.
pub const LARGE_AIRPORT: &str = "large_airport";
pub const MEDIUM_AIRPORT: &str = "medium_airport";
pub const SMALL_AIRPORT: &str = "small_airport";

/// The three known major classifications. Anything else (heliports,
/// seaplane bases, closed fields, missing type) is the derived "other"
/// category.
pub const CANONICAL_TYPES: [&str; 3] = [LARGE_AIRPORT, MEDIUM_AIRPORT, SMALL_AIRPORT];

/// Nested country or region reference attached when the source ISO code
/// matched a known entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Place {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: Some(name.into()),
        }
    }
}

/// A free-text comment thread entry, keyed the way the OurAirports
/// `airport-comments.csv` export names its columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirportComment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "threadRef", alias = "thread_ref")]
    pub thread_ref: Option<String>,
    #[serde(default, rename = "airportRef", alias = "airport_ref")]
    pub airport_ref: Option<String>,
    #[serde(default, rename = "airportIdent", alias = "airport_ident")]
    pub airport_ident: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, rename = "memberNickname", alias = "member_nickname")]
    pub member_nickname: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    /// Columns not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One denormalized airport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirportRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub ident: Option<String>,
    #[serde(default, rename = "type")]
    pub airport_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub latitude_deg: Option<f64>,
    #[serde(default)]
    pub longitude_deg: Option<f64>,
    #[serde(default)]
    pub elevation_ft: Option<i64>,
    #[serde(default)]
    pub continent: Option<String>,
    #[serde(default)]
    pub iso_country: Option<String>,
    #[serde(default)]
    pub iso_region: Option<String>,
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub gps_code: Option<String>,
    #[serde(default)]
    pub iata_code: Option<String>,
    #[serde(default)]
    pub icao_code: Option<String>,
    #[serde(default)]
    pub local_code: Option<String>,
    #[serde(default)]
    pub home_link: Option<String>,
    #[serde(default)]
    pub wikipedia_link: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    /// Unique, URL-safe identifier. Empty until derived.
    #[serde(default)]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<Place>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Place>,
    #[serde(default)]
    pub comments: Vec<AirportComment>,
    /// Attributes present in historical payloads that are not modeled.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AirportRecord {
    /// Name of the nested country, mirrored into the `country_name` column.
    pub fn country_name(&self) -> Option<&str> {
        self.country.as_ref().and_then(|c| c.name.as_deref())
    }

    /// Name of the nested region, mirrored into the `region_name` column.
    pub fn region_name(&self) -> Option<&str> {
        self.region.as_ref().and_then(|r| r.name.as_deref())
    }

    /// Serialize to the payload column representation.
    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode a payload column value.
    pub fn from_payload(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_round_trip_keeps_nested_and_unknown_fields() {
        let raw = json!({
            "id": 3797,
            "ident": "KJFK",
            "type": "large_airport",
            "name": "John F Kennedy International Airport",
            "iata_code": "JFK",
            "slug": "john-f-kennedy-international-airport",
            "country": {"code": "US", "name": "United States"},
            "region": {"code": "US-NY", "name": "New York"},
            "comments": [{"id": "1", "airportIdent": "KJFK", "body": "busy", "rating": 4}],
            "runways": 4
        });

        let record: AirportRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.country_name(), Some("United States"));
        assert_eq!(record.region_name(), Some("New York"));
        assert_eq!(record.comments[0].airport_ident.as_deref(), Some("KJFK"));
        assert_eq!(record.extra.get("runways"), Some(&json!(4)));

        let decoded = AirportRecord::from_payload(&record.to_payload().unwrap()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_missing_country_and_region_are_omitted() {
        let record = AirportRecord {
            ident: Some("XXXX".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("country").is_none());
        assert!(value.get("region").is_none());
        assert_eq!(value["type"], Value::Null);
        assert!(record.country_name().is_none());
    }
}
