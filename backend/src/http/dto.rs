//! Data Transfer Objects for the HTTP API.
//!
//! Airport records are serialized as-is; only the query string and the
//! health payload need their own types.

use serde::{Deserialize, Serialize};

use super::error::AppError;
use crate::query::{AirportFilters, Pagination};

/// Response for the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status (always "ok" while the process serves requests)
    pub status: String,
    /// Crate version
    pub version: String,
    /// Store connectivity: "connected", "disconnected" or "error: ..."
    pub database: String,
    /// Stored record count, when the store answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<u64>,
}

/// Query string of `GET /api/airports`.
///
/// Numeric parameters are kept as text so that malformed values produce the
/// same JSON error body as out-of-range ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirportListQuery {
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    /// Presence selects paginated mode; `limit` is then ignored.
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub iata: Option<String>,
    #[serde(default)]
    pub icao: Option<String>,
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub iso_country: Option<String>,
    #[serde(default)]
    pub iso_region: Option<String>,
    #[serde(default, rename = "type")]
    pub airport_type: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

impl AirportListQuery {
    pub fn filters(&self) -> AirportFilters {
        AirportFilters {
            iata: self.iata.clone(),
            icao: self.icao.clone(),
            municipality: self.municipality.clone(),
            country_name: self.country_name.clone(),
            region_name: self.region_name.clone(),
            iso_country: self.iso_country.clone(),
            iso_region: self.iso_region.clone(),
            airport_type: self.airport_type.clone(),
            q: self.q.clone(),
        }
    }

    /// Validate the window parameters and pick the pagination mode.
    ///
    /// Every supplied parameter is validated, including the one the chosen
    /// mode ignores.
    pub fn pagination(&self) -> Result<Pagination, AppError> {
        let limit = positive("limit", self.limit.as_deref())?;
        let page = positive("page", self.page.as_deref())?;
        match positive("size", self.size.as_deref())? {
            Some(size) => Ok(Pagination::paged(page, size)),
            None => Ok(Pagination::simple(limit)),
        }
    }
}

/// Parse an optional integer parameter that must be at least 1. A blank
/// value counts as absent.
fn positive(name: &str, raw: Option<&str>) -> Result<Option<u32>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<i64>() {
        Ok(value) if value >= 1 => u32::try_from(value)
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("'{}' is too large", name))),
        Ok(_) => Err(AppError::BadRequest(format!(
            "'{}' must be greater than or equal to 1",
            name
        ))),
        Err(_) => Err(AppError::BadRequest(format!(
            "'{}' must be an integer",
            name
        ))),
    }
}
