use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};

use super::schema::airports;
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::AirportRecord;

/// Row written by `upsert_all`. Every scalar column is derived from the
/// record so the filter columns can never drift from the payload.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = airports)]
pub struct NewAirportRow {
    pub slug: String,
    pub id: Option<i64>,
    pub ident: Option<String>,
    pub iata_code: Option<String>,
    pub icao_code: Option<String>,
    pub municipality: Option<String>,
    pub iso_country: Option<String>,
    pub iso_region: Option<String>,
    pub airport_type: Option<String>,
    pub country_name: Option<String>,
    pub region_name: Option<String>,
    pub data: String,
}

impl NewAirportRow {
    pub fn from_record(record: &AirportRecord) -> RepositoryResult<Self> {
        let data = record.to_payload().map_err(|e| {
            RepositoryError::serialization_with_context(
                e.to_string(),
                ErrorContext::new("encode_payload")
                    .with_entity("airport")
                    .with_entity_id(&record.slug),
            )
        })?;

        Ok(Self {
            slug: record.slug.clone(),
            id: record.id,
            ident: record.ident.clone(),
            iata_code: record.iata_code.clone(),
            icao_code: record.icao_code.clone(),
            municipality: record.municipality.clone(),
            iso_country: record.iso_country.clone(),
            iso_region: record.iso_region.clone(),
            airport_type: record.airport_type.clone(),
            country_name: record.country_name().map(str::to_string),
            region_name: record.region_name().map(str::to_string),
            data,
        })
    }
}

/// Payload column returned by raw `SELECT data ...` queries.
#[derive(Debug, QueryableByName)]
pub struct PayloadRow {
    #[diesel(sql_type = Text)]
    pub data: String,
}

impl PayloadRow {
    pub fn into_record(self) -> RepositoryResult<AirportRecord> {
        AirportRecord::from_payload(&self.data).map_err(|e| {
            RepositoryError::serialization_with_context(
                e.to_string(),
                ErrorContext::new("decode_payload").with_entity("airport"),
            )
        })
    }
}

/// Result of `SELECT COUNT(1) AS count ...`.
#[derive(Debug, QueryableByName)]
pub struct CountRow {
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}
