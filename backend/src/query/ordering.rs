//! Deterministic result ordering.
//!
//! Classification rank first (large, medium, small, everything else), then
//! ASCII case-insensitive `ident` with a missing ident sorting as the empty
//! string, then `slug`. The slug is unique, so the order is total and pages
//! never overlap.

use std::cmp::Ordering;

use crate::models::{AirportRecord, LARGE_AIRPORT, MEDIUM_AIRPORT, SMALL_AIRPORT};

/// `ORDER BY` clause equivalent to [`compare`].
pub const ORDER_BY_SQL: &str = " ORDER BY CASE LOWER(type) \
     WHEN 'large_airport' THEN 0 \
     WHEN 'medium_airport' THEN 1 \
     WHEN 'small_airport' THEN 2 \
     ELSE 3 END, \
     LOWER(COALESCE(ident, '')), \
     slug";

/// Rank of an airport classification; unknown and missing types rank last.
pub fn type_rank(airport_type: Option<&str>) -> u8 {
    match airport_type.map(str::to_ascii_lowercase).as_deref() {
        Some(LARGE_AIRPORT) => 0,
        Some(MEDIUM_AIRPORT) => 1,
        Some(SMALL_AIRPORT) => 2,
        _ => 3,
    }
}

/// Sort key for a record.
pub fn ordering_key(record: &AirportRecord) -> (u8, String, &str) {
    (
        type_rank(record.airport_type.as_deref()),
        record.ident.as_deref().unwrap_or_default().to_ascii_lowercase(),
        record.slug.as_str(),
    )
}

pub fn compare(a: &AirportRecord, b: &AirportRecord) -> Ordering {
    ordering_key(a).cmp(&ordering_key(b))
}

/// Sort records in place into result order.
pub fn sort_records(records: &mut [AirportRecord]) {
    records.sort_by(compare);
}
