//! Filter compiler.
//!
//! Turns the optional caller-supplied filters into a conjunction of
//! [`Condition`]s. A compiled filter renders to a SQL predicate with
//! positional parameters for SQL-backed stores, and evaluates directly
//! against an [`AirportRecord`] for in-memory stores. Both renderings follow
//! SQL NULL semantics: a missing column never satisfies a condition.

use serde::{Deserialize, Serialize};

use crate::models::{AirportRecord, CANONICAL_TYPES};

/// Optional filters for an airport query.
///
/// Absence (`None`) is distinct from an empty string: only present values
/// take part in the predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirportFilters {
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
    /// Unified substring search across codes, municipality and place names.
    #[serde(default)]
    pub q: Option<String>,
}

/// Scalar columns kept alongside the payload for indexed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterColumn {
    Ident,
    IataCode,
    IcaoCode,
    Municipality,
    IsoCountry,
    IsoRegion,
    AirportType,
    CountryName,
    RegionName,
}

impl FilterColumn {
    /// Column name in the `airports` table.
    pub fn column_name(self) -> &'static str {
        match self {
            FilterColumn::Ident => "ident",
            FilterColumn::IataCode => "iata_code",
            FilterColumn::IcaoCode => "icao_code",
            FilterColumn::Municipality => "municipality",
            FilterColumn::IsoCountry => "iso_country",
            FilterColumn::IsoRegion => "iso_region",
            FilterColumn::AirportType => "type",
            FilterColumn::CountryName => "country_name",
            FilterColumn::RegionName => "region_name",
        }
    }

    /// Value of this column for a record, as the store would persist it.
    pub fn value_of(self, record: &AirportRecord) -> Option<&str> {
        match self {
            FilterColumn::Ident => record.ident.as_deref(),
            FilterColumn::IataCode => record.iata_code.as_deref(),
            FilterColumn::IcaoCode => record.icao_code.as_deref(),
            FilterColumn::Municipality => record.municipality.as_deref(),
            FilterColumn::IsoCountry => record.iso_country.as_deref(),
            FilterColumn::IsoRegion => record.iso_region.as_deref(),
            FilterColumn::AirportType => record.airport_type.as_deref(),
            FilterColumn::CountryName => record.country_name(),
            FilterColumn::RegionName => record.region_name(),
        }
    }
}

/// Columns searched by the unified `q` parameter, in parameter order.
pub const SEARCH_COLUMNS: [FilterColumn; 7] = [
    FilterColumn::Ident,
    FilterColumn::IataCode,
    FilterColumn::IcaoCode,
    FilterColumn::Municipality,
    FilterColumn::IsoCountry,
    FilterColumn::CountryName,
    FilterColumn::RegionName,
];

/// Literal `type` value selecting the derived "other" category.
pub const OTHER_TYPE: &str = "other";

/// One conjunct of a compiled filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Case-insensitive equality. Case folding is ASCII-only, as SQLite's
    /// `LOWER` does.
    Equals { column: FilterColumn, value: String },
    /// Type is present and none of the canonical classifications.
    ExcludeCanonicalTypes,
    /// Case-insensitive substring match against any of the columns.
    /// `needle` is already trimmed and ASCII-lowercased.
    ContainsAny {
        columns: &'static [FilterColumn],
        needle: String,
    },
}

impl Condition {
    fn write_sql(&self, sql: &mut String, params: &mut Vec<String>) {
        match self {
            Condition::Equals { column, value } => {
                sql.push_str(&format!("LOWER({}) = LOWER(?)", column.column_name()));
                params.push(value.clone());
            }
            Condition::ExcludeCanonicalTypes => {
                let types = CANONICAL_TYPES
                    .iter()
                    .map(|t| format!("'{}'", t))
                    .collect::<Vec<_>>()
                    .join(", ");
                sql.push_str(&format!("LOWER(type) NOT IN ({})", types));
            }
            Condition::ContainsAny { columns, needle } => {
                let pattern = format!("%{}%", escape_like(needle));
                let parts = columns
                    .iter()
                    .map(|c| format!("LOWER({}) LIKE ? ESCAPE '\\'", c.column_name()))
                    .collect::<Vec<_>>();
                sql.push('(');
                sql.push_str(&parts.join(" OR "));
                sql.push(')');
                params.extend(std::iter::repeat(pattern).take(columns.len()));
            }
        }
    }

    /// Evaluate against a record with SQL NULL semantics.
    pub fn matches(&self, record: &AirportRecord) -> bool {
        match self {
            Condition::Equals { column, value } => column
                .value_of(record)
                .is_some_and(|v| v.eq_ignore_ascii_case(value)),
            Condition::ExcludeCanonicalTypes => record.airport_type.as_deref().is_some_and(|t| {
                let t = t.to_ascii_lowercase();
                !CANONICAL_TYPES.contains(&t.as_str())
            }),
            Condition::ContainsAny { columns, needle } => columns.iter().any(|c| {
                c.value_of(record)
                    .is_some_and(|v| v.to_ascii_lowercase().contains(needle.as_str()))
            }),
        }
    }
}

/// Escape LIKE wildcards so the needle is matched literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Conjunction of conditions produced by [`compile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFilter {
    conditions: Vec<Condition>,
}

impl CompiledFilter {
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_unrestricted(&self) -> bool {
        self.conditions.is_empty()
    }

    /// SQL predicate and positional parameters, aligned left to right.
    ///
    /// With no active conditions the predicate is `1 = 1`.
    pub fn to_sql(&self) -> (String, Vec<String>) {
        if self.conditions.is_empty() {
            return ("1 = 1".to_string(), Vec::new());
        }

        let mut sql = String::new();
        let mut params = Vec::new();
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            condition.write_sql(&mut sql, &mut params);
        }
        (sql, params)
    }

    /// `WHERE ...` clause, or an empty string when unrestricted.
    pub fn where_clause(&self) -> (String, Vec<String>) {
        if self.conditions.is_empty() {
            return (String::new(), Vec::new());
        }
        let (predicate, params) = self.to_sql();
        (format!(" WHERE {}", predicate), params)
    }

    /// Evaluate the whole conjunction against a record.
    pub fn matches(&self, record: &AirportRecord) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }
}

/// Compile caller filters into a conjunctive predicate.
///
/// Equality conditions are emitted in a fixed order (iata, icao,
/// municipality, iso_country, iso_region, country_name, region_name, type)
/// followed by the unified search.
pub fn compile(filters: &AirportFilters) -> CompiledFilter {
    let mut conditions = Vec::new();

    let equalities = [
        (FilterColumn::IataCode, &filters.iata),
        (FilterColumn::IcaoCode, &filters.icao),
        (FilterColumn::Municipality, &filters.municipality),
        (FilterColumn::IsoCountry, &filters.iso_country),
        (FilterColumn::IsoRegion, &filters.iso_region),
        (FilterColumn::CountryName, &filters.country_name),
        (FilterColumn::RegionName, &filters.region_name),
    ];
    for (column, value) in equalities {
        if let Some(value) = value {
            conditions.push(Condition::Equals {
                column,
                value: value.clone(),
            });
        }
    }

    if let Some(airport_type) = &filters.airport_type {
        if airport_type.trim().eq_ignore_ascii_case(OTHER_TYPE) {
            conditions.push(Condition::ExcludeCanonicalTypes);
        } else {
            conditions.push(Condition::Equals {
                column: FilterColumn::AirportType,
                value: airport_type.clone(),
            });
        }
    }

    if let Some(q) = &filters.q {
        let needle = q.trim();
        if !needle.is_empty() {
            conditions.push(Condition::ContainsAny {
                columns: &SEARCH_COLUMNS,
                needle: needle.to_ascii_lowercase(),
            });
        }
    }

    CompiledFilter { conditions }
}
