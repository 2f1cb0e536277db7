//! Record sources for populating the store.
//!
//! [`OurAirportsCsvSource`] builds records from the raw OurAirports export;
//! [`CombinedJsonSource`] reads a pre-combined JSON array.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use serde_json::{Map, Value};

use super::error::IngestError;
use crate::models::{AirportComment, AirportRecord, Place};

pub const AIRPORTS_CSV: &str = "airports.csv";
pub const COUNTRIES_CSV: &str = "countries.csv";
pub const REGIONS_CSV: &str = "regions.csv";
pub const COMMENTS_CSV: &str = "airport-comments.csv";
pub const COMBINED_JSON: &str = "airports_combined.json";

/// Something that can produce the full airport dataset from a directory.
pub trait RecordSource: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Load every record. Slugs may be left empty; the gate derives them.
    fn load(&self, dir: &Path) -> Result<Vec<AirportRecord>, IngestError>;
}

type CsvRow = HashMap<String, String>;

/// Builds records from `airports.csv`, enriched by the optional
/// `countries.csv`, `regions.csv` and `airport-comments.csv`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OurAirportsCsvSource;

impl RecordSource for OurAirportsCsvSource {
    fn name(&self) -> &'static str {
        "ourairports-csv"
    }

    fn load(&self, dir: &Path) -> Result<Vec<AirportRecord>, IngestError> {
        let airports_path = dir.join(AIRPORTS_CSV);
        if !airports_path.exists() {
            return Err(IngestError::MissingFile(airports_path));
        }

        let countries = load_optional(&dir.join(COUNTRIES_CSV), load_places);
        let regions = load_optional(&dir.join(REGIONS_CSV), load_places);
        let comments = load_optional(&dir.join(COMMENTS_CSV), CommentIndex::load);

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (line, row) in read_rows(&airports_path)?.enumerate() {
            match row {
                Ok(row) => {
                    let mut record = airport_from_row(&row);
                    enrich(&mut record, &countries, &regions, &comments);
                    records.push(record);
                }
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping airport row {}: {}", line + 2, e);
                }
            }
        }

        info!(
            "Combined {} airports from {} (skipped={}, countries={}, regions={}, comments={})",
            records.len(),
            dir.display(),
            skipped,
            countries.len(),
            regions.len(),
            comments.comments.len()
        );
        Ok(records)
    }
}

/// Reads `airports_combined.json`, a JSON array of airport objects.
/// Elements that do not decode as a record are skipped with a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombinedJsonSource;

impl RecordSource for CombinedJsonSource {
    fn name(&self) -> &'static str {
        "combined-json"
    }

    fn load(&self, dir: &Path) -> Result<Vec<AirportRecord>, IngestError> {
        let path = dir.join(COMBINED_JSON);
        if !path.exists() {
            return Err(IngestError::MissingFile(path));
        }
        let file = File::open(&path).map_err(|source| IngestError::Io {
            path: path.clone(),
            source,
        })?;
        let elements: Vec<Value> = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| IngestError::Json {
                path: path.clone(),
                source,
            })?;

        let mut records = Vec::with_capacity(elements.len());
        let mut skipped = 0usize;
        for (index, element) in elements.into_iter().enumerate() {
            match serde_json::from_value::<AirportRecord>(element) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping airport element {}: {}", index, e);
                }
            }
        }

        info!(
            "Loaded {} airports from {} (skipped={})",
            records.len(),
            path.display(),
            skipped
        );
        Ok(records)
    }
}

fn read_rows(
    path: &Path,
) -> Result<impl Iterator<Item = Result<CsvRow, csv::Error>>, IngestError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(reader.into_deserialize::<CsvRow>())
}

/// Optional enrichment files: absent or unreadable means "no enrichment".
fn load_optional<T: Default>(path: &Path, load: fn(&Path) -> Result<T, IngestError>) -> T {
    if !path.exists() {
        return T::default();
    }
    load(path).unwrap_or_else(|e| {
        warn!("Ignoring {}: {}", path.display(), e);
        T::default()
    })
}

fn load_places(path: &Path) -> Result<HashMap<String, Place>, IngestError> {
    let mut places = HashMap::new();
    for row in read_rows(path)? {
        let row = row.map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(code) = cell(&row, "code") {
            places.insert(
                code.to_string(),
                Place {
                    code: code.to_string(),
                    name: cell(&row, "name").map(str::to_string),
                },
            );
        }
    }
    Ok(places)
}

/// Comments indexed by airport ident and by numeric airport reference.
#[derive(Debug, Default)]
struct CommentIndex {
    comments: Vec<AirportComment>,
    by_ident: HashMap<String, Vec<usize>>,
    by_ref: HashMap<String, Vec<usize>>,
}

impl CommentIndex {
    fn load(path: &Path) -> Result<Self, IngestError> {
        let mut index = Self::default();
        for row in read_rows(path)? {
            let row = row.map_err(|source| IngestError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let comment = comment_from_row(row);
            let position = index.comments.len();
            if let Some(ident) = comment.airport_ident.clone() {
                index.by_ident.entry(ident).or_default().push(position);
            }
            if let Some(reference) = comment.airport_ref.clone() {
                index.by_ref.entry(reference).or_default().push(position);
            }
            index.comments.push(comment);
        }
        Ok(index)
    }

    /// Comments for an airport, matched by ident then by id, each at most once.
    fn for_airport(&self, ident: Option<&str>, id: Option<i64>) -> Vec<AirportComment> {
        let mut positions: Vec<usize> = Vec::new();
        if let Some(found) = ident.and_then(|i| self.by_ident.get(i)) {
            positions.extend(found);
        }
        if let Some(found) = id.and_then(|id| self.by_ref.get(&id.to_string())) {
            for position in found {
                if !positions.contains(position) {
                    positions.push(*position);
                }
            }
        }
        positions
            .into_iter()
            .map(|p| self.comments[p].clone())
            .collect()
    }
}

fn enrich(
    record: &mut AirportRecord,
    countries: &HashMap<String, Place>,
    regions: &HashMap<String, Place>,
    comments: &CommentIndex,
) {
    if let Some(code) = record.iso_country.as_deref() {
        record.country = countries.get(code).cloned();
    }
    if let Some(code) = record.iso_region.as_deref() {
        record.region = regions.get(code).cloned();
    }
    record.comments = comments.for_airport(record.ident.as_deref(), record.id);
}

/// Non-empty cell value. The reader already trims whitespace.
fn cell<'a>(row: &'a CsvRow, column: &str) -> Option<&'a str> {
    row.get(column).map(String::as_str).filter(|v| !v.is_empty())
}

fn owned(row: &CsvRow, column: &str) -> Option<String> {
    cell(row, column).map(str::to_string)
}

/// Lenient integer parsing: `"123"` and `"123.0"` both give 123.
fn parse_int(value: Option<&str>) -> Option<i64> {
    let value = value?;
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

fn parse_float(value: Option<&str>) -> Option<f64> {
    value?.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn airport_from_row(row: &CsvRow) -> AirportRecord {
    AirportRecord {
        id: parse_int(cell(row, "id")),
        ident: owned(row, "ident"),
        airport_type: owned(row, "type"),
        name: owned(row, "name"),
        latitude_deg: parse_float(cell(row, "latitude_deg")),
        longitude_deg: parse_float(cell(row, "longitude_deg")),
        elevation_ft: parse_int(cell(row, "elevation_ft")),
        continent: owned(row, "continent"),
        iso_country: owned(row, "iso_country"),
        iso_region: owned(row, "iso_region"),
        municipality: owned(row, "municipality"),
        gps_code: owned(row, "gps_code"),
        iata_code: owned(row, "iata_code"),
        icao_code: owned(row, "icao_code"),
        local_code: owned(row, "local_code"),
        home_link: owned(row, "home_link"),
        wikipedia_link: owned(row, "wikipedia_link"),
        keywords: owned(row, "keywords"),
        ..Default::default()
    }
}

/// Header spellings accepted for each modeled comment column.
const COMMENT_COLUMNS: [(&str, &str); 6] = [
    ("threadRef", "thread_ref"),
    ("airportRef", "airport_ref"),
    ("airportIdent", "airport_ident"),
    ("memberNickname", "member_nickname"),
    ("date", "date"),
    ("subject", "subject"),
];

fn comment_from_row(row: CsvRow) -> AirportComment {
    let pick = |camel: &str, snake: &str| owned(&row, camel).or_else(|| owned(&row, snake));
    let [thread_ref, airport_ref, airport_ident, member_nickname, date, subject] =
        COMMENT_COLUMNS.map(|(camel, snake)| pick(camel, snake));

    let modeled: Vec<&str> = COMMENT_COLUMNS
        .iter()
        .flat_map(|(camel, snake)| [*camel, *snake])
        .chain(["id", "body"])
        .collect();
    // BTreeMap keeps passthrough columns in a stable order.
    let extra: BTreeMap<&String, &String> = row
        .iter()
        .filter(|(k, v)| !modeled.contains(&k.as_str()) && !v.is_empty())
        .collect();
    let extra: Map<String, Value> = extra
        .into_iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    AirportComment {
        id: owned(&row, "id"),
        thread_ref,
        airport_ref,
        airport_ident,
        date,
        member_nickname,
        subject,
        body: owned(&row, "body"),
        extra,
    }
}

/// Default source order: raw CSV export first, pre-combined JSON second.
pub fn default_sources() -> Vec<Arc<dyn RecordSource>> {
    let csv: Arc<dyn RecordSource> = Arc::new(OurAirportsCsvSource);
    let json: Arc<dyn RecordSource> = Arc::new(CombinedJsonSource);
    vec![csv, json]
}
