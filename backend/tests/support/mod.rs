#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use ariconnect::db::FullRepository;
use ariconnect::ingest::{IngestionGate, COMBINED_JSON};
use ariconnect::models::{assign_slugs, AirportRecord, Place, SlugCollisionPolicy};
use ariconnect::query::{ExecutorConfig, QueryExecutor};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Airport without slug; callers derive slugs or let the gate do it.
pub fn airport(
    ident: &str,
    airport_type: &str,
    name: &str,
    iata: Option<&str>,
    municipality: &str,
    (country_code, country_name): (&str, &str),
    (region_code, region_name): (&str, &str),
) -> AirportRecord {
    AirportRecord {
        ident: Some(ident.to_string()),
        airport_type: Some(airport_type.to_string()),
        name: Some(name.to_string()),
        iata_code: iata.map(str::to_string),
        icao_code: (ident.len() == 4 && ident.chars().all(|c| c.is_ascii_alphabetic()))
            .then(|| ident.to_string()),
        municipality: Some(municipality.to_string()),
        iso_country: Some(country_code.to_string()),
        iso_region: Some(region_code.to_string()),
        country: Some(Place::new(country_code, country_name)),
        region: Some(Place::new(region_code, region_name)),
        ..Default::default()
    }
}

const US: (&str, &str) = ("US", "United States");
const NY: (&str, &str) = ("US-NY", "New York");

/// Ten airports across every ranking bucket. Four are in New York state and
/// three fall in the derived "other" category.
pub fn raw_sample_airports() -> Vec<AirportRecord> {
    vec![
        airport(
            "KLAX",
            "large_airport",
            "Los Angeles International Airport",
            Some("LAX"),
            "Los Angeles",
            US,
            ("US-CA", "California"),
        ),
        airport(
            "KJFK",
            "large_airport",
            "John F Kennedy International Airport",
            Some("JFK"),
            "New York",
            US,
            NY,
        ),
        airport(
            "EGLL",
            "large_airport",
            "London Heathrow Airport",
            Some("LHR"),
            "London",
            ("GB", "United Kingdom"),
            ("GB-ENG", "England"),
        ),
        airport(
            "CYYZ",
            "large_airport",
            "Toronto Pearson International Airport",
            Some("YYZ"),
            "Toronto",
            ("CA", "Canada"),
            ("CA-ON", "Ontario"),
        ),
        airport(
            "KISP",
            "medium_airport",
            "Long Island MacArthur Airport",
            Some("ISP"),
            "Islip",
            US,
            NY,
        ),
        airport(
            "KTEB",
            "medium_airport",
            "Teterboro Airport",
            Some("TEB"),
            "Teterboro",
            US,
            ("US-NJ", "New Jersey"),
        ),
        airport(
            "NY01",
            "small_airport",
            "Hudson Valley Strip",
            None,
            "Hudson",
            US,
            NY,
        ),
        airport(
            "NY02",
            "seaplane_base",
            "Lake Placid Seaplane Base",
            None,
            "Lake Placid",
            US,
            NY,
        ),
        airport(
            "00A",
            "heliport",
            "Total RF Heliport",
            None,
            "Bensalem",
            US,
            ("US-PA", "Pennsylvania"),
        ),
        airport(
            "XXCL",
            "closed",
            "Old Field",
            None,
            "Nowhere",
            ("GB", "United Kingdom"),
            ("GB-ENG", "England"),
        ),
    ]
}

/// [`raw_sample_airports`] with slugs derived.
pub fn sample_airports() -> Vec<AirportRecord> {
    with_slugs(raw_sample_airports())
}

/// `count` large airports named "Large Airport NNN" with idents `LNNN`.
pub fn large_airports(count: usize) -> Vec<AirportRecord> {
    with_slugs(
        (0..count)
            .map(|i| {
                airport(
                    &format!("L{:03}", i),
                    "large_airport",
                    &format!("Large Airport {:03}", i),
                    None,
                    "Somewhere",
                    US,
                    NY,
                )
            })
            .collect(),
    )
}

pub fn with_slugs(mut records: Vec<AirportRecord>) -> Vec<AirportRecord> {
    assign_slugs(&mut records, SlugCollisionPolicy::Suffix);
    records
}

pub fn slugs(records: &[AirportRecord]) -> Vec<&str> {
    records.iter().map(|r| r.slug.as_str()).collect()
}

pub fn idents(records: &[AirportRecord]) -> Vec<&str> {
    records
        .iter()
        .map(|r| r.ident.as_deref().unwrap_or_default())
        .collect()
}

/// Write `records` as the pre-combined JSON fallback source.
pub fn write_combined_json(dir: &Path, records: &[AirportRecord]) {
    let payload = serde_json::to_string_pretty(records).unwrap();
    fs::write(dir.join(COMBINED_JSON), payload).unwrap();
}

/// Executor over `repo` whose gate reads from `source_dir`.
pub fn executor(repo: Arc<dyn FullRepository>, source_dir: &Path) -> QueryExecutor {
    let gate = Arc::new(IngestionGate::new(
        repo.clone(),
        SlugCollisionPolicy::Suffix,
    ));
    QueryExecutor::new(
        repo,
        gate,
        ExecutorConfig {
            source_dir: source_dir.to_path_buf(),
            ..ExecutorConfig::default()
        },
    )
}
