//! Ingestion gate: populates an empty store from the source directory.
//!
//! The gate is the only writer in normal operation. It runs at most once per
//! cold start; concurrent callers that arrive while population is in flight
//! wait on the same lock and then observe the populated store.

use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::db::FullRepository;
use crate::models::{assign_slugs, AirportRecord, SlugCollisionPolicy};

pub mod error;
pub mod source;

pub use error::IngestError;
pub use source::{
    default_sources, CombinedJsonSource, OurAirportsCsvSource, RecordSource, AIRPORTS_CSV,
    COMBINED_JSON, COMMENTS_CSV, COUNTRIES_CSV, REGIONS_CSV,
};

/// Outcome of [`IngestionGate::ensure_populated`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Records written by this call; 0 when the store was already populated.
    pub written: usize,
    /// Records in the store (already populated) or in the loaded dataset.
    pub total: u64,
    /// Source that supplied the dataset, when this call loaded one.
    pub source: Option<&'static str>,
    /// Slug collisions resolved while loading.
    pub collisions: usize,
}

impl IngestReport {
    fn already_populated(total: u64) -> Self {
        Self {
            written: 0,
            total,
            source: None,
            collisions: 0,
        }
    }
}

/// Ensures the store holds the dataset before it is queried.
pub struct IngestionGate {
    repo: Arc<dyn FullRepository>,
    sources: Vec<Arc<dyn RecordSource>>,
    policy: SlugCollisionPolicy,
    lock: Mutex<()>,
}

impl IngestionGate {
    /// Gate using the default source order (CSV export, then combined JSON).
    pub fn new(repo: Arc<dyn FullRepository>, policy: SlugCollisionPolicy) -> Self {
        Self::with_sources(repo, default_sources(), policy)
    }

    /// Gate trying `sources` in order, each exactly once per population.
    pub fn with_sources(
        repo: Arc<dyn FullRepository>,
        sources: Vec<Arc<dyn RecordSource>>,
        policy: SlugCollisionPolicy,
    ) -> Self {
        Self {
            repo,
            sources,
            policy,
            lock: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> SlugCollisionPolicy {
        self.policy
    }

    /// Populate the store from `dir` if it is empty.
    ///
    /// # Returns
    /// * `Ok(IngestReport)` with `written == 0` when data was already present
    /// * `Err(IngestError::SourceMissing)` when no source could supply data
    /// * `Err(IngestError::Store)` when the store rejected the batch
    pub async fn ensure_populated(&self, dir: &Path) -> Result<IngestReport, IngestError> {
        self.repo.ensure_schema().await?;
        if self.repo.is_populated().await? {
            return Ok(IngestReport::already_populated(self.repo.count_all().await?));
        }

        let _guard = self.lock.lock().await;
        // Another caller may have finished population while we waited.
        if self.repo.is_populated().await? {
            return Ok(IngestReport::already_populated(self.repo.count_all().await?));
        }

        let (source, mut records) = self.load_first_available(dir).await?;
        let collisions = assign_slugs(&mut records, self.policy);
        let total = records.len() as u64;
        let written = self.repo.upsert_all(records).await?;

        info!(
            "Populated store from {} via {}: {} written, {} loaded, {} slug collision(s)",
            dir.display(),
            source,
            written,
            total,
            collisions
        );
        Ok(IngestReport {
            written,
            total,
            source: Some(source),
            collisions,
        })
    }

    async fn load_first_available(
        &self,
        dir: &Path,
    ) -> Result<(&'static str, Vec<AirportRecord>), IngestError> {
        let mut reasons = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let name = source.name();
            let loader = Arc::clone(source);
            let path = dir.to_path_buf();
            let loaded = tokio::task::spawn_blocking(move || loader.load(&path))
                .await
                .map_err(|e| IngestError::Task(e.to_string()))?;

            match loaded {
                Ok(records) if !records.is_empty() => return Ok((name, records)),
                Ok(_) => {
                    let err = IngestError::Empty(name.to_string());
                    warn!("{}", err);
                    reasons.push(format!("{}: {}", name, err));
                }
                Err(e) => {
                    warn!("Source {} unavailable: {}", name, e);
                    reasons.push(format!("{}: {}", name, e));
                }
            }
        }

        Err(IngestError::SourceMissing {
            dir: dir.to_path_buf(),
            reasons: reasons.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AirportQueries, AirportStore, LocalRepository};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: Arc<AtomicUsize>,
        records: Vec<AirportRecord>,
    }

    impl RecordSource for CountingSource {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn load(&self, _dir: &Path) -> Result<Vec<AirportRecord>, IngestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.records.clone())
        }
    }

    struct FailingSource;

    impl RecordSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn load(&self, dir: &Path) -> Result<Vec<AirportRecord>, IngestError> {
            Err(IngestError::MissingFile(dir.join("nothing.csv")))
        }
    }

    fn named(name: &str) -> AirportRecord {
        AirportRecord {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_populates_once_and_then_reports_existing_total() {
        let repo = Arc::new(LocalRepository::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = IngestionGate::with_sources(
            repo.clone(),
            vec![Arc::new(CountingSource {
                calls: calls.clone(),
                records: vec![named("Alpha"), named("Beta")],
            }) as Arc<dyn RecordSource>],
            SlugCollisionPolicy::Suffix,
        );

        let first = gate.ensure_populated(Path::new("unused")).await.unwrap();
        assert_eq!(first.written, 2);
        assert_eq!(first.total, 2);
        assert_eq!(first.source, Some("counting"));

        let second = gate.ensure_populated(Path::new("unused")).await.unwrap();
        assert_eq!(second, IngestReport::already_populated(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(repo.get_by_slug("alpha").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_falls_back_to_next_source() {
        let repo = Arc::new(LocalRepository::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = IngestionGate::with_sources(
            repo.clone(),
            vec![
                Arc::new(FailingSource) as Arc<dyn RecordSource>,
                Arc::new(CountingSource {
                    calls,
                    records: vec![named("Gamma")],
                }),
            ],
            SlugCollisionPolicy::Suffix,
        );

        let report = gate.ensure_populated(Path::new("unused")).await.unwrap();
        assert_eq!(report.source, Some("counting"));
        assert_eq!(repo.count_all().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_source_missing() {
        let repo = Arc::new(LocalRepository::new());
        let gate = IngestionGate::with_sources(
            repo.clone(),
            vec![
                Arc::new(FailingSource) as Arc<dyn RecordSource>,
                Arc::new(FailingSource),
            ],
            SlugCollisionPolicy::Suffix,
        );

        let err = gate.ensure_populated(Path::new("missing")).await.unwrap_err();
        assert!(err.is_source_missing());
        assert!(!repo.is_populated().await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_first_touch_loads_once() {
        let repo = Arc::new(LocalRepository::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(IngestionGate::with_sources(
            repo.clone(),
            vec![Arc::new(CountingSource {
                calls: calls.clone(),
                records: (0..20).map(|i| named(&format!("Field {}", i))).collect(),
            }) as Arc<dyn RecordSource>],
            SlugCollisionPolicy::Suffix,
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.ensure_populated(Path::new("unused")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(repo.count_all().await.unwrap(), 20);
    }
}
