//! In-memory local repository implementation.
//!
//! Stores records in a `BTreeMap` keyed by slug and evaluates compiled
//! filters directly against each record. Suitable for unit tests and local
//! development; data does not survive the process.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::repository::{
    AirportQueries, AirportStore, ErrorContext, RepositoryError, RepositoryResult,
};
use crate::models::{ensure_slug, AirportRecord};
use crate::query::{ordering, CompiledFilter, Window};

/// In-memory local repository.
///
/// Cloning is cheap and every clone shares the same data.
///
/// # Example
/// ```ignore
/// use ariconnect::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::with_records(fixtures());
/// assert_eq!(repo.record_count(), fixtures().len());
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    airports: BTreeMap<String, AirportRecord>,
    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            airports: BTreeMap::new(),
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Create a repository pre-loaded with records.
    ///
    /// Records without a slug are skipped; later duplicates replace earlier
    /// ones.
    pub fn with_records(records: impl IntoIterator<Item = AirportRecord>) -> Self {
        let repo = Self::new();
        {
            let mut data = repo.data.write();
            for record in records {
                if !record.slug.is_empty() {
                    data.airports.insert(record.slug.clone(), record);
                }
            }
        }
        repo
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Remove every stored record, keeping the health flag.
    pub fn clear(&self) {
        self.data.write().airports.clear();
    }

    pub fn record_count(&self) -> usize {
        self.data.read().airports.len()
    }

    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Database is not healthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }

    fn matching(&self, filter: &CompiledFilter) -> Vec<AirportRecord> {
        let data = self.data.read();
        let mut records: Vec<AirportRecord> = data
            .airports
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        ordering::sort_records(&mut records);
        records
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AirportStore for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn ensure_schema(&self) -> RepositoryResult<()> {
        self.check_health("ensure_schema")
    }

    async fn is_populated(&self) -> RepositoryResult<bool> {
        self.check_health("is_populated")?;
        Ok(!self.data.read().airports.is_empty())
    }

    async fn count_all(&self) -> RepositoryResult<u64> {
        self.check_health("count_all")?;
        Ok(self.data.read().airports.len() as u64)
    }

    async fn upsert_all(&self, mut records: Vec<AirportRecord>) -> RepositoryResult<usize> {
        self.check_health("upsert_all")?;

        records.iter_mut().for_each(ensure_slug);
        // Validate the whole batch before touching stored data.
        if let Some(position) = records.iter().position(|r| r.slug.is_empty()) {
            return Err(RepositoryError::query_with_context(
                "Record has no usable slug",
                ErrorContext::new("upsert_all")
                    .with_entity("airport")
                    .with_details(format!("position={}", position)),
            ));
        }

        let written = records.len();
        let mut data = self.data.write();
        for record in records {
            data.airports.insert(record.slug.clone(), record);
        }
        Ok(written)
    }
}

#[async_trait]
impl AirportQueries for LocalRepository {
    async fn count_matching(&self, filter: &CompiledFilter) -> RepositoryResult<u64> {
        self.check_health("count_matching")?;
        if filter.is_unrestricted() {
            return Ok(self.data.read().airports.len() as u64);
        }
        let data = self.data.read();
        Ok(data.airports.values().filter(|r| filter.matches(r)).count() as u64)
    }

    async fn select_matching(
        &self,
        filter: &CompiledFilter,
        window: Window,
    ) -> RepositoryResult<Vec<AirportRecord>> {
        self.check_health("select_matching")?;
        let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
        let limit = window
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(self
            .matching(filter)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn get_by_slug(&self, slug: &str) -> RepositoryResult<Option<AirportRecord>> {
        self.check_health("get_by_slug")?;
        Ok(self.data.read().airports.get(slug).cloned())
    }
}
