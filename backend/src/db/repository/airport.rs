//! Airport store traits.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::AirportRecord;
use crate::query::{CompiledFilter, Window};

/// Lifecycle and bulk-write operations.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so a single instance can be shared
/// by every in-flight request.
#[async_trait]
pub trait AirportStore: Send + Sync {
    /// Check if the backing store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if healthy
    /// - `Ok(false)` if unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Create the table and indexes if absent. Idempotent.
    async fn ensure_schema(&self) -> RepositoryResult<()>;

    /// `true` once at least one record is stored.
    async fn is_populated(&self) -> RepositoryResult<bool>;

    /// Total number of stored records.
    async fn count_all(&self) -> RepositoryResult<u64>;

    /// Insert or replace records keyed by slug.
    ///
    /// A missing slug is derived before writing; a batch containing a record
    /// with no usable slug is rejected. The batch is applied atomically: on
    /// error nothing is written.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records written
    async fn upsert_all(&self, records: Vec<AirportRecord>) -> RepositoryResult<usize>;
}

/// Read operations driven by a compiled filter.
#[async_trait]
pub trait AirportQueries: Send + Sync {
    /// Number of records satisfying the filter.
    async fn count_matching(&self, filter: &CompiledFilter) -> RepositoryResult<u64>;

    /// Records satisfying the filter, in canonical order, restricted to the
    /// window.
    async fn select_matching(
        &self,
        filter: &CompiledFilter,
        window: Window,
    ) -> RepositoryResult<Vec<AirportRecord>>;

    /// Exact slug lookup. `Ok(None)` when no record has that slug.
    async fn get_by_slug(&self, slug: &str) -> RepositoryResult<Option<AirportRecord>>;
}
