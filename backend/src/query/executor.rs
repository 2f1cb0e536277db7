//! Query executor.
//!
//! Orchestrates population-on-demand, filter compilation, canonical ordering
//! and pagination. Safe to share across concurrent requests.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, error, warn};

use super::filter::{compile, AirportFilters};
use super::pagination::{PageInfo, Pagination};
use crate::db::{FullRepository, RepositoryError};
use crate::ingest::IngestionGate;
use crate::models::AirportRecord;

/// Cap applied in simple mode when the caller gives no limit.
pub const DEFAULT_LIMIT: u32 = 50;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub default_limit: u32,
    /// Directory handed to the ingestion gate on lazy population.
    pub source_dir: PathBuf,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            source_dir: PathBuf::from("imported_data"),
        }
    }
}

/// One query result.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    pub records: Vec<AirportRecord>,
    /// Total matching count; only computed in paginated mode.
    pub total: Option<u64>,
    pub page: Option<PageInfo>,
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The store is empty and could not be populated. Retryable.
    #[error("Dataset not ready: {0}")]
    NotReady(String),

    #[error(transparent)]
    Internal(#[from] RepositoryError),
}

impl QueryError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, QueryError::NotReady(_))
    }
}

pub struct QueryExecutor {
    repo: Arc<dyn FullRepository>,
    gate: Arc<IngestionGate>,
    config: ExecutorConfig,
}

impl QueryExecutor {
    pub fn new(
        repo: Arc<dyn FullRepository>,
        gate: Arc<IngestionGate>,
        config: ExecutorConfig,
    ) -> Self {
        Self { repo, gate, config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn FullRepository> {
        &self.repo
    }

    /// Run a filtered, ordered, windowed query.
    ///
    /// In paginated mode the total is counted with the same predicate before
    /// the page is fetched.
    pub async fn query(
        &self,
        filters: &AirportFilters,
        pagination: Pagination,
    ) -> Result<QueryPage, QueryError> {
        self.ensure_ready().await?;

        let compiled = compile(filters);
        let window = pagination.window(self.config.default_limit);

        let page = match pagination {
            Pagination::Paged { page, size } => {
                let total = self
                    .repo
                    .count_matching(&compiled)
                    .await
                    .map_err(|e| internal("count_matching", e))?;
                Some(PageInfo::new(page, size, total))
            }
            Pagination::Simple { .. } => None,
        };

        let records = self
            .repo
            .select_matching(&compiled, window)
            .await
            .map_err(|e| internal("select_matching", e))?;

        debug!(
            "Query with {} condition(s) returned {} record(s) (window {:?})",
            compiled.conditions().len(),
            records.len(),
            window
        );

        Ok(QueryPage {
            records,
            total: page.map(|p| p.total_count),
            page,
        })
    }

    /// Exact, case-sensitive slug lookup. `Ok(None)` when absent.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<AirportRecord>, QueryError> {
        self.ensure_ready().await?;
        self.repo
            .get_by_slug(slug)
            .await
            .map_err(|e| internal("get_by_slug", e))
    }

    /// Populate the store through the gate if it is empty.
    async fn ensure_ready(&self) -> Result<(), QueryError> {
        let populated = self
            .repo
            .is_populated()
            .await
            .map_err(|e| internal("is_populated", e))?;
        if populated {
            return Ok(());
        }

        match self.gate.ensure_populated(&self.config.source_dir).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Lazy population failed: {}", e);
                Err(QueryError::NotReady(e.to_string()))
            }
        }
    }
}

fn internal(operation: &str, err: RepositoryError) -> QueryError {
    let err = err.with_operation(operation);
    error!("Query failed: {}", err);
    QueryError::Internal(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;
    use crate::models::SlugCollisionPolicy;

    fn executor(repo: Arc<LocalRepository>) -> QueryExecutor {
        let gate = Arc::new(IngestionGate::new(repo.clone(), SlugCollisionPolicy::Suffix));
        QueryExecutor::new(
            repo,
            gate,
            ExecutorConfig {
                source_dir: PathBuf::from("/nonexistent/ariconnect-test-data"),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_empty_store_without_sources_is_not_ready() {
        let exec = executor(Arc::new(LocalRepository::new()));
        let err = exec
            .query(&AirportFilters::default(), Pagination::default())
            .await
            .unwrap_err();
        assert!(err.is_not_ready());
        assert!(exec.get_by_slug("anything").await.unwrap_err().is_not_ready());
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let repo = Arc::new(LocalRepository::new());
        repo.set_healthy(false);
        let err = executor(repo)
            .query(&AirportFilters::default(), Pagination::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Internal(_)));
    }
}
