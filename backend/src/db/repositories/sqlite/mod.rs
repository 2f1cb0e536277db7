//! SQLite repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures (locked or busy database)
//! - Per-connection pragmas: WAL journal, foreign keys, busy timeout
//! - Embedded schema migrations
//!
//! ## Configuration
//!
//! [`SqliteConfig`] is built from the `[sqlite]` settings table; the server
//! also reads these environment overrides:
//! - `DB_PATH`: Database file (default: `data/openflight.db`)
//! - `SQLITE_POOL_MAX`: Maximum pool size (default: 8)
//! - `SQLITE_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `SQLITE_BUSY_TIMEOUT_MS`: Busy timeout in milliseconds (default: 5000)
//! - `SQLITE_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `SQLITE_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)
//!
//! Filtering, ordering and windowing are rendered by the query module and run
//! as raw SQL with positional parameters. Writes and slug lookups use the
//! Diesel DSL against [`schema::airports`].

use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::{Sqlite, SqliteConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    AirportQueries, AirportStore, ErrorContext, RepositoryError, RepositoryResult,
};
use crate::models::{ensure_slug, AirportRecord};
use crate::query::{CompiledFilter, Window, ORDER_BY_SQL};

mod models;
mod schema;

use models::{CountRow, NewAirportRow, PayloadRow};
use schema::airports;

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/sqlite/migrations");

/// Default database location, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "data/openflight.db";

/// Configuration for the SQLite store.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path of the database file. Parent directories are created on open.
    pub database_path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// How long SQLite waits on a locked database before failing
    pub busy_timeout_ms: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            max_pool_size: 8,
            connection_timeout_sec: 30,
            busy_timeout_ms: 5_000,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl SqliteConfig {
    /// Create a new configuration for a database file.
    pub fn with_path(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Applies pragmas to every pooled connection on checkout from the manager.
#[derive(Debug)]
struct ConnectionPragmas {
    busy_timeout_ms: u64,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;",
            self.busy_timeout_ms
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Diesel-backed repository for SQLite.
#[derive(Clone, Debug)]
pub struct SqliteRepository {
    pool: SqlitePool,
    config: SqliteConfig,
    // Metrics counters
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl SqliteRepository {
    /// Open (creating if needed) the database and run pending migrations.
    ///
    /// # Returns
    /// * `Ok(SqliteRepository)` on success
    /// * `Err(RepositoryError)` if the file, pool or migrations fail
    pub fn new(config: SqliteConfig) -> RepositoryResult<Self> {
        ensure_parent_dir(&config.database_path)?;

        let url = config.database_path.to_string_lossy().into_owned();
        let manager = ConnectionManager::<SqliteConnection>::new(url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size.max(1))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .connection_customizer(Box::new(ConnectionPragmas {
                busy_timeout_ms: config.busy_timeout_ms,
            }))
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool").with_details(format!(
                        "path={}, max_size={}",
                        config.database_path.display(),
                        config.max_pool_size
                    )),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        log::info!(
            "Opened SQLite store at {} (pool max {})",
            config.database_path.display(),
            config.max_pool_size
        );

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut SqliteConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// The operation runs on the blocking pool and is retried up to
    /// `max_retries` times with exponential backoff while it fails with a
    /// retryable error.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        log::debug!("Retrying SQLite operation after: {}", e);
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.config.database_path
    }
}

fn ensure_parent_dir(path: &Path) -> RepositoryResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| {
                RepositoryError::configuration(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })
        }
        _ => Ok(()),
    }
}

/// Bind every filter parameter as TEXT, in placeholder order.
fn bind_params<'f>(
    sql: String,
    params: Vec<String>,
) -> diesel::query_builder::BoxedSqlQuery<'f, Sqlite, diesel::query_builder::SqlQuery> {
    let mut query = sql_query(sql).into_boxed::<Sqlite>();
    for param in params {
        query = query.bind::<Text, _>(param);
    }
    query
}

fn to_sql_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl AirportStore for SqliteRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn ensure_schema(&self) -> RepositoryResult<()> {
        self.with_conn(|conn| Self::run_migrations(conn)).await
    }

    async fn is_populated(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            airports::table
                .select(airports::slug)
                .first::<String>(conn)
                .optional()
                .map(|row| row.is_some())
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn count_all(&self) -> RepositoryResult<u64> {
        self.with_conn(|conn| {
            airports::table
                .count()
                .get_result::<i64>(conn)
                .map(|n| n.max(0) as u64)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn upsert_all(&self, mut records: Vec<AirportRecord>) -> RepositoryResult<usize> {
        records.iter_mut().for_each(ensure_slug);
        if let Some(position) = records.iter().position(|r| r.slug.is_empty()) {
            return Err(RepositoryError::query_with_context(
                "Record has no usable slug",
                ErrorContext::new("upsert_all")
                    .with_entity("airport")
                    .with_details(format!("position={}", position)),
            ));
        }

        let rows = records
            .iter()
            .map(NewAirportRow::from_record)
            .collect::<RepositoryResult<Vec<_>>>()?;
        let rows = Arc::new(rows);

        let written = self
            .with_conn(move |conn| {
                conn.immediate_transaction::<_, RepositoryError, _>(|tx| {
                    for row in rows.iter() {
                        diesel::replace_into(airports::table)
                            .values(row)
                            .execute(tx)?;
                    }
                    Ok(rows.len())
                })
            })
            .await
            .map_err(|e| e.with_operation("upsert_all"))?;

        log::info!("Upserted {} airport record(s) into SQLite", written);
        Ok(written)
    }
}

#[async_trait]
impl AirportQueries for SqliteRepository {
    async fn count_matching(&self, filter: &CompiledFilter) -> RepositoryResult<u64> {
        let (where_sql, params) = filter.where_clause();
        let sql = format!("SELECT COUNT(1) AS count FROM airports{}", where_sql);

        self.with_conn(move |conn| {
            bind_params(sql, params)
                .get_result::<CountRow>(conn)
                .map(|row| row.count.max(0) as u64)
                .map_err(RepositoryError::from)
        })
        .await
        .map_err(|e| e.with_operation("count_matching"))
    }

    async fn select_matching(
        &self,
        filter: &CompiledFilter,
        window: Window,
    ) -> RepositoryResult<Vec<AirportRecord>> {
        let (where_sql, params) = filter.where_clause();
        let sql = format!(
            "SELECT data FROM airports{}{} LIMIT ? OFFSET ?",
            where_sql, ORDER_BY_SQL
        );
        // SQLite treats a negative LIMIT as unbounded.
        let limit = window.limit.map(to_sql_i64).unwrap_or(-1);
        let offset = to_sql_i64(window.offset);

        let rows = self
            .with_conn(move |conn| {
                bind_params(sql, params)
                    .bind::<BigInt, _>(limit)
                    .bind::<BigInt, _>(offset)
                    .load::<PayloadRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await
            .map_err(|e| e.with_operation("select_matching"))?;

        rows.into_iter().map(PayloadRow::into_record).collect()
    }

    async fn get_by_slug(&self, slug: &str) -> RepositoryResult<Option<AirportRecord>> {
        let slug = slug.to_string();
        let payload = self
            .with_conn(move |conn| {
                airports::table
                    .filter(airports::slug.eq(&slug))
                    .select(airports::data)
                    .first::<String>(conn)
                    .optional()
                    .map_err(RepositoryError::from)
            })
            .await
            .map_err(|e| e.with_operation("get_by_slug"))?;

        payload
            .map(|data| PayloadRow { data }.into_record())
            .transpose()
    }
}
