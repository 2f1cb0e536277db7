//! Record store: repository traits and storage backends.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP layer / binary                                     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  QueryExecutor + IngestionGate                           │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (AirportStore, AirportQueries)        │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │  SqliteRepository            │  LocalRepository
//!     │  (Diesel + r2d2)             │  (in-memory)
//!     └──────────────────────────────┘
//! ```
//!
//! # Recommended Usage
//!
//! ```ignore
//! use ariconnect::db::{RepositoryFactory, RepositoryType, SqliteConfig};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SqliteConfig::with_path("data/openflight.db");
//!     let repo = RepositoryFactory::create(RepositoryType::Sqlite, Some(&config)).await?;
//!     repo.ensure_schema().await?;
//!     Ok(())
//! }
//! ```
//!
//! Repositories are constructed once and passed explicitly; there is no
//! process-wide instance.

#[cfg(not(any(feature = "sqlite-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

#[cfg(feature = "sqlite-repo")]
pub use repositories::sqlite::{PoolStats, SqliteConfig, DEFAULT_DB_PATH};

/// Placeholder so configuration code compiles without the SQLite backend.
#[cfg(not(feature = "sqlite-repo"))]
#[derive(Debug, Clone, Default)]
pub struct SqliteConfig {
    pub database_path: std::path::PathBuf,
    pub max_pool_size: u32,
    pub connection_timeout_sec: u64,
    pub busy_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

#[cfg(not(feature = "sqlite-repo"))]
pub const DEFAULT_DB_PATH: &str = "data/openflight.db";

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "sqlite-repo")]
pub use repositories::SqliteRepository;
pub use repository::{
    AirportQueries, AirportStore, ErrorContext, FullRepository, RepositoryError,
    RepositoryResult,
};
