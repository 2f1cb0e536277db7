//! Repository factory for dependency injection.
//!
//! Creates repository instances from runtime configuration.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::repo_config::RepositoryConfig;
use super::repositories::LocalRepository;
#[cfg(feature = "sqlite-repo")]
use super::repositories::SqliteRepository;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use super::SqliteConfig;

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryType {
    /// SQLite + Diesel implementation
    Sqlite,
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("sqlite", "local").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl Default for RepositoryType {
    /// SQLite when compiled in, otherwise the in-memory store.
    fn default() -> Self {
        if cfg!(feature = "sqlite-repo") {
            Self::Sqlite
        } else {
            Self::Local
        }
    }
}

fn sqlite_disabled() -> RepositoryError {
    RepositoryError::configuration("SQLite repository feature not enabled")
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```ignore
/// use ariconnect::db::{RepositoryFactory, RepositoryType, SqliteConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = SqliteConfig::with_path("data/openflight.db");
///     let _sqlite = RepositoryFactory::create(RepositoryType::Sqlite, Some(&config)).await?;
///     let _local = RepositoryFactory::create_local();
///     Ok(())
/// }
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    ///
    /// # Arguments
    /// * `repo_type` - Type of repository to create
    /// * `sqlite_config` - Optional SQLite configuration; defaults are used
    ///   when absent
    pub async fn create(
        repo_type: RepositoryType,
        sqlite_config: Option<&SqliteConfig>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Sqlite => {
                #[cfg(feature = "sqlite-repo")]
                {
                    let config = sqlite_config.cloned().unwrap_or_default();
                    let repo = Self::create_sqlite(config).await?;
                    Ok(repo as Arc<dyn FullRepository>)
                }
                #[cfg(not(feature = "sqlite-repo"))]
                {
                    let _ = sqlite_config;
                    Err(sqlite_disabled())
                }
            }
            RepositoryType::Local => Ok(Self::create_local()),
        }
    }

    /// Create a SQLite repository. Opening the pool and running migrations
    /// is blocking work, so it runs on the blocking pool.
    #[cfg(feature = "sqlite-repo")]
    pub async fn create_sqlite(config: SqliteConfig) -> RepositoryResult<Arc<SqliteRepository>> {
        let repo = tokio::task::spawn_blocking(move || SqliteRepository::new(config))
            .await
            .map_err(|e| RepositoryError::internal(format!("Task join error: {}", e)))??;
        Ok(Arc::new(repo))
    }

    /// Create an in-memory local repository.
    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create repository from a TOML configuration file.
    pub async fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = RepositoryConfig::from_file(config_path)?;
        Self::from_repository_config(&config).await
    }

    /// Create repository from a [`RepositoryConfig`] instance.
    pub async fn from_repository_config(
        config: &RepositoryConfig,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo_type = config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;
        let sqlite = config.to_sqlite_config();
        Self::create(repo_type, Some(&sqlite)).await
    }
}

/// Builder for configuring repository creation.
///
/// # Example
/// ```ignore
/// use ariconnect::db::{RepositoryBuilder, RepositoryType, SqliteConfig};
///
/// let repo = RepositoryBuilder::new()
///     .repository_type(RepositoryType::Sqlite)
///     .sqlite_config(SqliteConfig::with_path("/var/lib/ariconnect/airports.db"))
///     .build()
///     .await?;
/// ```
pub struct RepositoryBuilder {
    repo_type: RepositoryType,
    sqlite_config: Option<SqliteConfig>,
}

impl RepositoryBuilder {
    /// Create a new builder using the compiled-in default backend.
    pub fn new() -> Self {
        Self {
            repo_type: RepositoryType::default(),
            sqlite_config: None,
        }
    }

    /// Set the repository type.
    pub fn repository_type(mut self, repo_type: RepositoryType) -> Self {
        self.repo_type = repo_type;
        self
    }

    /// Set the SQLite configuration.
    pub fn sqlite_config(mut self, config: SqliteConfig) -> Self {
        self.sqlite_config = Some(config);
        self
    }

    /// Build the repository instance.
    pub async fn build(self) -> RepositoryResult<Arc<dyn FullRepository>> {
        if self.repo_type == RepositoryType::Sqlite && !cfg!(feature = "sqlite-repo") {
            return Err(sqlite_disabled());
        }
        RepositoryFactory::create(self.repo_type, self.sqlite_config.as_ref()).await
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
