//! Application settings.
//!
//! Settings are resolved once at start-up and passed explicitly. Sources, from
//! lowest to highest precedence:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file (`ariconnect.toml`, or the path in
//!    `ARICONNECT_CONFIG`)
//! 3. Environment variables
//!
//! # Environment Variables
//! - `APP_NAME` (default: `AriConnect`)
//! - `ENVIRONMENT` (default: `production`)
//! - `HOST` / `PORT` (default: `0.0.0.0:8080`)
//! - `ALLOWED_ORIGINS`: comma-separated list or `*` (default: `*`)
//! - `DATA_DIR`: source directory for ingestion (default: `imported_data`)
//! - `DEFAULT_LIMIT`: simple-mode result cap (default: 50)
//! - `SLUG_COLLISIONS`: `suffix` | `overwrite` (default: `suffix`)
//! - `REPOSITORY_TYPE`: `sqlite` | `local`
//! - `DB_PATH`, `SQLITE_POOL_MAX`, `SQLITE_BUSY_TIMEOUT_MS`

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::db::repo_config::{RepositorySettings, SqliteSettings};
use crate::db::{RepositoryConfig, RepositoryType, SqliteConfig};
use crate::models::SlugCollisionPolicy;
use crate::query::{ExecutorConfig, DEFAULT_LIMIT};

/// Name of the settings file searched for in the standard locations.
pub const CONFIG_FILE_NAME: &str = "ariconnect.toml";

/// Environment variable holding an explicit settings file path.
pub const CONFIG_PATH_ENV: &str = "ARICONNECT_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Resolved application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app_name: String,
    pub environment: String,
    pub host: String,
    pub port: u16,
    /// Comma-separated origins, or `*` for any.
    pub allowed_origins: String,
    /// Directory the ingestion gate reads source files from.
    pub data_dir: PathBuf,
    pub default_limit: u32,
    pub slug_collisions: SlugCollisionPolicy,
    pub repository: RepositorySettings,
    pub sqlite: SqliteSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "AriConnect".to_string(),
            environment: "production".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: "*".to_string(),
            data_dir: PathBuf::from("imported_data"),
            default_limit: DEFAULT_LIMIT,
            slug_collisions: SlugCollisionPolicy::default(),
            repository: RepositorySettings::default(),
            sqlite: SqliteSettings::default(),
        }
    }
}

impl Settings {
    /// Resolve settings from the optional file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = match Self::locate_file()? {
            Some(path) => {
                log::info!("Loading settings from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        settings.apply_overrides(|key| env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse a settings file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// An explicit `ARICONNECT_CONFIG` path must exist; otherwise the first
    /// `ariconnect.toml` found in `.`, `backend/` or `..` is used.
    fn locate_file() -> Result<Option<PathBuf>, ConfigError> {
        if let Ok(explicit) = env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(explicit);
            if !path.exists() {
                return Err(ConfigError::invalid(
                    CONFIG_PATH_ENV,
                    path.display().to_string(),
                    "file does not exist",
                ));
            }
            return Ok(Some(path));
        }

        let search_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            Path::new("backend").join(CONFIG_FILE_NAME),
            Path::new("..").join(CONFIG_FILE_NAME),
        ];
        Ok(search_paths.into_iter().find(|p| p.exists()))
    }

    /// Apply overrides from a variable lookup (the environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("APP_NAME") {
            self.app_name = v;
        }
        if let Some(v) = var("ENVIRONMENT") {
            self.environment = v;
        }
        if let Some(v) = var("HOST") {
            self.host = v;
        }
        if let Some(v) = var("PORT") {
            self.port = parse_number("PORT", &v)?;
        }
        if let Some(v) = var("ALLOWED_ORIGINS") {
            self.allowed_origins = v;
        }
        if let Some(v) = var("DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = var("DEFAULT_LIMIT") {
            self.default_limit = parse_number("DEFAULT_LIMIT", &v)?;
        }
        if let Some(v) = var("SLUG_COLLISIONS") {
            self.slug_collisions = SlugCollisionPolicy::from_str(&v)
                .map_err(|reason| ConfigError::invalid("SLUG_COLLISIONS", v.clone(), reason))?;
        }
        if let Some(v) = var("REPOSITORY_TYPE") {
            self.repository.repo_type = v;
        }
        if let Some(v) = var("DB_PATH") {
            self.sqlite.database_path = PathBuf::from(v);
        }
        if let Some(v) = var("SQLITE_POOL_MAX") {
            self.sqlite.max_connections = parse_number("SQLITE_POOL_MAX", &v)?;
        }
        if let Some(v) = var("SQLITE_BUSY_TIMEOUT_MS") {
            self.sqlite.busy_timeout_ms = parse_number("SQLITE_BUSY_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = var("SQLITE_CONN_TIMEOUT_SEC") {
            self.sqlite.connect_timeout = parse_number("SQLITE_CONN_TIMEOUT_SEC", &v)?;
        }
        if let Some(v) = var("SQLITE_MAX_RETRIES") {
            self.sqlite.max_retries = parse_number("SQLITE_MAX_RETRIES", &v)?;
        }
        if let Some(v) = var("SQLITE_RETRY_DELAY_MS") {
            self.sqlite.retry_delay_ms = parse_number("SQLITE_RETRY_DELAY_MS", &v)?;
        }
        Ok(())
    }

    /// Reject settings the rest of the system cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_limit == 0 {
            return Err(ConfigError::invalid("default_limit", "0", "must be at least 1"));
        }
        if self.sqlite.max_connections == 0 {
            return Err(ConfigError::invalid(
                "sqlite.max_connections",
                "0",
                "must be at least 1",
            ));
        }
        self.repository_type()?;
        Ok(())
    }

    pub fn repository_type(&self) -> Result<RepositoryType, ConfigError> {
        RepositoryType::from_str(&self.repository.repo_type).map_err(|reason| {
            ConfigError::invalid("repository.type", self.repository.repo_type.clone(), reason)
        })
    }

    pub fn repository_config(&self) -> RepositoryConfig {
        RepositoryConfig {
            repository: self.repository.clone(),
            sqlite: self.sqlite.clone(),
        }
    }

    pub fn sqlite_config(&self) -> SqliteConfig {
        self.repository_config().to_sqlite_config()
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            default_limit: self.default_limit,
            source_dir: self.data_dir.clone(),
        }
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Configured origins; `["*"]` when any origin is allowed.
    pub fn allowed_origins_list(&self) -> Vec<String> {
        let value = self.allowed_origins.trim();
        if value.is_empty() || value == "*" {
            return vec!["*".to_string()];
        }
        value
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, value, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.app_name, "AriConnect");
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
        assert_eq!(settings.data_dir, PathBuf::from("imported_data"));
        assert_eq!(settings.default_limit, 50);
        assert_eq!(settings.slug_collisions, SlugCollisionPolicy::Suffix);
        assert_eq!(settings.allowed_origins_list(), vec!["*"]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_file_then_env_precedence() {
        let toml = r#"
app_name = "Airports"
port = 9000
default_limit = 25

[repository]
type = "local"

[sqlite]
database_path = "/tmp/from-file.db"
"#;
        let mut settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.environment, "production");

        settings
            .apply_overrides(lookup(&[
                ("PORT", "9100"),
                ("DB_PATH", "/tmp/from-env.db"),
                ("SLUG_COLLISIONS", "overwrite"),
                ("ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ]))
            .unwrap();

        assert_eq!(settings.app_name, "Airports");
        assert_eq!(settings.port, 9100);
        assert_eq!(settings.default_limit, 25);
        assert_eq!(settings.repository_type().unwrap(), RepositoryType::Local);
        assert_eq!(
            settings.sqlite_config().database_path,
            PathBuf::from("/tmp/from-env.db")
        );
        assert_eq!(settings.slug_collisions, SlugCollisionPolicy::Overwrite);
        assert_eq!(
            settings.allowed_origins_list(),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_sqlite_tuning_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(lookup(&[
                ("SQLITE_POOL_MAX", "4"),
                ("SQLITE_BUSY_TIMEOUT_MS", "250"),
                ("SQLITE_CONN_TIMEOUT_SEC", "7"),
                ("SQLITE_MAX_RETRIES", "5"),
                ("SQLITE_RETRY_DELAY_MS", "20"),
            ]))
            .unwrap();

        let sqlite = settings.sqlite_config();
        assert_eq!(sqlite.max_pool_size, 4);
        assert_eq!(sqlite.busy_timeout_ms, 250);
        assert_eq!(sqlite.connection_timeout_sec, 7);
        assert_eq!(sqlite.max_retries, 5);
        assert_eq!(sqlite.retry_delay_ms, 20);

        let err = settings
            .apply_overrides(lookup(&[("SQLITE_MAX_RETRIES", "-1")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "SQLITE_MAX_RETRIES"));
    }

    #[test]
    fn test_invalid_override_is_reported() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides(lookup(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(lookup(&[("DATA_DIR", "  ")]))
            .unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("imported_data"));
    }

    #[test]
    fn test_validate_rejects_zero_limit_and_unknown_backend() {
        let settings = Settings {
            default_limit: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.repository.repo_type = "oracle".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_executor_config_follows_settings() {
        let settings = Settings {
            default_limit: 10,
            data_dir: PathBuf::from("/srv/data"),
            ..Settings::default()
        };
        let executor = settings.executor_config();
        assert_eq!(executor.default_limit, 10);
        assert_eq!(executor.source_dir, PathBuf::from("/srv/data"));
    }
}
