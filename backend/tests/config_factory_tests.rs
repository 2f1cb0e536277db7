//! Tests for settings resolution and repository construction.

mod support;

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use ariconnect::config::{ConfigError, Settings, CONFIG_PATH_ENV};
use ariconnect::db::{RepositoryConfig, RepositoryFactory, RepositoryType};
use ariconnect::models::SlugCollisionPolicy;

const SETTINGS_VARS: [&str; 15] = [
    "APP_NAME",
    "ENVIRONMENT",
    "HOST",
    "PORT",
    "ALLOWED_ORIGINS",
    "DATA_DIR",
    "DB_PATH",
    "REPOSITORY_TYPE",
    "DEFAULT_LIMIT",
    "SLUG_COLLISIONS",
    "SQLITE_POOL_MAX",
    "SQLITE_BUSY_TIMEOUT_MS",
    "SQLITE_CONN_TIMEOUT_SEC",
    "SQLITE_MAX_RETRIES",
    "SQLITE_RETRY_DELAY_MS",
];

/// Clears every settings variable, then applies `set`.
fn env_changes<'a>(set: &[(&'a str, Option<&'a str>)]) -> Vec<(&'a str, Option<&'a str>)> {
    let mut changes: Vec<(&str, Option<&str>)> =
        SETTINGS_VARS.iter().map(|k| (*k, None)).collect();
    changes.extend_from_slice(set);
    changes
}

#[test]
fn test_settings_from_explicit_file_and_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ariconnect.toml");
    fs::write(
        &path,
        r#"
app_name = "Airports"
environment = "staging"
port = 9000
data_dir = "/srv/ourairports"
slug_collisions = "overwrite"

[repository]
type = "local"
"#,
    )
    .unwrap();
    let path_str = path.to_string_lossy().into_owned();

    let settings = support::with_scoped_env(
        &env_changes(&[
            (CONFIG_PATH_ENV, Some(path_str.as_str())),
            ("PORT", Some("9443")),
            ("DEFAULT_LIMIT", Some("20")),
        ]),
        Settings::load,
    )
    .unwrap();

    assert_eq!(settings.app_name, "Airports");
    assert_eq!(settings.environment, "staging");
    assert_eq!(settings.port, 9443);
    assert_eq!(settings.default_limit, 20);
    assert_eq!(settings.data_dir, PathBuf::from("/srv/ourairports"));
    assert_eq!(settings.slug_collisions, SlugCollisionPolicy::Overwrite);
    assert_eq!(settings.repository_type().unwrap(), RepositoryType::Local);
}

#[test]
fn test_settings_missing_explicit_file_is_an_error() {
    let result = support::with_scoped_env(
        &env_changes(&[(CONFIG_PATH_ENV, Some("/definitely/not/here.toml"))]),
        Settings::load,
    );
    assert!(matches!(result, Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_settings_reject_unknown_collision_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.toml");
    fs::write(&path, "").unwrap();
    let path_str = path.to_string_lossy().into_owned();

    let result = support::with_scoped_env(
        &env_changes(&[
            (CONFIG_PATH_ENV, Some(path_str.as_str())),
            ("SLUG_COLLISIONS", Some("random")),
        ]),
        Settings::load,
    );
    assert!(result.is_err());
}

#[test]
fn test_settings_file_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "port = \"not a number\"").unwrap();

    assert!(matches!(
        Settings::from_file(&path),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_repository_type_from_env_is_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.toml");
    fs::write(&path, "").unwrap();
    let path_str = path.to_string_lossy().into_owned();

    let settings = support::with_scoped_env(
        &env_changes(&[
            (CONFIG_PATH_ENV, Some(path_str.as_str())),
            ("REPOSITORY_TYPE", Some("memory")),
        ]),
        Settings::load,
    )
    .unwrap();
    assert_eq!(settings.repository_type().unwrap(), RepositoryType::Local);

    let result = support::with_scoped_env(
        &env_changes(&[
            (CONFIG_PATH_ENV, Some(path_str.as_str())),
            ("REPOSITORY_TYPE", Some("mongo")),
        ]),
        Settings::load,
    );
    assert!(matches!(result, Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_repository_type_from_str_invalid() {
    let result = RepositoryType::from_str("invalid");
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Unknown repository type"));
}

#[tokio::test]
async fn test_factory_from_config_file_local() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repository.toml");
    fs::write(&path, "[repository]\ntype = \"local\"\n").unwrap();

    let repo = RepositoryFactory::from_config_file(&path).await.unwrap();
    assert!(repo.health_check().await.unwrap());
    assert!(!repo.is_populated().await.unwrap());
}

#[tokio::test]
async fn test_factory_rejects_unknown_type() {
    let config: RepositoryConfig = toml::from_str("[repository]\ntype = \"mongo\"\n").unwrap();
    let err = RepositoryFactory::from_repository_config(&config)
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("Invalid repository type"));
}

#[cfg(feature = "sqlite-repo")]
#[tokio::test]
async fn test_factory_builds_sqlite_from_settings() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.repository.repo_type = "sqlite".into();
    settings.sqlite.database_path = dir.path().join("nested").join("airports.db");

    let repo = RepositoryFactory::from_repository_config(&settings.repository_config())
        .await
        .unwrap();
    assert!(repo.health_check().await.unwrap());
    assert!(dir.path().join("nested").join("airports.db").exists());
}
