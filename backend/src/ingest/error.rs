use std::path::PathBuf;

use crate::db::RepositoryError;

/// Error type for dataset ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// A file a source requires does not exist.
    #[error("Required source file not found: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The source was readable but held no airports.
    #[error("Source {0} produced no records")]
    Empty(String),

    /// Every configured source failed; the dataset cannot be populated.
    #[error("No usable airport dataset in {dir}: {reasons}")]
    SourceMissing { dir: PathBuf, reasons: String },

    #[error(transparent)]
    Store(#[from] RepositoryError),

    #[error("Ingestion task failed: {0}")]
    Task(String),
}

impl IngestError {
    /// `true` when the failure means "no data yet" rather than a store fault.
    pub fn is_source_missing(&self) -> bool {
        matches!(self, IngestError::SourceMissing { .. })
    }
}
