//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::Settings;
use crate::query::QueryExecutor;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Query executor shared by every request
    pub executor: Arc<QueryExecutor>,
    /// Allowed CORS origins; `["*"]` allows any
    pub allowed_origins: Vec<String>,
}

impl AppState {
    /// Create a new application state allowing any origin.
    pub fn new(executor: Arc<QueryExecutor>) -> Self {
        Self {
            executor,
            allowed_origins: vec!["*".to_string()],
        }
    }

    /// Create application state using the CORS origins from `settings`.
    pub fn from_settings(executor: Arc<QueryExecutor>, settings: &Settings) -> Self {
        Self {
            executor,
            allowed_origins: settings.allowed_origins_list(),
        }
    }
}
