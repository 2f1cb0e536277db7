//! AriConnect HTTP Server Binary
//!
//! Resolves settings, opens the repository, populates it from the source
//! directory when empty, and serves the REST API.
//!
//! # Usage
//!
//! ```bash
//! # SQLite store (default)
//! DATA_DIR=imported_data DB_PATH=data/openflight.db cargo run --bin ariconnect-server
//!
//! # In-memory store
//! REPOSITORY_TYPE=local cargo run --bin ariconnect-server
//! ```
//!
//! See [`ariconnect::config`] for every setting. `RUST_LOG` sets the log
//! level (default: info).

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use ariconnect::config::Settings;
use ariconnect::db::RepositoryFactory;
use ariconnect::http::{create_router, AppState};
use ariconnect::ingest::IngestionGate;
use ariconnect::query::QueryExecutor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let settings = Settings::load()?;
    info!(
        "Starting {} ({}) v{}",
        settings.app_name,
        settings.environment,
        env!("CARGO_PKG_VERSION")
    );

    let repository =
        RepositoryFactory::from_repository_config(&settings.repository_config()).await?;
    info!("Repository initialized ({})", settings.repository.repo_type);

    let gate = Arc::new(IngestionGate::new(
        repository.clone(),
        settings.slug_collisions,
    ));

    // Populate eagerly; queries retry through the gate if this fails.
    match gate.ensure_populated(&settings.data_dir).await {
        Ok(report) if report.written > 0 => info!(
            "Loaded {} airports from {} ({} slug collisions)",
            report.written,
            report.source.unwrap_or("unknown source"),
            report.collisions
        ),
        Ok(report) => info!("Store already holds {} airports", report.total),
        Err(e) => warn!(
            "Dataset not loaded from {}: {}",
            settings.data_dir.display(),
            e
        ),
    }

    let executor = Arc::new(QueryExecutor::new(
        repository,
        gate,
        settings.executor_config(),
    ));
    let app = create_router(AppState::from_settings(executor, &settings));

    let addr: SocketAddr = settings.bind_address().parse()?;
    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
