//! # AriConnect
//!
//! Read-only airport data service: a normalized OurAirports dataset behind a
//! filter, search and pagination engine.
//!
//! ## Architecture
//!
//! - [`models`]: airport records and slug derivation
//! - [`query`]: filter compiler, canonical ordering, pagination and the
//!   [`QueryExecutor`](query::QueryExecutor)
//! - [`db`]: repository traits with SQLite (Diesel) and in-memory backends
//! - [`ingest`]: the ingestion gate that populates an empty store from the
//!   source directory
//! - [`config`]: application settings
//! - [`http`]: axum REST API (feature `http-server`)
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ariconnect::db::RepositoryFactory;
//! use ariconnect::ingest::IngestionGate;
//! use ariconnect::query::{AirportFilters, ExecutorConfig, Pagination, QueryExecutor};
//!
//! let repo = RepositoryFactory::create_local();
//! let gate = Arc::new(IngestionGate::new(repo.clone(), Default::default()));
//! let executor = QueryExecutor::new(repo, gate, ExecutorConfig::default());
//!
//! let filters = AirportFilters { iata: Some("JFK".into()), ..Default::default() };
//! let page = executor.query(&filters, Pagination::paged(None, 10)).await?;
//! ```

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod ingest;
pub mod models;
pub mod query;

#[cfg(feature = "http-server")]
pub mod http;
