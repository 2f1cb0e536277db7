//! HTTP boundary for the airport query engine.
//!
//! Thin axum layer over [`QueryExecutor`](crate::query::QueryExecutor):
//! request parsing and validation, pagination headers, and mapping of
//! domain errors onto status codes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Query string parsing and validation                    │
//! │  - Pagination headers                                     │
//! │  - CORS, compression, tracing                             │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  QueryExecutor (query/)                                   │
//! │  - Lazy population through the IngestionGate              │
//! │  - Filter compilation, ordering, pagination               │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Repository Layer (db/)                                   │
//! │  - SqliteRepository / LocalRepository                     │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{ApiError, AppError};
pub use router::create_router;
pub use state::AppState;
