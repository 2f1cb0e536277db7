//! Repository trait definitions for the airport store.
//!
//! Responsibilities are split across two focused traits so backends and test
//! doubles can be reasoned about separately:
//!
//! - [`AirportStore`]: lifecycle and bulk writes (schema, population, upsert)
//! - [`AirportQueries`]: filtered counting, windowed selection, slug lookup
//!
//! # Convenience Trait Bound
//!
//! Code that needs both halves takes a [`FullRepository`]:
//!
//! ```ignore
//! async fn warm<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<u64> {
//!     repo.ensure_schema().await?;
//!     repo.count_all().await
//! }
//! ```

pub mod airport;
pub mod error;

pub use airport::{AirportQueries, AirportStore};
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements both store traits.
pub trait FullRepository: AirportStore + AirportQueries {}

impl<T> FullRepository for T where T: AirportStore + AirportQueries {}
