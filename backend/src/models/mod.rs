//! Domain models shared by the store, the query engine and the HTTP layer.

pub mod airport;
pub mod slug;

pub use airport::{
    AirportComment, AirportRecord, Place, CANONICAL_TYPES, LARGE_AIRPORT, MEDIUM_AIRPORT,
    SMALL_AIRPORT,
};
pub use slug::{airport_slug, assign_slugs, ensure_slug, slugify, SlugCollisionPolicy};
