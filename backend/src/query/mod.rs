//! Query engine: filter compilation, canonical ordering, pagination and the
//! executor that ties them to a store.

pub mod executor;
pub mod filter;
pub mod ordering;
pub mod pagination;

pub use executor::{ExecutorConfig, QueryError, QueryExecutor, QueryPage, DEFAULT_LIMIT};
pub use filter::{compile, AirportFilters, CompiledFilter, Condition, FilterColumn, SEARCH_COLUMNS};
pub use ordering::{ordering_key, sort_records, type_rank, ORDER_BY_SQL};
pub use pagination::{total_pages, PageInfo, Pagination, Window};
