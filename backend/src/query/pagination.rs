//! Pagination modes.

use serde::{Deserialize, Serialize};

/// How a query is windowed. The caller selects the mode: an explicit page
/// size means [`Pagination::Paged`], nothing else does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Optional result cap, no total count. `None` falls back to the
    /// executor's configured default cap.
    Simple { limit: Option<u32> },
    /// 1-indexed page of fixed size, always with a total count.
    Paged { page: u32, size: u32 },
}

impl Pagination {
    pub fn simple(limit: Option<u32>) -> Self {
        Pagination::Simple { limit }
    }

    /// Paginated mode; a missing page number means the first page.
    pub fn paged(page: Option<u32>, size: u32) -> Self {
        Pagination::Paged {
            page: page.unwrap_or(1),
            size,
        }
    }

    pub fn is_paged(&self) -> bool {
        matches!(self, Pagination::Paged { .. })
    }

    /// Resolve to the row window a store should return.
    pub fn window(&self, default_limit: u32) -> Window {
        match *self {
            Pagination::Simple { limit } => Window {
                limit: Some(u64::from(limit.unwrap_or(default_limit))),
                offset: 0,
            },
            Pagination::Paged { page, size } => Window {
                limit: Some(u64::from(size)),
                offset: u64::from(page.saturating_sub(1)) * u64::from(size),
            },
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::Simple { limit: None }
    }
}

/// Row window applied after ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    /// Maximum rows; `None` means unbounded.
    pub limit: Option<u64>,
    pub offset: u64,
}

impl Window {
    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// Page metadata returned in paginated mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub size: u32,
    pub total_count: u64,
    pub total_pages: u64,
}

impl PageInfo {
    pub fn new(page: u32, size: u32, total_count: u64) -> Self {
        Self {
            page,
            size,
            total_count,
            total_pages: total_pages(total_count, size),
        }
    }
}

/// `ceil(total / size)`, or 0 for a zero page size.
pub fn total_pages(total: u64, size: u32) -> u64 {
    if size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(size))
}
