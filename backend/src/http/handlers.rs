//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! [`QueryExecutor`](crate::query::QueryExecutor).

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    Json,
};

use super::dto::{AirportListQuery, HealthResponse};
use super::error::AppError;
use super::state::AppState;
use crate::models::AirportRecord;
use crate::query::PageInfo;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

pub const X_TOTAL_COUNT: &str = "x-total-count";
pub const X_PAGE: &str = "x-page";
pub const X_PAGE_SIZE: &str = "x-page-size";
pub const X_TOTAL_PAGES: &str = "x-total-pages";

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Reports whether the store is reachable and how many records it holds.
/// Never triggers ingestion.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repo = state.executor.repository();
    let (database, records) = match repo.health_check().await {
        Ok(true) => ("connected".to_string(), repo.count_all().await.ok()),
        Ok(false) => ("disconnected".to_string(), None),
        Err(e) => (format!("error: {}", e), None),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        records,
    }))
}

// =============================================================================
// Airports
// =============================================================================

/// GET /api/airports
///
/// Filtered, ordered list of airports. With `size` the response is a page
/// and carries `X-Total-Count`, `X-Page`, `X-Page-Size` and `X-Total-Pages`.
pub async fn list_airports(
    State(state): State<AppState>,
    Query(params): Query<AirportListQuery>,
) -> Result<(HeaderMap, Json<Vec<AirportRecord>>), AppError> {
    let pagination = params.pagination()?;
    let filters = params.filters();

    let result = state.executor.query(&filters, pagination).await?;

    let headers = match result.page {
        Some(info) => pagination_headers(&info),
        None => HeaderMap::new(),
    };
    Ok((headers, Json(result.records)))
}

/// GET /api/airports/{slug}
pub async fn get_airport(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> HandlerResult<AirportRecord> {
    state
        .executor
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Airport not found".to_string()))
}

fn pagination_headers(info: &PageInfo) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let values = [
        (X_TOTAL_COUNT, info.total_count.to_string()),
        (X_PAGE, info.page.to_string()),
        (X_PAGE_SIZE, info.size.to_string()),
        (X_TOTAL_PAGES, info.total_pages.to_string()),
    ];
    for (name, value) in values {
        // Decimal digits are always valid header values.
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
    headers
}
