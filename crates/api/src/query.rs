//! Shared query parameter types for API handlers.

use hookroom_core::capture::SortOrder;
use serde::Deserialize;

/// Generic pagination parameters (`?page=&limit=`).
///
/// Pages are 1-indexed. Values are clamped in the core via `clamp_page` /
/// `clamp_limit`.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Ordering parameter for capture listings (`?sort=newest|oldest`).
#[derive(Debug, Default, Deserialize)]
pub struct SortParams {
    #[serde(default)]
    pub sort: SortOrder,
}

/// Query parameters of the paginated capture listing.
#[derive(Debug, Default, Deserialize)]
pub struct CaptureListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub sort: SortOrder,
}
