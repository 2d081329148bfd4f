//! 1-indexed page arithmetic shared by room and capture listings.

use serde::Serialize;

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: i64 = 500;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided 1-indexed page number.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// Row offset of the first item on `page`.
pub fn page_offset(page: i64, limit: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(limit)
}

/// One page of a listing plus the total number of matching items.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Slice an already-ordered, fully materialized list into a page.
pub fn paginate<T: Serialize>(items: Vec<T>, page: i64, limit: i64) -> Page<T> {
    let total = items.len() as i64;
    let offset = usize::try_from(page_offset(page, limit)).unwrap_or(usize::MAX);
    let take = usize::try_from(limit).unwrap_or(0);
    let items = items.into_iter().skip(offset).take(take).collect();
    Page {
        items,
        total,
        page,
        limit,
    }
}
