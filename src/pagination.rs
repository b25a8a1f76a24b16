//! Pagination types for list endpoints.
//!
//! List endpoints take `page`/`per_page` query parameters and respond with
//! the page of rows plus the total and page count, so table UIs can render
//! pagers without a second count request.

use serde::{Deserialize, Serialize};

/// Query parameters for paginated list endpoints.
#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    /// 1-based page number (default: 1)
    #[serde(default)]
    pub page: Option<i64>,
    /// Items per page (default: 10, max: 100)
    #[serde(default)]
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(10).clamp(1, 100)
    }

    /// Rows to skip for the requested page.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }
}

/// Paginated response wrapper for list endpoints.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    /// Total rows across all pages
    pub total: i64,
    /// Number of pages at the requested page size
    pub page_count: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, per_page: i64) -> Self {
        let page_count = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            data,
            total,
            page_count,
        }
    }
}
