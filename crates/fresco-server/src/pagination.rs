//! Query-string pagination parameters and the paginated response shape.

use serde::{Deserialize, Serialize};

/// Hard cap on `per_page`, whatever the endpoint default.
const MAX_PER_PAGE: u32 = 100;

/// `?page=&per_page=` as sent by clients.  Both are optional; each endpoint
/// supplies its own `per_page` default.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageParams {
    /// Resolve to a 1-based page and a clamped page size.
    pub fn resolve(&self, default_per_page: u32) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(default_per_page)
            .clamp(1, MAX_PER_PAGE);
        (page, per_page)
    }

    /// Row offset for the resolved page.
    pub fn offset(page: u32, per_page: u32) -> u32 {
        (page - 1) * per_page
    }
}

/// One page of results plus the totals needed for client-side paging.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        Self {
            items,
            page,
            per_page,
            total,
            total_pages: total.div_ceil(u64::from(per_page)),
        }
    }
}
