//! Page counter behind the previous/next controls.
//!
//! `prev` and `next` move the page by exactly one and never clamp: asking
//! for a page past the end is left to the server, which answers with an
//! empty page. Only the rendered buttons look at the server's page count.

use crate::types::{PageQuery, PaginationMeta, SortDirection};

pub const PAGE_SIZES: [u32; 3] = [10, 50, 100];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Paginator {
    query: PageQuery,
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> PageQuery {
        self.query
    }

    pub fn page(&self) -> i64 {
        self.query.page
    }

    pub fn prev(&mut self) {
        self.query.page -= 1;
    }

    pub fn next(&mut self) {
        self.query.page += 1;
    }

    /// Jump straight to `page`, unclamped like `prev`/`next`.
    pub fn go_to(&mut self, page: i64) {
        self.query.page = page;
    }

    /// Leaves the page number untouched.
    pub fn set_page_size(&mut self, page_size: u32) {
        self.query.page_size = page_size;
    }

    /// Leaves the page number untouched.
    pub fn set_sort(&mut self, sort: SortDirection) {
        self.query.sort = sort;
    }
}

/// Render model for the pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginatorView {
    pub page: i64,
    pub page_count: u32,
    pub total: u64,
    pub is_loading: bool,
    pub prev_disabled: bool,
    pub next_disabled: bool,
}

impl PaginatorView {
    pub fn new(page: i64, meta: &PaginationMeta, is_loading: bool) -> Self {
        Self {
            page,
            page_count: meta.page_count,
            total: meta.total,
            is_loading,
            prev_disabled: is_loading || page <= 1,
            next_disabled: is_loading || page >= i64::from(meta.page_count),
        }
    }
}
