// SPDX-License-Identifier: MIT

//! Shared pagination arithmetic for list endpoints.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Raw pagination query parameters as received on list endpoints.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// Validated pagination state.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
}

impl Pagination {
    /// Validate query parameters, applying defaults (page 1, size 10).
    ///
    /// Zero page or size would make the skip/page-count arithmetic
    /// meaningless, so both are rejected with a 400.
    pub fn from_query(query: &PageQuery) -> Result<Self> {
        let page = query.page.unwrap_or(1);
        let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page < 1 {
            return Err(AppError::BadRequest(
                "Page must be greater than 0".to_string(),
            ));
        }
        if size < 1 {
            return Err(AppError::BadRequest(
                "Size must be greater than 0".to_string(),
            ));
        }

        Ok(Self { page, size })
    }

    /// Number of documents to skip.
    pub fn skip(&self) -> u64 {
        (self.page as u64 - 1) * self.size as u64
    }

    /// Maximum number of documents to return.
    pub fn limit(&self) -> i64 {
        self.size as i64
    }

    /// Total page count for a known total item count.
    pub fn pages_count(&self, total_items: u64) -> u64 {
        total_items.div_ceil(self.size as u64)
    }
}

/// Envelope returned by every list endpoint.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub page: u32,
    pub size: u32,
    pub pages_count: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(pagination: Pagination, total_items: u64, items: Vec<T>) -> Self {
        Self {
            page: pagination.page,
            size: pagination.size,
            pages_count: pagination.pages_count(total_items),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Pagination::from_query(&PageQuery::default()).unwrap();
        assert_eq!(p.page, 1);
        assert_eq!(p.size, DEFAULT_PAGE_SIZE);
        assert_eq!(p.skip(), 0);
        assert_eq!(p.limit(), 10);
    }

    #[test]
    fn test_pages_count_rounds_up() {
        let p = Pagination { page: 1, size: 10 };
        assert_eq!(p.pages_count(57), 6);
        assert_eq!(p.pages_count(60), 6);
        assert_eq!(p.pages_count(61), 7);
        assert_eq!(p.pages_count(0), 0);
    }

    #[test]
    fn test_last_page_skip() {
        // For total=57, size=10, page=6 the store returns at most 7 items.
        let p = Pagination { page: 6, size: 10 };
        assert_eq!(p.skip(), 50);
        assert_eq!(p.limit(), 10);
    }

    #[test]
    fn test_rejects_zero_page_and_size() {
        let err = Pagination::from_query(&PageQuery {
            page: Some(0),
            size: None,
        })
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = Pagination::from_query(&PageQuery {
            page: None,
            size: Some(0),
        })
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
