use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 500;

/// Which page of a listing to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationRequest {
    /// 1-based page number.
    page_num: u32,
    page_size: u32,
}

impl PaginationRequest {
    /// Out-of-range values are clamped rather than rejected.
    pub fn new(page_num: u32, page_size: u32) -> Self {
        Self {
            page_num: page_num.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Build from optional query parameters, defaulting to the first page.
    pub fn from_query(page_num: Option<u32>, page_size: Option<u32>) -> Self {
        Self::new(page_num.unwrap_or(1), page_size.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// How many items precede this page.
    pub fn skip(&self) -> u64 {
        u64::from(self.page_num - 1) * u64::from(self.page_size)
    }

    /// Wrap one page of items with its position in the whole listing.
    pub fn to_paginated<T>(self, total: u64, items: Vec<T>) -> Paginated<T> {
        Paginated {
            items,
            pagination: PaginationResult {
                page_num: self.page_num,
                page_size: self.page_size,
                total,
            },
        }
    }
}

impl Default for PaginationRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Position of a page within a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationResult {
    pub page_num: u32,
    pub page_size: u32,
    pub total: u64,
}

/// One page of a listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PaginationResult,
}
