//! Page-number pagination
//!
//! Out-of-range page numbers never fail: anything below 1 lands on the
//! first page and anything past the end lands on the last. An empty
//! collection still has one (empty) page.

use serde::Serialize;

use crate::error::{BlogError, Result};

/// Page size used by the index, category and profile listings
pub const PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total_items: u64,
    page_size: u32,
}

impl Paginator {
    pub fn new(total_items: u64, page_size: u32) -> Result<Self> {
        if page_size == 0 {
            return Err(BlogError::InvalidInput(
                "Page size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            total_items,
            page_size,
        })
    }

    pub fn total_pages(&self) -> u32 {
        let pages = self.total_items.div_ceil(u64::from(self.page_size));
        u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
    }

    /// Clamp a requested page number into `1..=total_pages`
    pub fn clamp(&self, requested: i64) -> u32 {
        if requested < 1 {
            return 1;
        }
        let last = self.total_pages();
        u32::try_from(requested).map_or(last, |n| n.min(last))
    }

    /// Row offset of the first item on `page`
    pub fn offset(&self, page: u32) -> u64 {
        u64::from(page.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Wrap already-fetched items as page `number`
    pub fn page<T>(&self, number: u32, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number,
            total_pages: self.total_pages(),
            total_items: self.total_items,
            page_size: self.page_size,
        }
    }
}

/// One page of a listing with its position metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<u32> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u32> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parse a raw `page` parameter
///
/// Missing or non-numeric input means the first page. Numeric input is
/// returned as-is and clamped later by the [`Paginator`].
pub fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1)
}
