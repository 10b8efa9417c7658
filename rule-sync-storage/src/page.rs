//! Paged reads

use serde::{Deserialize, Serialize};

/// A request for one page of results. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn first(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page: per_page.max(1),
        }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            per_page: self.per_page,
        }
    }

    /// Number of items preceding this page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.per_page as usize
    }
}

/// One page of results plus the total number of matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Page<T> {
    /// Slice an already-filtered result set into the requested page
    pub fn from_matches(matches: Vec<T>, request: PageRequest) -> Self {
        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(request.offset())
            .take(request.per_page as usize)
            .collect();
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
        }
    }

    /// True when pages after this one still hold results
    pub fn has_more(&self) -> bool {
        let seen = PageRequest {
            page: self.page,
            per_page: self.per_page,
        }
        .offset() as u64
            + self.items.len() as u64;
        !self.items.is_empty() && seen < self.total
    }
}
