use serde::{Deserialize, Serialize};

use super::common::EntityState;

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Paging and filtering for local vehicle/driver listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    pub state: Option<EntityState>,
    /// Case-insensitive substring match on the entity's text fields.
    pub search: Option<String>,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            state: None,
            search: None,
        }
    }
}

impl ListFilter {
    /// Clamp page and limit into their valid ranges and drop blank searches.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_PAGE_LIMIT);
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of a listing, as returned by the console API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, filter: &ListFilter) -> Self {
        let limit = i64::from(filter.limit.max(1));
        Self {
            items,
            total,
            page: filter.page,
            total_pages: (total + limit - 1) / limit,
        }
    }
}
