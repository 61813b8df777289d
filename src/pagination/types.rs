//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by the pager.

use serde_json::Value;

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available at this URL
    Continue {
        /// URL of the next page, query string included
        url: String,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation with a new URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::Continue { url: url.into() }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// Tracks pagination state during one window traversal
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Pages fetched so far
    pub page: u32,
    /// Position of the first record of the next page
    pub offset: u64,
    /// Records per page, used for progress logging
    pub limit: u32,
    /// Total count reported by the last page
    pub total_count: u64,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// URL of the next page
    pub next_url: Option<String>,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
        self.next_url = None;
    }

    /// Increment page number
    pub fn next_page(&mut self) {
        self.page += 1;
    }

    /// Add offset
    pub fn add_offset(&mut self, amount: u64) {
        self.offset += amount;
    }

    /// Add to total fetched
    pub fn add_fetched(&mut self, count: u64) {
        self.total_fetched += count;
    }
}

/// One fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based page number within the window
    pub number: u32,
    /// Raw records
    pub records: Vec<Value>,
    /// Total count hint reported by the API
    pub total_count: u64,
    /// Position of the first record (0-based)
    pub offset: u64,
}

impl Page {
    /// Position after the last record of the page, capped at the total
    pub fn to_record(&self, limit: u32) -> u64 {
        let end = self.offset + u64::from(limit);
        if self.total_count > 0 {
            end.min(self.total_count)
        } else {
            end
        }
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Process a response and determine if there's a next page
    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage;
}

/// Extract a value by dotted path (`"meta.next"`); `""` is the value itself
pub fn extract_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim().trim_start_matches("$.").trim_start_matches('$');
    if path.is_empty() {
        return Some(value);
    }
    path.split('.')
        .try_fold(value, |current, key| current.get(key))
}
