//! Engine types
//!
//! Configuration and statistics for the sync engine.

use crate::config::{TapConfig, DEFAULT_PAGE_SIZE, DEFAULT_WINDOW_DAYS};
use crate::error::Result;
use crate::streams::MAX_STREAM_DEPTH;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Source of the current time
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Clock reading the system time
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Configuration for sync operation
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// API base URL, no trailing slash
    pub base_url: String,
    /// Initial watermark of datetime streams without a bookmark
    pub start_date: DateTime<Utc>,
    /// Default width of a date window
    pub window_days: u32,
    /// Records per page (progress logging only)
    pub page_size: u32,
    /// Maximum nesting depth of child streams
    pub max_depth: usize,
}

impl SyncConfig {
    /// Create a sync config with default window, page size and depth
    pub fn new(base_url: impl Into<String>, start_date: DateTime<Utc>) -> Self {
        Self {
            base_url: base_url.into(),
            start_date,
            window_days: DEFAULT_WINDOW_DAYS,
            page_size: DEFAULT_PAGE_SIZE,
            max_depth: MAX_STREAM_DEPTH,
        }
    }

    /// Sync config for a tap config
    pub fn from_tap_config(config: &TapConfig) -> Result<Self> {
        Ok(Self::new(config.base_url()?, config.start_date()?)
            .with_window_days(config.window_days)
            .with_page_size(config.page_size))
    }

    /// Set the window width
    #[must_use]
    pub fn with_window_days(mut self, days: u32) -> Self {
        self.window_days = days;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Set the maximum depth
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Records written to the sink
    pub records_emitted: u64,
    /// Records dropped by the incremental filter
    pub records_filtered: u64,
    /// Pages fetched
    pub pages_fetched: u64,
    /// Stream invocations completed (children count once per parent record)
    pub endpoints_synced: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an emitted record
    pub fn add_emitted(&mut self) {
        self.records_emitted += 1;
    }

    /// Add a filtered record
    pub fn add_filtered(&mut self) {
        self.records_filtered += 1;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a completed stream invocation
    pub fn add_endpoint(&mut self) {
        self.endpoints_synced += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
