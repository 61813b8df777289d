//! Window types

use crate::state::Bookmark;
use crate::streams::StreamDefinition;
use crate::types::format_datetime;
use chrono::{DateTime, Duration, Utc};

/// Half-open time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Exclusive end
    pub end: DateTime<Utc>,
}

impl Window {
    /// Create a window
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Width of the window
    pub fn width(&self) -> Duration {
        self.end - self.start
    }

    /// Whether a timestamp falls inside the window
    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        *dt >= self.start && *dt < self.end
    }
}

/// One traversal of a stream's pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pass {
    /// Datetime pass; `bounded` passes send the upper bound as well
    Datetime {
        /// Time range covered
        window: Window,
        /// Whether the API receives the window end
        bounded: bool,
    },
    /// Integer-cursor pass starting at the minimum
    Integer {
        /// Lowest cursor value requested
        min: i64,
    },
    /// Unfiltered pass
    Full,
}

impl Pass {
    /// Query parameters selecting this pass for a stream
    pub fn query_params(&self, stream: &StreamDefinition) -> Vec<(String, String)> {
        let mut params = Vec::new();
        match self {
            Pass::Datetime { window, bounded } => {
                if let Some(from) = &stream.bookmark_query_field_from {
                    params.push((from.clone(), format_datetime(&window.start)));
                }
                if *bounded {
                    if let Some(to) = &stream.bookmark_query_field_to {
                        params.push((to.clone(), format_datetime(&window.end)));
                    }
                }
            }
            Pass::Integer { min } => {
                if let Some(from) = &stream.bookmark_query_field_from {
                    params.push((from.clone(), Bookmark::Integer(*min).to_query_value()));
                }
            }
            Pass::Full => {}
        }
        params
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        match self {
            Pass::Datetime { window, .. } => format!(
                "{} to {}",
                format_datetime(&window.start),
                format_datetime(&window.end)
            ),
            Pass::Integer { min } => format!("from {min}"),
            Pass::Full => "full".to_string(),
        }
    }
}
