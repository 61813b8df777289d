//! Window scheduling
//!
//! Plans the passes a stream sync makes: bounded date windows for streams
//! whose API takes a date range, one span up to now for other datetime
//! streams, and a single pass for integer cursors and full-table streams.

use super::types::{Pass, Window};
use crate::config::DEFAULT_WINDOW_DAYS;
use crate::error::{Error, Result};
use crate::state::Bookmark;
use crate::streams::StreamDefinition;
use chrono::{DateTime, Duration, Utc};

/// Iterator over consecutive windows of `[start, end)`
///
/// Each window is `width` wide except the last, which is clipped to `end`.
#[derive(Debug, Clone)]
pub struct DateWindows {
    cursor: DateTime<Utc>,
    end: DateTime<Utc>,
    width: Duration,
}

impl DateWindows {
    /// Windows covering `[start, end)`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, width: Duration) -> Self {
        Self {
            cursor: start,
            end,
            width,
        }
    }
}

impl Iterator for DateWindows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.cursor >= self.end || self.width <= Duration::zero() {
            return None;
        }
        let window_end = match self.cursor.checked_add_signed(self.width) {
            Some(next) if next < self.end => next,
            _ => self.end,
        };
        let window = Window::new(self.cursor, window_end);
        self.cursor = window_end;
        Some(window)
    }
}

/// Plans the passes of a stream sync
#[derive(Debug, Clone, Copy)]
pub struct WindowScheduler {
    window_days: u32,
}

impl Default for WindowScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS)
    }
}

impl WindowScheduler {
    /// Scheduler with a default window width
    pub fn new(window_days: u32) -> Self {
        Self { window_days }
    }

    /// Window width for a stream
    pub fn width_for(&self, stream: &StreamDefinition) -> Duration {
        Duration::days(i64::from(stream.window_days.unwrap_or(self.window_days).max(1)))
    }

    /// Passes for a stream given its last bookmark
    ///
    /// A bookmark at or after `now` yields no passes.
    pub fn plan(
        &self,
        stream: &StreamDefinition,
        last: Option<&Bookmark>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Pass>> {
        if stream.bookmark_field().is_none() {
            return Ok(vec![Pass::Full]);
        }

        match last {
            Some(Bookmark::Integer(min)) => Ok(vec![Pass::Integer { min: *min }]),
            Some(Bookmark::Datetime(start)) => {
                if stream.supports_range_filter() {
                    Ok(DateWindows::new(*start, now, self.width_for(stream))
                        .map(|window| Pass::Datetime {
                            window,
                            bounded: true,
                        })
                        .collect())
                } else if *start < now {
                    Ok(vec![Pass::Datetime {
                        window: Window::new(*start, now),
                        bounded: false,
                    }])
                } else {
                    Ok(Vec::new())
                }
            }
            None => Err(Error::state(format!(
                "No starting bookmark for incremental stream '{}'",
                stream.name
            ))),
        }
    }
}
