//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs. The shape
//! matches the Singer state document:
//!
//! ```json
//! {"bookmarks": {"accounts": "2023-01-31T00:00:00.000000Z", "revenue_entries": 55},
//!  "currently_syncing": "contracts"}
//! ```

use crate::error::{Error, Result};
use crate::types::{format_datetime, parse_datetime, BookmarkType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Watermark of a stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Bookmark {
    /// Integer cursor (e.g. an auto-increment id)
    Integer(i64),
    /// Timestamp watermark
    Datetime(DateTime<Utc>),
}

impl Bookmark {
    /// Domain of this bookmark
    pub fn kind(&self) -> BookmarkType {
        match self {
            Bookmark::Integer(_) => BookmarkType::Integer,
            Bookmark::Datetime(_) => BookmarkType::Datetime,
        }
    }

    /// Value to send as a query parameter
    pub fn to_query_value(&self) -> String {
        self.to_string()
    }
}

impl PartialOrd for Bookmark {
    /// Bookmarks of different domains are not comparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Bookmark::Integer(a), Bookmark::Integer(b)) => Some(a.cmp(b)),
            (Bookmark::Datetime(a), Bookmark::Datetime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Bookmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bookmark::Integer(n) => write!(f, "{n}"),
            Bookmark::Datetime(dt) => write!(f, "{}", format_datetime(dt)),
        }
    }
}

impl From<Bookmark> for Value {
    fn from(bookmark: Bookmark) -> Self {
        match bookmark {
            Bookmark::Integer(n) => Value::from(n),
            Bookmark::Datetime(dt) => Value::String(format_datetime(&dt)),
        }
    }
}

impl TryFrom<Value> for Bookmark {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match &value {
            Value::Number(n) => n
                .as_i64()
                .map(Bookmark::Integer)
                .ok_or_else(|| Error::state(format!("Bookmark is not an integer: {n}"))),
            Value::String(s) => {
                if let Ok(dt) = parse_datetime(s) {
                    return Ok(Bookmark::Datetime(dt));
                }
                s.trim()
                    .parse::<i64>()
                    .map(Bookmark::Integer)
                    .map_err(|_| Error::state(format!("Unrecognized bookmark value: {s}")))
            }
            other => Err(Error::state(format!("Unrecognized bookmark value: {other}"))),
        }
    }
}

/// Complete persisted state of the tap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream watermarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, Bookmark>,

    /// Stream that was in progress when the last run stopped
    #[serde(
        default,
        alias = "currentlySyncing",
        skip_serializing_if = "Option::is_none"
    )]
    pub currently_syncing: Option<String>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bookmark for a stream
    pub fn bookmark(&self, stream: &str) -> Option<&Bookmark> {
        self.bookmarks.get(stream)
    }

    /// Get the bookmark for a stream, or the supplied default
    pub fn bookmark_or(&self, stream: &str, default: Bookmark) -> Bookmark {
        self.bookmarks.get(stream).cloned().unwrap_or(default)
    }

    /// Advance the bookmark of a stream
    ///
    /// Returns whether the stored value changed. A lower value leaves the
    /// bookmark untouched; a value of another domain is rejected.
    pub fn advance_bookmark(&mut self, stream: &str, value: Bookmark) -> Result<bool> {
        match self.bookmarks.get(stream) {
            Some(current) => match value.partial_cmp(current) {
                Some(Ordering::Greater) => {
                    self.bookmarks.insert(stream.to_string(), value);
                    Ok(true)
                }
                Some(_) => Ok(false),
                None => Err(Error::state(format!(
                    "Bookmark for '{stream}' is a {} but got a {} value",
                    current.kind(),
                    value.kind()
                ))),
            },
            None => {
                self.bookmarks.insert(stream.to_string(), value);
                Ok(true)
            }
        }
    }
}
