//! Incremental filter and bookmark tracking

use super::record::Record;
use crate::error::{Error, Result};
use crate::state::Bookmark;
use crate::types::parse_datetime;
use serde_json::Value;

/// Decides which records of an incremental stream are emitted
///
/// A record is emitted when its replication value is at or after the last
/// bookmark. Records without the field are emitted as well.
#[derive(Debug, Clone)]
pub struct IncrementalFilter {
    stream: String,
    field: Option<String>,
    last: Option<Bookmark>,
}

impl IncrementalFilter {
    /// Filter on `field` against the last bookmark
    pub fn new(stream: impl Into<String>, field: Option<&str>, last: Option<&Bookmark>) -> Self {
        Self {
            stream: stream.into(),
            field: field.map(ToString::to_string),
            last: last.cloned(),
        }
    }

    /// Filter that emits everything
    pub fn passthrough(stream: impl Into<String>) -> Self {
        Self::new(stream, None, None)
    }

    /// Replication field, if the stream has one
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Replication value of a record, in the bookmark's domain
    ///
    /// `None` when the stream has no replication key or the record lacks the
    /// field. A value that cannot be read in the bookmark's domain is an
    /// error.
    pub fn replication_value(&self, record: &Record) -> Result<Option<Bookmark>> {
        let (Some(field), Some(last)) = (&self.field, &self.last) else {
            return Ok(None);
        };
        let raw = match record.get(field) {
            None | Some(Value::Null) => return Ok(None),
            Some(raw) => raw,
        };

        let parsed = match last {
            Bookmark::Integer(_) => parse_integer(raw).map(Bookmark::Integer),
            Bookmark::Datetime(_) => match raw {
                Value::String(s) => parse_datetime(s).ok().map(Bookmark::Datetime),
                _ => None,
            },
        };

        parsed.map(Some).ok_or_else(|| {
            Error::transform(
                &self.stream,
                format!(
                    "Replication key '{field}' is not a valid {}: {raw}",
                    last.kind()
                ),
            )
        })
    }

    /// Whether a record with this replication value is emitted
    pub fn admits(&self, value: Option<&Bookmark>) -> bool {
        match (&self.last, value) {
            (Some(last), Some(value)) => value >= last,
            _ => true,
        }
    }
}

fn parse_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Running maximum of replication values
///
/// Starts at the last bookmark, so the candidate never falls below it.
#[derive(Debug, Clone, Default)]
pub struct BookmarkTracker {
    max: Option<Bookmark>,
}

impl BookmarkTracker {
    /// Start tracking from an initial watermark
    pub fn new(initial: Option<Bookmark>) -> Self {
        Self { max: initial }
    }

    /// Fold a replication value into the maximum
    pub fn observe(&mut self, value: &Bookmark) {
        let higher = match &self.max {
            Some(max) => value > max,
            None => true,
        };
        if higher {
            self.max = Some(value.clone());
        }
    }

    /// Current candidate watermark
    pub fn max(&self) -> Option<&Bookmark> {
        self.max.as_ref()
    }
}
