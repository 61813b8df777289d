//! Singer message types
//!
//! One JSON object per line:
//!
//! ```json
//! {"type":"SCHEMA","stream":"accounts","schema":{...},"key_properties":["id"]}
//! {"type":"RECORD","stream":"accounts","record":{...},"time_extracted":"2023-02-15T00:00:00.000000Z"}
//! {"type":"STATE","value":{"bookmarks":{...}}}
//! ```

use crate::state::State;
use crate::types::format_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message written to the sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Stream schema announcement
    Schema {
        /// Stream name
        stream: String,
        /// JSON schema of the records
        schema: Value,
        /// Fields identifying a record
        key_properties: Vec<String>,
    },
    /// One record
    Record {
        /// Stream name
        stream: String,
        /// Record body
        record: Value,
        /// Extraction timestamp
        time_extracted: String,
    },
    /// Snapshot of the persisted state
    State {
        /// The whole state document
        value: State,
    },
}

impl Message {
    /// Create a schema message
    pub fn schema(stream: impl Into<String>, schema: Value, key_properties: &[String]) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties: key_properties.to_vec(),
        }
    }

    /// Create a record message
    pub fn record(stream: impl Into<String>, record: Value, time_extracted: DateTime<Utc>) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: format_datetime(&time_extracted),
        }
    }

    /// Create a state message
    pub fn state(state: &State) -> Self {
        Self::State {
            value: state.clone(),
        }
    }

    /// Stream the message belongs to (state messages have none)
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }
}
