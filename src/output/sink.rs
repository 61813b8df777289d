//! Sinks receiving schema, record and state messages

use super::messages::Message;
use crate::error::{Error, Result};
use crate::state::State;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::io::{self, Stdout, Write};

/// Destination of the extracted data
pub trait Sink: Send {
    /// Announce the schema of a stream
    fn write_schema(&mut self, stream: &str, schema: &Value, key_properties: &[String]) -> Result<()>;

    /// Emit one record
    fn write_record(&mut self, stream: &str, record: &Value, time_extracted: DateTime<Utc>) -> Result<()>;

    /// Emit a snapshot of the state
    fn write_state(&mut self, state: &State) -> Result<()>;
}

/// Writes one JSON message per line, flushing after each
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    written: u64,
}

impl JsonLinesSink<Stdout> {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Messages written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Unwrap the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_message(&mut self, message: &Message) -> Result<()> {
        let line = serde_json::to_string(message)?;
        writeln!(self.writer, "{line}")
            .and_then(|()| self.writer.flush())
            .map_err(|e| Error::sink(format!("Failed to write message: {e}")))?;
        self.written += 1;
        Ok(())
    }
}

impl<W: Write + Send> Sink for JsonLinesSink<W> {
    fn write_schema(&mut self, stream: &str, schema: &Value, key_properties: &[String]) -> Result<()> {
        self.write_message(&Message::schema(stream, schema.clone(), key_properties))
    }

    fn write_record(&mut self, stream: &str, record: &Value, time_extracted: DateTime<Utc>) -> Result<()> {
        self.write_message(&Message::record(stream, record.clone(), time_extracted))
    }

    fn write_state(&mut self, state: &State) -> Result<()> {
        self.write_message(&Message::state(state))
    }
}

/// Collects messages in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Messages in emission order
    pub messages: Vec<Message>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Record bodies emitted for a stream
    pub fn records(&self, stream: &str) -> Vec<&Value> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Record { stream: s, record, .. } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Number of schema messages for a stream
    pub fn schema_count(&self, stream: &str) -> usize {
        self.messages
            .iter()
            .filter(|m| m.is_schema() && m.stream() == Some(stream))
            .count()
    }

    /// State snapshots in emission order
    pub fn states(&self) -> Vec<&State> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::State { value } => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Last state snapshot
    pub fn last_state(&self) -> Option<&State> {
        self.states().pop()
    }
}

impl Sink for MemorySink {
    fn write_schema(&mut self, stream: &str, schema: &Value, key_properties: &[String]) -> Result<()> {
        self.messages
            .push(Message::schema(stream, schema.clone(), key_properties));
        Ok(())
    }

    fn write_record(&mut self, stream: &str, record: &Value, time_extracted: DateTime<Utc>) -> Result<()> {
        self.messages
            .push(Message::record(stream, record.clone(), time_extracted));
        Ok(())
    }

    fn write_state(&mut self, state: &State) -> Result<()> {
        self.messages.push(Message::state(state));
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn write_schema(&mut self, stream: &str, schema: &Value, key_properties: &[String]) -> Result<()> {
        (**self).write_schema(stream, schema, key_properties)
    }

    fn write_record(&mut self, stream: &str, record: &Value, time_extracted: DateTime<Utc>) -> Result<()> {
        (**self).write_record(stream, record, time_extracted)
    }

    fn write_state(&mut self, state: &State) -> Result<()> {
        (**self).write_state(state)
    }
}
