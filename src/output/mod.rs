//! Output module
//!
//! Sinks for the Singer message stream.
//!
//! # Overview
//!
//! This module provides:
//! - `Sink` - the trait the sync engine emits through
//! - `JsonLinesSink` - newline-delimited JSON messages (stdout by default)
//! - `MemorySink` - collects messages, used by tests and embedding callers

mod messages;
mod sink;

pub use messages::Message;
pub use sink::{JsonLinesSink, MemorySink, Sink};
