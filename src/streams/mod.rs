//! Stream definitions module
//!
//! Parse stream definitions from YAML files.
//!
//! # Overview
//!
//! The streams module provides:
//! - `StreamTree` - Ordered forest of stream definitions
//! - `StreamDefinition` - One endpoint with its replication settings and children
//! - YAML parsing with validation

mod builtin;
mod parser;
mod types;

pub use builtin::SAASOPTICS_STREAMS;
pub use parser::{load_builtin_streams, load_streams, load_streams_from_str, validate_tree};
pub use types::{StreamDefinition, StreamTree, MAX_STREAM_DEPTH};
