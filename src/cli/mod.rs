//! CLI module
//!
//! Command-line interface for the tap.
//!
//! # Commands
//!
//! - `sync` - Sync the selected streams, writing Singer messages to stdout
//! - `catalog` - Print a catalog skeleton for the stream definitions
//! - `streams` - List the stream definitions
//! - `validate` - Check config, definitions, catalog and state

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
