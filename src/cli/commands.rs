//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Incremental SaaSOptics extractor emitting Singer messages
#[derive(Parser, Debug)]
#[command(name = "saasoptics-tap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// State file (JSON), read at start and written through during sync
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON (not written back)
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Catalog file (JSON) with stream selection and schemas
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Stream definitions file (YAML) replacing the built-in definitions
    #[arg(long, global = true)]
    pub streams_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync the selected streams
    Sync {
        /// Inline config JSON
        #[arg(long)]
        config_json: Option<String>,
    },

    /// Print a catalog skeleton for the stream definitions
    Catalog,

    /// List the stream definitions
    Streams,

    /// Validate the config, stream definitions and catalog
    Validate {
        /// Inline config JSON
        #[arg(long)]
        config_json: Option<String>,
    },
}
