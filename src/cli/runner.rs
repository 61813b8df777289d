//! CLI runner - executes commands

use crate::catalog::{skeleton, Catalog};
use crate::cli::commands::{Cli, Commands};
use crate::config::TapConfig;
use crate::engine::{SyncConfig, SyncEngine};
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClient;
use crate::orchestrator;
use crate::output::JsonLinesSink;
use crate::state::StateManager;
use crate::streams::{load_builtin_streams, load_streams, StreamTree};
use serde_json::{json, Value};
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Sync { config_json } => self.sync(config_json.as_deref()).await,
            Commands::Catalog => self.catalog(),
            Commands::Streams => self.streams(),
            Commands::Validate { config_json } => self.validate(config_json.as_deref()),
        }
    }

    /// Load the tap config
    fn load_config(&self, inline: Option<&str>) -> Result<TapConfig> {
        // Inline config takes precedence
        if let Some(json_str) = inline {
            return TapConfig::from_json(json_str);
        }
        match &self.cli.config {
            Some(path) => TapConfig::from_file(path),
            None => Err(Error::config(
                "Config not specified (use -C or --config-json)",
            )),
        }
    }

    /// Load stream definitions
    fn load_streams(&self) -> Result<StreamTree> {
        match &self.cli.streams_file {
            Some(path) => load_streams(path),
            None => load_builtin_streams(),
        }
    }

    /// Load the catalog
    fn load_catalog(&self) -> Result<Catalog> {
        let path = self
            .cli
            .catalog
            .as_ref()
            .ok_or_else(|| Error::config("Catalog file not specified (use --catalog)"))?;
        Catalog::from_file(path)
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Sync selected streams to stdout
    async fn sync(&self, config_json: Option<&str>) -> Result<()> {
        let config = self.load_config(config_json)?;
        let tree = self.load_streams()?;
        let catalog = self.load_catalog()?;
        warn_unknown_streams(&catalog, &tree);

        let state = self.load_state()?;
        let client = HttpClient::from_tap_config(&config).context("build HTTP client")?;
        let sync_config = SyncConfig::from_tap_config(&config)?;
        info!(base_url = %sync_config.base_url, "Starting sync");

        let mut engine = SyncEngine::new(client, JsonLinesSink::stdout(), state, catalog, sync_config);
        let summary = orchestrator::sync_all(&mut engine, &tree).await?;

        for stream in &summary.streams {
            info!(stream = %stream.stream, total_records = stream.total_records, "Stream summary");
        }
        Ok(())
    }

    /// Print a catalog skeleton
    fn catalog(&self) -> Result<()> {
        let tree = self.load_streams()?;
        let catalog = skeleton(&tree)
            .to_json_pretty()
            .context("render catalog skeleton")?;
        println!("{catalog}");
        Ok(())
    }

    /// List stream definitions
    fn streams(&self) -> Result<()> {
        let tree = self.load_streams()?;
        let streams: Vec<Value> = tree
            .walk()
            .into_iter()
            .map(|(stream, depth)| {
                json!({
                    "name": stream.name,
                    "depth": depth,
                    "path": stream.path(),
                    "replication_method": stream.replication_method,
                    "replication_key": stream.bookmark_field(),
                    "bookmark_type": stream.bookmark_type,
                    "children": stream.children.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "STREAMS",
            "streams": streams
        }));
        Ok(())
    }

    /// Validate inputs without syncing
    fn validate(&self, config_json: Option<&str>) -> Result<()> {
        let tree = self.load_streams()?;
        let mut checked = vec![format!("{} stream definitions", tree.walk().len())];

        if config_json.is_some() || self.cli.config.is_some() {
            let config = self.load_config(config_json)?;
            checked.push(format!("config for {}", config.base_url()?));
        }
        if self.cli.catalog.is_some() {
            let catalog = self.load_catalog()?;
            warn_unknown_streams(&catalog, &tree);
            checked.push(format!(
                "catalog with {} selected streams",
                catalog.selected_streams().len()
            ));
        }
        if self.cli.state.is_some() || self.cli.state_json.is_some() {
            let state = self.load_state()?;
            checked.push(format!("state with {} bookmarks", state.state().bookmarks.len()));
        }

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!("Valid: {}", checked.join(", "))
            }
        }));
        Ok(())
    }

    fn output_message(&self, msg: &Value) {
        println!("{msg}");
    }
}

/// Selected catalog streams absent from the definitions are never synced
fn warn_unknown_streams(catalog: &Catalog, tree: &StreamTree) {
    for name in catalog.selected_streams() {
        if !tree.walk().iter().any(|(stream, _)| stream.name == name) {
            warn!(stream = %name, "Selected stream has no definition, skipping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn runner(args: &[&str]) -> Runner {
        Runner::new(Cli::try_parse_from(args.iter().copied()).unwrap())
    }

    fn temp_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "saasoptics-tap",
            "sync",
            "-C",
            "config.json",
            "--catalog",
            "catalog.json",
            "-s",
            "state.json",
            "-v",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Sync { config_json: None }));
        assert_eq!(cli.config.unwrap().to_str(), Some("config.json"));
        assert_eq!(cli.catalog.unwrap().to_str(), Some("catalog.json"));
        assert_eq!(cli.state.unwrap().to_str(), Some("state.json"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_load_builtin_and_custom_streams() {
        let builtin = runner(&["saasoptics-tap", "streams"]).load_streams().unwrap();
        assert!(builtin.find("accounts").is_some());

        let file = temp_file("streams:\n  - name: widgets\n    key_properties: [id]\n");
        let path = file.path().to_str().unwrap();
        let custom = runner(&["saasoptics-tap", "--streams-file", path, "streams"])
            .load_streams()
            .unwrap();
        assert_eq!(custom.names(), vec!["widgets"]);
    }

    #[test]
    fn test_sync_requires_config_and_catalog() {
        let runner = runner(&["saasoptics-tap", "sync"]);
        assert!(matches!(runner.load_config(None), Err(Error::Config { .. })));
        assert!(matches!(runner.load_catalog(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_inline_config_and_state() {
        let runner = runner(&[
            "saasoptics-tap",
            "--state-json",
            r#"{"bookmarks":{"revenue_entries":55},"currentlySyncing":"revenue_entries"}"#,
            "validate",
        ]);
        let config = runner
            .load_config(Some(
                r#"{"api_token":"t","account_name":"acme","server_subdomain":"ws","start_date":"2023-01-01"}"#,
            ))
            .unwrap();
        assert_eq!(config.account_name, "acme");

        let state = runner.load_state().unwrap();
        assert_eq!(state.currently_syncing(), Some("revenue_entries"));
    }

    #[test]
    fn test_validate_with_catalog() {
        let catalog = temp_file(
            r#"{"streams":[{"tap_stream_id":"accounts","metadata":[{"breadcrumb":[],"metadata":{"selected":true}}]}]}"#,
        );
        let path = catalog.path().to_str().unwrap();
        let runner = runner(&["saasoptics-tap", "--catalog", path, "validate"]);
        assert!(runner.validate(None).is_ok());
    }
}
