//! State manager implementation
//!
//! Owns the run's `State` and writes it through to disk on every mutation
//! with atomic writes.

use super::types::{Bookmark, State};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// State manager for persisting and loading state
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Path to the state file (empty = in-memory)
    path: PathBuf,
    /// Current state
    state: State,
}

impl StateManager {
    /// Create a state manager writing to the given path, starting empty
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: State::new(),
        }
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            state: State::new(),
        }
    }

    /// Create an in-memory state manager seeded with a state
    pub fn with_state(state: State) -> Self {
        Self {
            path: PathBuf::new(),
            state,
        }
    }

    /// Create a state manager from a file, loading existing state if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| Error::State {
                message: format!("Failed to read state file: {e}"),
            })?;
            if contents.trim().is_empty() {
                State::new()
            } else {
                serde_json::from_str(&contents).map_err(|e| Error::State {
                    message: format!("Failed to parse state file: {e}"),
                })?
            }
        } else {
            State::new()
        };

        Ok(Self { path, state })
    }

    /// Create a state manager from inline JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let state: State = serde_json::from_str(json).map_err(|e| Error::State {
            message: format!("Failed to parse state JSON: {e}"),
        })?;

        Ok(Self::with_state(state))
    }

    /// Save current state to file
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let contents = self.to_json_pretty()?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::State {
                message: format!("Failed to write state file: {e}"),
            })?;
        file.write_all(contents.as_bytes())
            .await
            .map_err(|e| Error::State {
                message: format!("Failed to write state file: {e}"),
            })?;
        file.sync_all().await.map_err(|e| Error::State {
            message: format!("Failed to flush state file: {e}"),
        })?;
        drop(file);

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::State {
                message: format!("Failed to rename state file: {e}"),
            })?;

        Ok(())
    }

    /// Current state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Export state as JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.state).map_err(|e| Error::State {
            message: format!("Failed to serialize state: {e}"),
        })
    }

    /// Export state as pretty-printed JSON string
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.state).map_err(|e| Error::State {
            message: format!("Failed to serialize state: {e}"),
        })
    }

    /// Get the bookmark for a stream
    pub fn bookmark(&self, stream: &str) -> Option<&Bookmark> {
        self.state.bookmark(stream)
    }

    /// Get the bookmark for a stream, or the supplied default
    pub fn bookmark_or(&self, stream: &str, default: Bookmark) -> Bookmark {
        self.state.bookmark_or(stream, default)
    }

    /// Record a new watermark for a stream and persist the whole state
    ///
    /// The stored watermark never moves backwards. Returns whether it changed.
    pub async fn set_bookmark(&mut self, stream: &str, value: Bookmark) -> Result<bool> {
        let changed = self.state.advance_bookmark(stream, value)?;
        match self.state.bookmark(stream) {
            Some(current) if changed => info!(stream, bookmark = %current, "Write state"),
            Some(current) => debug!(stream, bookmark = %current, "Bookmark unchanged"),
            None => {}
        }
        self.save().await?;
        Ok(changed)
    }

    /// Stream that was in progress when the last run stopped
    pub fn currently_syncing(&self) -> Option<&str> {
        self.state.currently_syncing.as_deref()
    }

    /// Set or clear the in-progress stream and persist the whole state
    pub async fn set_currently_syncing(&mut self, stream: Option<&str>) -> Result<()> {
        self.state.currently_syncing = stream.map(ToString::to_string);
        self.save().await
    }

    /// Clear all state
    pub async fn clear(&mut self) -> Result<()> {
        self.state = State::new();
        self.save().await
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}
