//! YAML parser for stream definitions
//!
//! Parses and validates stream definition files. Every structural problem is
//! reported at load time so a sync never starts on a malformed tree.

use super::builtin;
use super::types::{StreamDefinition, StreamTree, MAX_STREAM_DEPTH};
use crate::error::{Error, Result};
use crate::template;
use crate::types::{BookmarkType, ReplicationMethod};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load the stream definitions the tap ships with
pub fn load_builtin_streams() -> Result<StreamTree> {
    load_streams_from_str(builtin::SAASOPTICS_STREAMS)
}

/// Load stream definitions from a YAML file
pub fn load_streams(path: impl AsRef<Path>) -> Result<StreamTree> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read streams file '{}': {}",
            path.display(),
            e
        ))
    })?;
    load_streams_from_str(&content)
}

/// Load stream definitions from a YAML string
pub fn load_streams_from_str(yaml: &str) -> Result<StreamTree> {
    let tree: StreamTree = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse streams YAML: {e}")))?;

    validate_tree(&tree)?;
    Ok(tree)
}

/// Validate a whole definitions tree
pub fn validate_tree(tree: &StreamTree) -> Result<()> {
    if tree.streams.is_empty() {
        return Err(Error::config("At least one stream must be defined"));
    }

    let mut seen = HashSet::new();
    for (stream, depth) in tree.walk() {
        if depth >= MAX_STREAM_DEPTH {
            return Err(Error::RecursionLimit {
                stream: stream.name.clone(),
                max_depth: MAX_STREAM_DEPTH,
            });
        }
        if !seen.insert(stream.name.as_str()) {
            return Err(Error::invalid_stream(
                &stream.name,
                "stream names must be unique across the tree",
            ));
        }
        validate_stream(stream, depth)?;
    }

    Ok(())
}

/// Validate a single stream definition
fn validate_stream(stream: &StreamDefinition, depth: usize) -> Result<()> {
    let name = stream.name.as_str();

    if name.trim().is_empty() {
        return Err(Error::config("Stream name cannot be empty"));
    }

    if stream.path().trim().is_empty() {
        return Err(Error::invalid_stream(name, "path cannot be empty"));
    }

    if stream.replication_method == ReplicationMethod::Incremental {
        if stream.replication_keys.is_empty() {
            return Err(Error::invalid_stream(
                name,
                "incremental streams need at least one replication key",
            ));
        }
        if stream.bookmark_type.is_none() {
            return Err(Error::invalid_stream(
                name,
                "incremental streams need a bookmark_type",
            ));
        }
    }

    if stream.bookmark_query_field_to.is_some() {
        if stream.bookmark_query_field_from.is_none() {
            return Err(Error::invalid_stream(
                name,
                "bookmark_query_field_to requires bookmark_query_field_from",
            ));
        }
        if stream.bookmark_type == Some(BookmarkType::Integer) {
            return Err(Error::invalid_stream(
                name,
                "integer bookmarks do not support a range upper bound",
            ));
        }
    }

    if stream.window_days == Some(0) {
        return Err(Error::invalid_stream(name, "window_days must be at least 1"));
    }

    if depth > 0 {
        if stream.parent.as_deref().map_or(true, |p| p.trim().is_empty()) {
            return Err(Error::invalid_stream(
                name,
                "child streams must name their parent",
            ));
        }
        if !template::has_parent_slot(stream.path()) {
            return Err(Error::invalid_stream(
                name,
                "child stream path must contain a parent id placeholder",
            ));
        }
    }

    if !stream.children.is_empty() && stream.parent_id_field().is_none() {
        return Err(Error::invalid_stream(
            name,
            "streams with children need key_properties",
        ));
    }

    Ok(())
}
