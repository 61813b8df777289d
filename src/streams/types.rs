//! Stream definition types
//!
//! Declarative stream definitions parsed from YAML. Child streams are nested
//! under their parent, so a definition file is a forest of stream trees.

use crate::types::{BookmarkType, ReplicationMethod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Deepest parent/child nesting accepted for a stream tree
pub const MAX_STREAM_DEPTH: usize = 8;

/// Top-level definitions document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamTree {
    /// Top-level streams in the order they are synced
    #[serde(default)]
    pub streams: Vec<StreamDefinition>,
}

impl StreamTree {
    /// Top-level streams in declared order
    pub fn iter(&self) -> impl Iterator<Item = &StreamDefinition> {
        self.streams.iter()
    }

    /// Find a stream anywhere in the tree
    pub fn find(&self, name: &str) -> Option<&StreamDefinition> {
        self.walk().into_iter().map(|(def, _)| def).find(|def| def.name == name)
    }

    /// Whether `name` is a top-level stream
    pub fn is_top_level(&self, name: &str) -> bool {
        self.streams.iter().any(|s| s.name == name)
    }

    /// Every stream with its depth (0 = top level), depth first
    pub fn walk(&self) -> Vec<(&StreamDefinition, usize)> {
        let mut out = Vec::new();
        for stream in &self.streams {
            stream.walk_into(0, &mut out);
        }
        out
    }

    /// Every stream name, depth first
    pub fn names(&self) -> Vec<&str> {
        self.walk().into_iter().map(|(def, _)| def.name.as_str()).collect()
    }
}

/// Stream definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StreamDefinition {
    /// Stream name (also the bookmark key)
    pub name: String,

    /// Request path relative to the base URL (defaults to the name)
    ///
    /// For child streams the parent's id is substituted for `{{ parent_id }}`.
    #[serde(default)]
    pub path: Option<String>,

    /// Fields that identify a record
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// Replication method
    #[serde(default)]
    pub replication_method: ReplicationMethod,

    /// Replication key fields; the first one is the bookmark field
    #[serde(default)]
    pub replication_keys: Vec<String>,

    /// Domain of the bookmark field
    #[serde(default)]
    pub bookmark_type: Option<BookmarkType>,

    /// Query parameter receiving the lower bound
    #[serde(default)]
    pub bookmark_query_field_from: Option<String>,

    /// Query parameter receiving the upper bound (datetime streams)
    #[serde(default)]
    pub bookmark_query_field_to: Option<String>,

    /// Response key holding the records (`null` = the payload itself)
    #[serde(default = "default_data_key")]
    pub data_key: Option<String>,

    /// Static query parameters
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// Width of a date window in days (overrides the tap config)
    #[serde(default)]
    pub window_days: Option<u32>,

    /// Parent name used for the `<parent>_id` annotation of child records
    #[serde(default)]
    pub parent: Option<String>,

    /// Child streams synced once per parent record
    #[serde(default)]
    pub children: Vec<StreamDefinition>,
}

fn default_data_key() -> Option<String> {
    Some("results".to_string())
}

impl StreamDefinition {
    /// Create a full-table stream definition keyed by `id`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            key_properties: vec!["id".to_string()],
            replication_method: ReplicationMethod::FullTable,
            replication_keys: Vec::new(),
            bookmark_type: None,
            bookmark_query_field_from: None,
            bookmark_query_field_to: None,
            data_key: default_data_key(),
            params: BTreeMap::new(),
            window_days: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Request path template
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }

    /// Field compared against the bookmark, for incremental streams
    pub fn bookmark_field(&self) -> Option<&str> {
        match self.replication_method {
            ReplicationMethod::Incremental => self.replication_keys.first().map(String::as_str),
            ReplicationMethod::FullTable => None,
        }
    }

    /// Whether the API accepts both ends of a date range for this stream
    pub fn supports_range_filter(&self) -> bool {
        self.bookmark_query_field_from.is_some() && self.bookmark_query_field_to.is_some()
    }

    /// Field of this stream's records passed to children as the parent id
    ///
    /// A key property literally named `id` wins; otherwise the last key
    /// property listed is used.
    pub fn parent_id_field(&self) -> Option<&str> {
        let mut selected = None;
        for field in &self.key_properties {
            if field == "id" {
                return Some(field);
            }
            selected = Some(field.as_str());
        }
        selected
    }

    /// Field name carrying the parent id on this (child) stream's records
    pub fn parent_annotation_field(&self) -> Option<String> {
        self.parent.as_ref().map(|parent| format!("{parent}_id"))
    }

    // Builder-style helpers, mostly for tests

    /// Make this an incremental stream
    #[must_use]
    pub fn incremental(mut self, key: impl Into<String>, kind: BookmarkType) -> Self {
        self.replication_method = ReplicationMethod::Incremental;
        self.replication_keys = vec![key.into()];
        self.bookmark_type = Some(kind);
        self
    }

    /// Set the bookmark query fields
    #[must_use]
    pub fn query_fields(mut self, from: impl Into<String>, to: Option<&str>) -> Self {
        self.bookmark_query_field_from = Some(from.into());
        self.bookmark_query_field_to = to.map(ToString::to_string);
        self
    }

    /// Set the request path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add a static query parameter
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a child stream
    #[must_use]
    pub fn with_child(mut self, child: StreamDefinition) -> Self {
        self.children.push(child);
        self
    }

    fn walk_into<'a>(&'a self, depth: usize, out: &mut Vec<(&'a StreamDefinition, usize)>) {
        out.push((self, depth));
        for child in &self.children {
            child.walk_into(depth + 1, out);
        }
    }
}
