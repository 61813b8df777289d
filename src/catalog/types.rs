//! Catalog types
//!
//! Singer catalog document: one entry per stream with its schema, key
//! properties and breadcrumb metadata.

use crate::error::{Error, Result};
use crate::types::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Field inclusion declared by the schema metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inclusion {
    /// Always emitted
    Automatic,
    /// Emitted unless deselected
    Available,
    /// Never emitted
    Unsupported,
}

/// Metadata attached to a breadcrumb
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Selection flag set by the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,

    /// Inclusion declared by the tap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusion: Option<Inclusion>,

    /// Everything else (table-key-properties, valid-replication-keys, ...)
    #[serde(flatten)]
    pub other: JsonObject,
}

/// One metadata entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// `[]` for the stream, `["properties", <field>]` for a field
    #[serde(default)]
    pub breadcrumb: Vec<String>,

    /// Metadata values
    #[serde(default)]
    pub metadata: Metadata,
}

/// One stream of the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream identifier
    pub tap_stream_id: String,

    /// Stream name (defaults to the identifier)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,

    /// Fields identifying a record
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// JSON schema of the records
    #[serde(default = "empty_object_schema")]
    pub schema: Value,

    /// Breadcrumb metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

fn empty_object_schema() -> Value {
    serde_json::json!({"type": "object"})
}

impl CatalogEntry {
    /// Stream name
    pub fn name(&self) -> &str {
        self.stream.as_deref().unwrap_or(&self.tap_stream_id)
    }

    /// Stream-level metadata
    pub fn stream_metadata(&self) -> Option<&Metadata> {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.is_empty())
            .map(|m| &m.metadata)
    }

    /// Metadata of a top-level field
    pub fn field_metadata(&self, field: &str) -> Option<&Metadata> {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.len() == 2 && m.breadcrumb[0] == "properties" && m.breadcrumb[1] == field)
            .map(|m| &m.metadata)
    }

    /// Whether the stream is selected for sync
    pub fn is_selected(&self) -> bool {
        self.stream_metadata()
            .and_then(|m| m.selected)
            .unwrap_or(false)
    }

    /// Whether a top-level field is emitted
    ///
    /// Automatic fields are always kept and unsupported ones always dropped;
    /// otherwise only an explicit `selected: false` removes the field.
    pub fn field_included(&self, field: &str) -> bool {
        let Some(metadata) = self.field_metadata(field) else {
            return true;
        };
        match metadata.inclusion {
            Some(Inclusion::Automatic) => true,
            Some(Inclusion::Unsupported) => false,
            _ => metadata.selected != Some(false),
        }
    }

    /// Top-level fields the metadata excludes
    pub fn excluded_fields(&self) -> Vec<String> {
        self.metadata
            .iter()
            .filter(|m| m.breadcrumb.len() == 2 && m.breadcrumb[0] == "properties")
            .map(|m| m.breadcrumb[1].clone())
            .filter(|field| !self.field_included(field))
            .collect()
    }

    /// Mark the stream selected or deselected
    pub fn set_selected(&mut self, selected: bool) {
        if let Some(entry) = self.metadata.iter_mut().find(|m| m.breadcrumb.is_empty()) {
            entry.metadata.selected = Some(selected);
        } else {
            self.metadata.insert(
                0,
                MetadataEntry {
                    breadcrumb: Vec::new(),
                    metadata: Metadata {
                        selected: Some(selected),
                        ..Metadata::default()
                    },
                },
            );
        }
    }
}

/// Singer catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog entries
    #[serde(default)]
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Load a catalog from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read catalog file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Parse a catalog from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Failed to parse catalog JSON: {e}")))
    }

    /// Find an entry by stream name
    pub fn get(&self, stream: &str) -> Option<&CatalogEntry> {
        self.streams
            .iter()
            .find(|e| e.tap_stream_id == stream || e.name() == stream)
    }

    /// Find an entry by stream name for modification
    pub fn get_mut(&mut self, stream: &str) -> Option<&mut CatalogEntry> {
        self.streams
            .iter_mut()
            .find(|e| e.tap_stream_id == stream || e.stream.as_deref() == Some(stream))
    }

    /// Whether a stream is in the catalog and selected
    pub fn is_selected(&self, stream: &str) -> bool {
        self.get(stream).is_some_and(CatalogEntry::is_selected)
    }

    /// Names of every selected stream, in catalog order
    pub fn selected_streams(&self) -> Vec<String> {
        self.streams
            .iter()
            .filter(|e| e.is_selected())
            .map(|e| e.name().to_string())
            .collect()
    }

    /// Pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }
}
