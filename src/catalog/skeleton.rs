//! Catalog skeleton generation
//!
//! Builds a permissive catalog from the stream definitions: every stream is
//! selected and its schema declares no properties, so records pass through
//! whole. Users are expected to narrow it down.

use super::types::{Catalog, CatalogEntry, Inclusion, Metadata, MetadataEntry};
use crate::streams::{StreamDefinition, StreamTree};
use crate::types::JsonObject;
use serde_json::{json, Value};

/// Generate a catalog covering every stream of the tree
pub fn skeleton(tree: &StreamTree) -> Catalog {
    let mut streams = Vec::new();
    for stream in &tree.streams {
        collect(stream, None, &mut streams);
    }
    Catalog { streams }
}

fn collect(stream: &StreamDefinition, parent: Option<&str>, out: &mut Vec<CatalogEntry>) {
    out.push(entry_for(stream, parent));
    for child in &stream.children {
        collect(child, Some(&stream.name), out);
    }
}

fn entry_for(stream: &StreamDefinition, parent: Option<&str>) -> CatalogEntry {
    let mut other = JsonObject::new();
    other.insert(
        "table-key-properties".to_string(),
        json!(stream.key_properties),
    );
    other.insert(
        "forced-replication-method".to_string(),
        serde_json::to_value(stream.replication_method).unwrap_or(Value::Null),
    );
    if let Some(field) = stream.bookmark_field() {
        other.insert("valid-replication-keys".to_string(), json!([field]));
    }
    if let Some(parent) = parent {
        other.insert("parent-tap-stream-id".to_string(), json!(parent));
    }

    let mut metadata = vec![MetadataEntry {
        breadcrumb: Vec::new(),
        metadata: Metadata {
            selected: Some(true),
            inclusion: Some(Inclusion::Available),
            other,
        },
    }];

    let mut automatic: Vec<&str> = stream.key_properties.iter().map(String::as_str).collect();
    if let Some(field) = stream.bookmark_field() {
        if !automatic.contains(&field) {
            automatic.push(field);
        }
    }
    for field in automatic {
        metadata.push(MetadataEntry {
            breadcrumb: vec!["properties".to_string(), field.to_string()],
            metadata: Metadata {
                inclusion: Some(Inclusion::Automatic),
                ..Metadata::default()
            },
        });
    }

    CatalogEntry {
        tap_stream_id: stream.name.clone(),
        stream: Some(stream.name.clone()),
        key_properties: stream.key_properties.clone(),
        schema: json!({"type": "object"}),
        metadata,
    }
}
