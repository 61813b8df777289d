//! Typed record

use crate::types::JsonObject;
use serde_json::Value;

/// A transformed record with annotations added by the tap
///
/// Annotations (such as the parent id of a child record) are kept apart from
/// the schema fields and win over them when the record is emitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: JsonObject,
    annotations: JsonObject,
}

impl Record {
    /// Create a record from schema fields
    pub fn new(fields: JsonObject) -> Self {
        Self {
            fields,
            annotations: JsonObject::new(),
        }
    }

    /// Attach an annotation field
    pub fn annotate(&mut self, field: impl Into<String>, value: Value) {
        self.annotations.insert(field.into(), value);
    }

    /// Value of a field, annotations first
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.annotations
            .get(field)
            .or_else(|| self.fields.get(field))
    }

    /// Schema fields
    pub fn fields(&self) -> &JsonObject {
        &self.fields
    }

    /// Merged JSON object as emitted
    pub fn to_value(&self) -> Value {
        let mut merged = self.fields.clone();
        for (field, value) in &self.annotations {
            merged.insert(field.clone(), value.clone());
        }
        Value::Object(merged)
    }
}
