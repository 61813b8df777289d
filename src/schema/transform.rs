//! Schema-driven record transformation
//!
//! Conforms raw API records to the stream schema: values are coerced to the
//! declared type where that is lossless, `date-time` strings are normalized
//! to the canonical UTC format, and fields the schema does not declare (or
//! the catalog deselects) are removed.

use super::types::{JsonSchema, JsonType, SchemaProperty};
use crate::error::{Error, Result};
use crate::types::{format_datetime, parse_datetime, JsonObject};
use serde_json::{Number, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::trace;

/// Record transformer for one stream
#[derive(Debug)]
pub struct Transformer<'a> {
    stream: &'a str,
    schema: &'a JsonSchema,
    excluded: HashSet<String>,
}

impl<'a> Transformer<'a> {
    /// Create a transformer for a stream schema
    pub fn new(stream: &'a str, schema: &'a JsonSchema) -> Self {
        Self {
            stream,
            schema,
            excluded: HashSet::new(),
        }
    }

    /// Drop these top-level fields regardless of the schema
    #[must_use]
    pub fn excluding(mut self, fields: impl IntoIterator<Item = String>) -> Self {
        self.excluded.extend(fields);
        self
    }

    /// Transform one record
    pub fn transform(&self, record: JsonObject) -> Result<JsonObject> {
        let Some(properties) = &self.schema.properties else {
            return Ok(record
                .into_iter()
                .filter(|(field, _)| !self.excluded.contains(field))
                .collect());
        };

        let mut out = JsonObject::new();
        let mut dropped = 0usize;
        for (field, value) in record {
            if self.excluded.contains(&field) {
                dropped += 1;
                continue;
            }
            match properties.get(&field) {
                Some(property) => {
                    let value = self.transform_value(&field, value, property)?;
                    out.insert(field, value);
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            trace!(stream = self.stream, dropped, "Removed fields outside the schema");
        }
        Ok(out)
    }

    fn transform_value(&self, path: &str, value: Value, property: &SchemaProperty) -> Result<Value> {
        if let Some(alternatives) = &property.any_of {
            for alternative in alternatives {
                if let Ok(v) = self.transform_value(path, value.clone(), alternative) {
                    return Ok(v);
                }
            }
            return Err(self.mismatch(path, &value, "any allowed schema"));
        }

        if value.is_null() {
            return Ok(Value::Null);
        }

        let Some(json_type) = &property.json_type else {
            return Ok(value);
        };
        let types = json_type.non_null();

        if let Some(t) = types.iter().copied().find(|t| t.matches(&value)) {
            return self.conform(path, value, t, property);
        }
        for t in &types {
            if let Some(coerced) = coerce(&value, *t) {
                return self.conform(path, coerced, *t, property);
            }
        }

        let expected = types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" or ");
        Err(self.mismatch(path, &value, &expected))
    }

    fn conform(
        &self,
        path: &str,
        value: Value,
        json_type: JsonType,
        property: &SchemaProperty,
    ) -> Result<Value> {
        match (json_type, value) {
            (JsonType::String, Value::String(s)) if property.is_datetime() => {
                if s.trim().is_empty() && property.is_nullable() {
                    return Ok(Value::Null);
                }
                let dt = parse_datetime(&s).map_err(|_| {
                    Error::transform(
                        self.stream,
                        format!("Field '{path}' is not a valid date-time: {s}"),
                    )
                })?;
                Ok(Value::String(format_datetime(&dt)))
            }
            (JsonType::Object, Value::Object(map)) => match &property.properties {
                Some(properties) => self.transform_object(path, map, properties),
                None => Ok(Value::Object(map)),
            },
            (JsonType::Array, Value::Array(items)) => match &property.items {
                Some(item_schema) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| self.transform_value(&format!("{path}[{i}]"), item, item_schema))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array),
                None => Ok(Value::Array(items)),
            },
            (_, v) => Ok(v),
        }
    }

    fn transform_object(
        &self,
        path: &str,
        map: JsonObject,
        properties: &BTreeMap<String, SchemaProperty>,
    ) -> Result<Value> {
        let mut out = JsonObject::new();
        for (field, value) in map {
            if let Some(property) = properties.get(&field) {
                let nested = format!("{path}.{field}");
                out.insert(field, self.transform_value(&nested, value, property)?);
            }
        }
        Ok(Value::Object(out))
    }

    fn mismatch(&self, path: &str, value: &Value, expected: &str) -> Error {
        Error::transform(
            self.stream,
            format!("Field '{path}' expected {expected}, got {value}"),
        )
    }
}

/// Lossless conversion of a value to another JSON type
fn coerce(value: &Value, target: JsonType) -> Option<Value> {
    match (target, value) {
        (JsonType::Integer, Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| Value::from(f as i64)),
        (JsonType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
        (JsonType::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        (JsonType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        (JsonType::Boolean, Value::Number(n)) => match n.as_i64() {
            Some(0) => Some(Value::Bool(false)),
            Some(1) => Some(Value::Bool(true)),
            _ => None,
        },
        (JsonType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (JsonType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
        _ => None,
    }
}
