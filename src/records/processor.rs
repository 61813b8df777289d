//! Per-record pipeline: transform, annotate, filter

use super::filter::IncrementalFilter;
use super::record::Record;
use crate::error::{Error, Result};
use crate::schema::Transformer;
use crate::state::Bookmark;
use serde_json::Value;

/// Parent record a child stream is being synced for
#[derive(Debug, Clone, PartialEq)]
pub struct ParentRef {
    /// Parent stream name
    pub stream: String,
    /// Annotation field on child records (e.g. `account_id`)
    pub field: String,
    /// Parent record id
    pub id: Value,
}

/// Result of processing one raw record
#[derive(Debug, Clone)]
pub struct Processed {
    /// Transformed, annotated record
    pub record: Record,
    /// Replication value, when the record has one
    pub replication_value: Option<Bookmark>,
    /// Whether the record passes the incremental filter
    pub emit: bool,
}

/// Turns raw API records into typed records for one stream invocation
#[derive(Debug)]
pub struct RecordProcessor<'a> {
    stream: &'a str,
    transformer: Transformer<'a>,
    filter: IncrementalFilter,
    parent: Option<ParentRef>,
}

impl<'a> RecordProcessor<'a> {
    /// Create a processor
    pub fn new(
        stream: &'a str,
        transformer: Transformer<'a>,
        filter: IncrementalFilter,
        parent: Option<ParentRef>,
    ) -> Self {
        Self {
            stream,
            transformer,
            filter,
            parent,
        }
    }

    /// Process one raw record
    pub fn process(&self, raw: Value) -> Result<Processed> {
        let Value::Object(fields) = raw else {
            return Err(Error::transform(
                self.stream,
                format!("Expected a JSON object, got {raw}"),
            ));
        };

        let mut record = Record::new(self.transformer.transform(fields)?);
        if let Some(parent) = &self.parent {
            record.annotate(parent.field.clone(), parent.id.clone());
        }

        let replication_value = self.filter.replication_value(&record)?;
        let emit = self.filter.admits(replication_value.as_ref());

        Ok(Processed {
            record,
            replication_value,
            emit,
        })
    }
}
