//! Execution engine module
//!
//! Syncs one stream and, recursively, its children.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - drives windows, pages, records and bookmarks for a stream
//! - `SyncConfig` - base URL, start date and window settings
//! - `SyncStats` - counters for a run
//!
//! A stream invocation announces its schema, plans its passes, walks every
//! page of every pass, emits the records admitted by the incremental filter,
//! syncs the selected children once per record of the page, then persists
//! the bookmark before moving to the next page.

mod types;

pub use types::{system_clock, Clock, SyncConfig, SyncStats};

use crate::catalog::{Catalog, CatalogEntry};
use crate::error::{Error, Result};
use crate::http::HttpAccessor;
use crate::output::Sink;
use crate::pagination::Pager;
use crate::records::{BookmarkTracker, IncrementalFilter, ParentRef, Record, RecordProcessor};
use crate::schema::{JsonSchema, Transformer};
use crate::state::{Bookmark, StateManager};
use crate::streams::StreamDefinition;
use crate::template;
use crate::types::BookmarkType;
use crate::window::WindowScheduler;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Sync engine for one run
pub struct SyncEngine<A, S> {
    /// Page source
    accessor: A,
    /// Message destination
    sink: S,
    /// State manager
    state: StateManager,
    /// Selection, schemas and metadata
    catalog: Arc<Catalog>,
    /// Sync configuration
    config: SyncConfig,
    /// Window planner
    scheduler: WindowScheduler,
    /// Statistics
    stats: SyncStats,
    /// Current time
    clock: Clock,
}

impl<A, S> SyncEngine<A, S>
where
    A: HttpAccessor,
    S: Sink,
{
    /// Create a new sync engine
    pub fn new(accessor: A, sink: S, state: StateManager, catalog: Catalog, config: SyncConfig) -> Self {
        let scheduler = WindowScheduler::new(config.window_days);
        Self {
            accessor,
            sink,
            state,
            catalog: Arc::new(catalog),
            config,
            scheduler,
            stats: SyncStats::default(),
            clock: system_clock(),
        }
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get the catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Get the sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Consume the engine, returning the sink and the state
    pub fn into_parts(self) -> (S, StateManager) {
        (self.sink, self.state)
    }

    /// Persist the currently-syncing pointer and emit the state
    pub async fn set_currently_syncing(&mut self, stream: Option<&str>) -> Result<()> {
        self.state.set_currently_syncing(stream).await?;
        self.sink.write_state(self.state.state())
    }

    /// Sync a top-level stream
    ///
    /// Returns the record total reported by the API (sum over windows).
    pub async fn sync_stream(&mut self, stream: &StreamDefinition) -> Result<u64> {
        let start = Instant::now();
        info!(stream = %stream.name, "Starting sync");

        let total = self
            .sync_endpoint(stream, stream.path().to_string(), None, 0)
            .await?;

        self.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            stream = %stream.name,
            total_records = total,
            emitted = self.stats.records_emitted,
            pages = self.stats.pages_fetched,
            "Finished sync"
        );
        Ok(total)
    }

    /// Sync one stream invocation (a top-level stream or a child for one
    /// parent record)
    pub fn sync_endpoint<'a>(
        &'a mut self,
        stream: &'a StreamDefinition,
        path: String,
        parent: Option<ParentRef>,
        depth: usize,
    ) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move {
            if depth >= self.config.max_depth {
                return Err(Error::RecursionLimit {
                    stream: stream.name.clone(),
                    max_depth: self.config.max_depth,
                });
            }

            let name = stream.name.as_str();
            let catalog = Arc::clone(&self.catalog);
            let entry = catalog.get(name);

            let last = self.last_bookmark(stream)?;

            let schema_value = entry.map_or_else(|| json!({"type": "object"}), |e| e.schema.clone());
            let schema = JsonSchema::from_value(name, &schema_value)?;
            let key_properties = entry
                .map(|e| e.key_properties.clone())
                .filter(|keys| !keys.is_empty())
                .unwrap_or_else(|| stream.key_properties.clone());
            self.sink
                .write_schema(name, &schema_value, &key_properties)
                .map_err(|e| e.in_stream(name, "write schema"))?;

            let transformer = Transformer::new(name, &schema)
                .excluding(entry.map(CatalogEntry::excluded_fields).unwrap_or_default());
            let filter = IncrementalFilter::new(name, stream.bookmark_field(), last.as_ref());
            let processor = RecordProcessor::new(name, transformer, filter, parent);
            let mut tracker = BookmarkTracker::new(last.clone());

            let children: Vec<&StreamDefinition> = stream
                .children
                .iter()
                .filter(|child| catalog.is_selected(&child.name))
                .collect();

            let passes = self.scheduler.plan(stream, last.as_ref(), (self.clock)())?;
            if passes.is_empty() {
                debug!(stream = name, "Bookmark is current, nothing to fetch");
            }

            let base_url = self.config.base_url.clone();
            let page_size = self.config.page_size;
            let mut total = 0;

            for pass in passes {
                info!(stream = name, window = %pass.describe(), "Syncing window");

                let mut params: Vec<(String, String)> = stream
                    .params
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                params.extend(pass.query_params(stream));

                let mut pager = Pager::new(
                    name,
                    &base_url,
                    path.clone(),
                    params,
                    stream.data_key.as_deref(),
                    page_size,
                );

                loop {
                    let fetched = pager.next_page(&self.accessor).await;
                    let page = match fetched {
                        Ok(Some(page)) => page,
                        Ok(None) => break,
                        Err(e) => {
                            let operation = format!("fetch page {}", pager.state().page + 1);
                            return Err(e.in_stream(name, operation));
                        }
                    };
                    self.stats.add_page();
                    let time_extracted = (self.clock)();

                    let number = page.number;
                    let from = page.offset;
                    let to = page.to_record(page_size);
                    let page_total = page.total_count;

                    let mut records = Vec::with_capacity(page.records.len());
                    for raw in page.records {
                        let processed = processor
                            .process(raw)
                            .map_err(|e| e.in_stream(name, "transform record"))?;
                        if let Some(value) = &processed.replication_value {
                            tracker.observe(value);
                        }
                        if processed.emit {
                            self.emit_record(name, &processed.record, time_extracted)?;
                        } else {
                            self.stats.add_filtered();
                        }
                        records.push(processed.record);
                    }
                    debug!(stream = name, page = number, records = records.len(), "Processed page");

                    for child in &children {
                        self.sync_children(stream, child, &records, depth).await?;
                    }

                    if stream.bookmark_field().is_some() {
                        if let Some(max) = tracker.max().cloned() {
                            self.persist_bookmark(name, max).await?;
                        }
                    }

                    info!(
                        stream = name,
                        page = number,
                        from,
                        to,
                        total = page_total,
                        "Synced page"
                    );
                }

                total += pager.state().total_count;
            }

            self.stats.add_endpoint();
            Ok(total)
        })
    }

    /// Sync one child stream for every record of a parent page
    async fn sync_children(
        &mut self,
        parent: &StreamDefinition,
        child: &StreamDefinition,
        records: &[Record],
        depth: usize,
    ) -> Result<()> {
        let Some(id_field) = parent.parent_id_field() else {
            return Err(Error::invalid_stream(
                &parent.name,
                "parent streams need key_properties",
            ));
        };

        for record in records {
            let id = match record.get(id_field) {
                Some(id) if !id.is_null() => id.clone(),
                _ => {
                    return Err(Error::transform(
                        &parent.name,
                        format!("Parent record has no '{id_field}' for child '{}'", child.name),
                    )
                    .in_stream(&parent.name, format!("sync child '{}'", child.name)))
                }
            };

            let path = template::render_path(child.path(), &id)?;
            let parent_ref = child.parent_annotation_field().map(|field| ParentRef {
                stream: parent.name.clone(),
                field,
                id: id.clone(),
            });

            info!(stream = %child.name, parent = %parent.name, parent_id = %id, "Starting child sync");
            let child_total = self.sync_endpoint(child, path, parent_ref, depth + 1).await?;
            info!(
                stream = %child.name,
                parent_id = %id,
                total_records = child_total,
                "Finished child sync"
            );
        }
        Ok(())
    }

    /// Watermark to filter on: the stored bookmark, else the stream default
    fn last_bookmark(&self, stream: &StreamDefinition) -> Result<Option<Bookmark>> {
        if stream.bookmark_field().is_none() {
            return Ok(None);
        }
        let Some(kind) = stream.bookmark_type else {
            return Err(Error::invalid_stream(
                &stream.name,
                "incremental streams need a bookmark_type",
            ));
        };

        match self.state.bookmark(&stream.name) {
            Some(bookmark) if bookmark.kind() == kind => Ok(Some(bookmark.clone())),
            Some(bookmark) => Err(Error::state(format!(
                "Stored bookmark for '{}' is {} but the stream uses {kind}",
                stream.name,
                bookmark.kind()
            ))),
            None => Ok(Some(default_bookmark(kind, self.config.start_date))),
        }
    }

    fn emit_record(&mut self, stream: &str, record: &Record, time_extracted: DateTime<Utc>) -> Result<()> {
        let body = record.to_value();
        if let Err(e) = self.sink.write_record(stream, &body, time_extracted) {
            error!(stream, record = %body, error = %e, "Failed to write record");
            return Err(e.in_stream(stream, "write record"));
        }
        self.stats.add_emitted();
        Ok(())
    }

    async fn persist_bookmark(&mut self, stream: &str, value: Bookmark) -> Result<()> {
        self.state
            .set_bookmark(stream, value)
            .await
            .map_err(|e| e.in_stream(stream, "write bookmark"))?;
        self.sink
            .write_state(self.state.state())
            .map_err(|e| e.in_stream(stream, "write state"))
    }
}

fn default_bookmark(kind: BookmarkType, start_date: DateTime<Utc>) -> Bookmark {
    match kind {
        BookmarkType::Integer => Bookmark::Integer(0),
        BookmarkType::Datetime => Bookmark::Datetime(start_date),
    }
}

impl<A, S> std::fmt::Debug for SyncEngine<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("base_url", &self.config.base_url)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
