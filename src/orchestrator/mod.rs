//! Sync orchestration
//!
//! Runs the selected top-level streams in declared order. A run interrupted
//! mid-stream leaves the stream name in `currently_syncing`; the next run
//! skips the streams declared before it and resumes there.

use crate::engine::SyncEngine;
use crate::error::Result;
use crate::http::HttpAccessor;
use crate::output::Sink;
use crate::streams::StreamTree;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of one stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    /// Stream name
    pub stream: String,
    /// Record total reported by the API
    pub total_records: u64,
}

/// Outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Synced streams in order
    pub streams: Vec<StreamSummary>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncSummary {
    /// Names of the synced streams
    pub fn stream_names(&self) -> Vec<&str> {
        self.streams.iter().map(|s| s.stream.as_str()).collect()
    }
}

/// Whether a stream runs, given the resume gate
///
/// Returns the decision and the gate to carry to the next stream. The gate
/// clears once its stream is reached, selected or not.
pub fn should_sync_stream(
    selected: &[String],
    last_stream: Option<&str>,
    stream: &str,
) -> (bool, Option<String>) {
    match last_stream {
        Some(last) if last != stream => (false, Some(last.to_string())),
        _ => (selected.iter().any(|s| s == stream), None),
    }
}

/// Sync every selected top-level stream
pub async fn sync_all<A, S>(engine: &mut SyncEngine<A, S>, tree: &StreamTree) -> Result<SyncSummary>
where
    A: HttpAccessor,
    S: Sink,
{
    let start = Instant::now();
    let mut summary = SyncSummary::default();

    let selected = engine.catalog().selected_streams();
    if selected.is_empty() {
        info!("No streams selected");
        return Ok(summary);
    }
    info!(selected = ?selected, "Selected streams");

    let mut last_stream = engine.state().currently_syncing().map(ToString::to_string);
    if let Some(pointer) = last_stream.as_deref() {
        if tree.is_top_level(pointer) && selected.iter().any(|s| s == pointer) {
            info!(stream = pointer, "Resuming interrupted sync");
        } else {
            warn!(
                stream = pointer,
                "currently_syncing does not name a selected top-level stream, ignoring"
            );
            last_stream = None;
        }
    }

    for stream in tree.iter() {
        let (should_sync, gate) = should_sync_stream(&selected, last_stream.as_deref(), &stream.name);
        last_stream = gate;
        if !should_sync {
            debug!(stream = %stream.name, "Skipping stream");
            continue;
        }

        engine.set_currently_syncing(Some(&stream.name)).await?;
        let total_records = engine.sync_stream(stream).await?;
        engine.set_currently_syncing(None).await?;

        summary.streams.push(StreamSummary {
            stream: stream.name.clone(),
            total_records,
        });
    }

    summary.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        streams = summary.streams.len(),
        emitted = engine.stats().records_emitted,
        duration_ms = summary.duration_ms,
        "Sync complete"
    );
    Ok(summary)
}
