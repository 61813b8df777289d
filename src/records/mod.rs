//! Records module
//!
//! Typed records and the per-record pipeline of a stream sync:
//! schema transform, parent annotation, incremental filter and bookmark
//! candidate tracking.

mod filter;
mod processor;
mod record;

pub use filter::{BookmarkTracker, IncrementalFilter};
pub use processor::{ParentRef, Processed, RecordProcessor};
pub use record::Record;
