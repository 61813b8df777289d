//! Catalog module
//!
//! The Singer catalog decides which streams run, which fields are emitted
//! and which schema is announced for each stream.

mod skeleton;
mod types;

pub use skeleton::skeleton;
pub use types::{Catalog, CatalogEntry, Inclusion, Metadata, MetadataEntry};
