//! Schema module
//!
//! Typed view of a stream's JSON schema and the transformer that conforms
//! raw records to it.
//!
//! # Features
//!
//! - **Type Coercion**: Converts numeric strings, 0/1 booleans and the like
//! - **Datetime Normalization**: `date-time` fields are rewritten in UTC
//! - **Field Removal**: Drops fields the schema does not declare

mod transform;
mod types;

pub use transform::Transformer;
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};
