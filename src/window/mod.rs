//! Window scheduling module
//!
//! Splits `[last bookmark, now)` into the passes a stream sync makes.

mod scheduler;
mod types;

pub use scheduler::{DateWindows, WindowScheduler};
pub use types::{Pass, Window};
