//! State management module
//!
//! Handles bookmark tracking and resumability. State is written through on
//! every change so an interrupted run resumes from the last committed page.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Bookmarks plus the currently-syncing pointer
//! - `Bookmark` - Integer or datetime watermark
//! - `StateManager` - File-based state persistence

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{Bookmark, State};

#[cfg(test)]
mod manager_tests;
