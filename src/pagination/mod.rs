//! Pagination module
//!
//! Next-URL pagination as used by the SaaSOptics API.
//!
//! # Overview
//!
//! Responses carry the records under a data key, a `count` total hint and a
//! `next` link. The `Pager` walks those links for one window; the
//! `Paginator` strategy reads the link and count from each body.

mod pager;
mod strategies;
mod types;

pub use pager::{build_url, resolve_url, Pager};
pub use strategies::NextUrlPaginator;
pub use types::{extract_path, NextPage, Page, PaginationState, Paginator};

#[cfg(test)]
mod tests;
