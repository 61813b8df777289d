//! Page traversal for one window
//!
//! The first request goes to `base_url/path` with the window's query
//! parameters; every later request follows the `next` link from the previous
//! body, resolved against the URL that produced it. The pager never retries:
//! transport errors propagate.

use super::strategies::NextUrlPaginator;
use super::types::{NextPage, Page, PaginationState, Paginator};
use crate::error::Result;
use crate::http::{HttpAccessor, PageRequest};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Iterates the pages of one window traversal
#[derive(Debug)]
pub struct Pager<'a> {
    stream: &'a str,
    base_url: &'a str,
    path: String,
    params: Vec<(String, String)>,
    data_key: Option<&'a str>,
    paginator: NextUrlPaginator,
    state: PaginationState,
    /// Full URL of the last request, the base for relative `next` links
    last_url: Option<Url>,
}

impl<'a> Pager<'a> {
    /// Create a pager
    pub fn new(
        stream: &'a str,
        base_url: &'a str,
        path: impl Into<String>,
        params: Vec<(String, String)>,
        data_key: Option<&'a str>,
        limit: u32,
    ) -> Self {
        Self {
            stream,
            base_url,
            path: path.into(),
            params,
            data_key,
            paginator: NextUrlPaginator::default(),
            state: PaginationState::new(limit),
            last_url: None,
        }
    }

    /// Pagination progress
    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// URL of the first request, without query string
    pub fn first_url(&self) -> String {
        build_url(self.base_url, &self.path)
    }

    /// Fetch the next page
    ///
    /// Returns `None` once the window is exhausted: no `next` URL, or an
    /// empty / absent page.
    pub async fn next_page<A>(&mut self, accessor: &A) -> Result<Option<Page>>
    where
        A: HttpAccessor + ?Sized,
    {
        if self.state.done {
            return Ok(None);
        }

        if self.last_url.is_some() && self.state.next_url.is_none() {
            self.state.mark_done();
            return Ok(None);
        }

        let request = match (&self.state.next_url, &self.last_url) {
            (Some(next), Some(previous)) => PageRequest {
                url: resolve_url(previous.as_str(), next)?,
                path: self.path.clone(),
                query: Vec::new(),
                stream: self.stream.to_string(),
            },
            _ => PageRequest {
                url: self.first_url(),
                path: self.path.clone(),
                query: self.params.clone(),
                stream: self.stream.to_string(),
            },
        };
        let mut last_url = Url::parse(&request.url)?;
        if !request.query.is_empty() {
            last_url.query_pairs_mut().extend_pairs(&request.query);
        }
        self.last_url = Some(last_url);

        let mut body = accessor.get(&request).await?;
        let records = match self.data_key {
            Some(key) => body.get_mut(key).map(Value::take).map(into_records).unwrap_or_default(),
            None => into_records(body.clone()),
        };

        if records.is_empty() {
            debug!(
                stream = self.stream,
                page = self.state.page + 1,
                "Empty page, window complete"
            );
            self.state.mark_done();
            return Ok(None);
        }

        let offset = self.state.offset;
        self.state.next_page();
        match self
            .paginator
            .process_response(&body, records.len(), &mut self.state)
        {
            NextPage::Continue { url } => self.state.next_url = Some(url),
            NextPage::Done => self.state.mark_done(),
        }

        Ok(Some(Page {
            number: self.state.page,
            records,
            total_count: self.state.total_count,
            offset,
        }))
    }
}

fn into_records(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(map) if !map.is_empty() => vec![Value::Object(map)],
        _ => Vec::new(),
    }
}

/// Join a base URL and a path
pub fn build_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Resolve a `next` link against the URL of the request that returned it
///
/// Absolute links are used unchanged; host-relative, path-relative and
/// query-only links follow standard URL reference resolution.
pub fn resolve_url(previous: &str, next: &str) -> Result<String> {
    Ok(Url::parse(previous)?.join(next.trim())?.to_string())
}
