//! HTTP accessor seam
//!
//! The sync engine reads pages through `HttpAccessor`, so tests can replace
//! the network with canned responses.

use super::client::HttpClient;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// One page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Absolute URL, without the query parameters below
    pub url: String,
    /// Path template the URL was built from (for logs)
    pub path: String,
    /// Query parameters, in order
    pub query: Vec<(String, String)>,
    /// Stream the request belongs to
    pub stream: String,
}

/// Fetches JSON pages
#[async_trait]
pub trait HttpAccessor: Send + Sync {
    /// GET a page and parse its body; an empty body is `null`
    async fn get(&self, request: &PageRequest) -> Result<Value>;
}

#[async_trait]
impl HttpAccessor for HttpClient {
    async fn get(&self, request: &PageRequest) -> Result<Value> {
        debug!(
            stream = %request.stream,
            url = %request.url,
            query = ?request.query,
            "GET"
        );

        let response = self.fetch(&request.url, &request.query).await?;
        let text = response.text().await?;

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            Error::decode(format!(
                "Invalid JSON from {} for '{}': {e}",
                request.url, request.stream
            ))
        })
    }
}
