//! Pagination strategy implementations

use super::types::{extract_path, NextPage, PaginationState, Paginator};
use serde_json::Value;

/// Next URL pagination (URL in response body)
///
/// Extracts next page URL and the total count from fields in the response
/// body, e.g. `{"count": 250, "next": "https://.../invoices/?page=2", "results": [...]}`.
#[derive(Debug, Clone)]
pub struct NextUrlPaginator {
    /// Path to the next page URL
    pub next_path: String,
    /// Path to the total count
    pub count_path: String,
}

impl Default for NextUrlPaginator {
    fn default() -> Self {
        Self::new("next", "count")
    }
}

impl NextUrlPaginator {
    /// Create a new next URL paginator
    pub fn new(next_path: impl Into<String>, count_path: impl Into<String>) -> Self {
        Self {
            next_path: next_path.into(),
            count_path: count_path.into(),
        }
    }

    /// Total count reported by a response (0 when absent)
    pub fn total_count(&self, body: &Value) -> u64 {
        match extract_path(body, &self.count_path) {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

impl Paginator for NextUrlPaginator {
    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_fetched(records_count as u64);
        state.add_offset(u64::from(state.limit));
        state.total_count = self.total_count(body);

        if let Some(Value::String(next_url)) = extract_path(body, &self.next_path) {
            if !next_url.trim().is_empty() {
                return NextPage::with_url(next_url.clone());
            }
        }

        NextPage::Done
    }
}
