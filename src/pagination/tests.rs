//! Tests for pagination

use super::*;
use crate::error::{Error, Result};
use crate::http::{HttpAccessor, HttpClient, HttpClientConfig, PageRequest};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Mutex;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Accessor replaying canned bodies and recording requests
struct Scripted {
    bodies: Mutex<Vec<Result<Value>>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl Scripted {
    fn new(bodies: Vec<Result<Value>>) -> Self {
        Self {
            bodies: Mutex::new(bodies.into_iter().rev().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpAccessor for Scripted {
    async fn get(&self, request: &PageRequest) -> Result<Value> {
        self.requests.lock().unwrap().push(request.clone());
        self.bodies.lock().unwrap().pop().unwrap_or(Ok(Value::Null))
    }
}

fn params() -> Vec<(String, String)> {
    vec![("ordering".to_string(), "modified".to_string())]
}

// ============================================================================
// Helper Tests
// ============================================================================

#[test]
fn test_extract_path() {
    let body = json!({"meta": {"next": "n"}, "count": 3});
    assert_eq!(extract_path(&body, "meta.next"), Some(&json!("n")));
    assert_eq!(extract_path(&body, "$.count"), Some(&json!(3)));
    assert_eq!(extract_path(&body, ""), Some(&body));
    assert_eq!(extract_path(&body, "missing.key"), None);
}

#[test]
fn test_build_url() {
    let base = "https://ws.saasoptics.com/acme/api/v1.0";
    assert_eq!(
        build_url(&format!("{base}/"), "/accounts/"),
        "https://ws.saasoptics.com/acme/api/v1.0/accounts/"
    );
    assert_eq!(build_url(base, "accounts"), format!("{base}/accounts"));
}

#[test]
fn test_resolve_url_against_previous_request() {
    let previous = "https://ws.saasoptics.com/acme/api/v1.0/accounts?ordering=modified";
    assert_eq!(
        resolve_url(previous, "https://other.example.com/accounts/?page=2").unwrap(),
        "https://other.example.com/accounts/?page=2"
    );
    assert_eq!(
        resolve_url(previous, "/acme/api/v1.0/accounts/?page=2").unwrap(),
        "https://ws.saasoptics.com/acme/api/v1.0/accounts/?page=2"
    );
    assert_eq!(
        resolve_url(previous, "?page=2").unwrap(),
        "https://ws.saasoptics.com/acme/api/v1.0/accounts?page=2"
    );
    assert_eq!(
        resolve_url(previous, "invoices/?page=2").unwrap(),
        "https://ws.saasoptics.com/acme/api/v1.0/invoices/?page=2"
    );
    assert!(resolve_url("not a url", "?page=2").is_err());
}

#[test]
fn test_next_url_paginator() {
    let paginator = NextUrlPaginator::default();
    let mut state = PaginationState::new(100);

    let next = paginator.process_response(
        &json!({"count": "250", "next": "https://x/accounts/?page=2"}),
        100,
        &mut state,
    );
    assert_eq!(next, NextPage::with_url("https://x/accounts/?page=2"));
    assert!(next.is_continue());
    assert_eq!(state.total_count, 250);
    assert_eq!(state.offset, 100);

    let done = paginator.process_response(&json!({"count": 250, "next": ""}), 50, &mut state);
    assert!(done.is_done());
    assert_eq!(state.total_fetched, 150);

    let missing = paginator.process_response(&json!({"count": 250}), 0, &mut state);
    assert!(missing.is_done());
}

#[test]
fn test_page_to_record_caps_at_total() {
    let page = Page {
        number: 3,
        records: vec![],
        total_count: 250,
        offset: 200,
    };
    assert_eq!(page.to_record(100), 250);

    let unknown = Page {
        total_count: 0,
        ..page
    };
    assert_eq!(unknown.to_record(100), 300);
}

// ============================================================================
// Pager Tests
// ============================================================================

#[tokio::test]
async fn test_pager_follows_next_without_params() {
    let accessor = Scripted::new(vec![
        Ok(json!({"count": 3, "next": "https://api.test/v1/accounts/?page=2", "results": [{"id": 1}, {"id": 2}]})),
        Ok(json!({"count": 3, "next": null, "results": [{"id": 3}]})),
    ]);
    let mut pager = Pager::new("accounts", "https://api.test/v1", "accounts", params(), Some("results"), 2);

    let first = pager.next_page(&accessor).await.unwrap().unwrap();
    assert_eq!(first.number, 1);
    assert_eq!(first.records.len(), 2);
    assert_eq!(first.total_count, 3);
    assert_eq!(first.offset, 0);

    let second = pager.next_page(&accessor).await.unwrap().unwrap();
    assert_eq!(second.number, 2);
    assert_eq!(second.records, vec![json!({"id": 3})]);
    assert_eq!(second.offset, 2);

    assert!(pager.next_page(&accessor).await.unwrap().is_none());

    let requests = accessor.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url, "https://api.test/v1/accounts");
    assert_eq!(requests[0].query, params());
    assert_eq!(requests[1].url, "https://api.test/v1/accounts/?page=2");
    assert!(requests[1].query.is_empty());
}

#[tokio::test]
async fn test_pager_resolves_query_only_next() {
    let accessor = Scripted::new(vec![
        Ok(json!({"count": 3, "next": "?page=2", "results": [{"id": 1}, {"id": 2}]})),
        Ok(json!({"count": 3, "next": "?page=3", "results": [{"id": 3}]})),
        Ok(json!({"count": 3, "next": null, "results": [{"id": 4}]})),
    ]);
    let mut pager = Pager::new("accounts", "https://api.test/acme/api/v1.0", "accounts/", params(), Some("results"), 2);

    while pager.next_page(&accessor).await.unwrap().is_some() {}
    assert!(pager.state().done);

    let urls: Vec<String> = accessor.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            "https://api.test/acme/api/v1.0/accounts/",
            "https://api.test/acme/api/v1.0/accounts/?page=2",
            "https://api.test/acme/api/v1.0/accounts/?page=3",
        ]
    );
}

#[tokio::test]
async fn test_pager_empty_page_ends_window() {
    for body in [json!({"count": 0, "next": null, "results": []}), json!({}), Value::Null] {
        let accessor = Scripted::new(vec![Ok(body)]);
        let mut pager = Pager::new("accounts", "https://api.test", "accounts", Vec::new(), Some("results"), 100);

        assert!(pager.next_page(&accessor).await.unwrap().is_none());
        assert!(pager.state().done);
        assert!(pager.next_page(&accessor).await.unwrap().is_none());
        assert_eq!(accessor.requests().len(), 1);
    }
}

#[tokio::test]
async fn test_pager_without_data_key_uses_payload() {
    let accessor = Scripted::new(vec![Ok(json!([{"code": "USD"}, {"code": "EUR"}]))]);
    let mut pager = Pager::new("currencies", "https://api.test", "currencies", Vec::new(), None, 100);

    let page = pager.next_page(&accessor).await.unwrap().unwrap();
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.total_count, 0);
    assert!(pager.next_page(&accessor).await.unwrap().is_none());
}

#[tokio::test]
async fn test_pager_single_object_under_data_key() {
    let accessor = Scripted::new(vec![Ok(json!({"results": {"id": 9}}))]);
    let mut pager = Pager::new("settings", "https://api.test", "settings", Vec::new(), Some("results"), 100);

    let page = pager.next_page(&accessor).await.unwrap().unwrap();
    assert_eq!(page.records, vec![json!({"id": 9})]);
}

#[tokio::test]
async fn test_pager_propagates_errors() {
    let accessor = Scripted::new(vec![Err(Error::http_status(500, "boom"))]);
    let mut pager = Pager::new("accounts", "https://api.test", "accounts", Vec::new(), Some("results"), 100);

    let err = pager.next_page(&accessor).await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
    assert_eq!(accessor.requests().len(), 1);
}

#[tokio::test]
async fn test_pager_against_http_server() {
    let mock_server = MockServer::start().await;
    let base = format!("{}/acme/api/v1.0", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/acme/api/v1.0/invoices/"))
        .and(query_param("modified__gte", "2023-01-01T00:00:00.000000Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": format!("{}/acme/api/v1.0/invoices/?page=2", mock_server.uri()),
            "results": [{"id": 1}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/acme/api/v1.0/invoices/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": null,
            "results": [{"id": 2}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(HttpClientConfig::builder().no_rate_limit().build()).unwrap();
    let mut pager = Pager::new(
        "invoices",
        &base,
        "invoices/",
        vec![(
            "modified__gte".to_string(),
            "2023-01-01T00:00:00.000000Z".to_string(),
        )],
        Some("results"),
        100,
    );

    let mut ids = Vec::new();
    while let Some(page) = pager.next_page(&client).await.unwrap() {
        ids.extend(page.records.into_iter().map(|r| r["id"].clone()));
    }
    assert_eq!(ids, vec![json!(1), json!(2)]);
}
