//! Integration tests using mock HTTP server
//!
//! Tests the full flow: YAML stream definitions → paged HTTP requests →
//! Singer messages on a JSON lines sink, with state persisted to disk.

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use saasoptics_tap::catalog::skeleton;
use saasoptics_tap::engine::{SyncConfig, SyncEngine};
use saasoptics_tap::http::{HttpClient, HttpClientConfig};
use saasoptics_tap::output::JsonLinesSink;
use saasoptics_tap::state::{Bookmark, State, StateManager};
use saasoptics_tap::streams::{load_streams_from_str, StreamTree};
use saasoptics_tap::{orchestrator, Error};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STREAMS: &str = r#"
streams:
  - name: accounts
    key_properties: [id]
    replication_method: INCREMENTAL
    replication_keys: [modified]
    bookmark_type: datetime
    bookmark_query_field_from: modified__gte
    bookmark_query_field_to: modified__lte
    params:
      ordering: modified
    children:
      - name: invoices
        path: "accounts/{{ parent_id }}/invoices"
        parent: account
        key_properties: [id]
        replication_method: INCREMENTAL
        replication_keys: [modified]
        bookmark_type: datetime
        bookmark_query_field_from: modified__gte

  - name: revenue_entries
    key_properties: [id]
    replication_method: INCREMENTAL
    replication_keys: [id]
    bookmark_type: integer
    bookmark_query_field_from: id__gte
    params:
      ordering: id
"#;

const TOKEN: &str = "secret-token";

fn dt(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn tree() -> StreamTree {
    load_streams_from_str(STREAMS).unwrap()
}

fn client() -> HttpClient {
    HttpClient::with_config(
        HttpClientConfig::builder()
            .no_rate_limit()
            .max_retries(0)
            .token(TOKEN)
            .build(),
    )
    .unwrap()
}

type TestEngine = SyncEngine<HttpClient, JsonLinesSink<Vec<u8>>>;

fn engine(server: &MockServer, state_path: &Path) -> TestEngine {
    SyncEngine::new(
        client(),
        JsonLinesSink::new(Vec::new()),
        StateManager::from_file(state_path).unwrap(),
        skeleton(&tree()),
        SyncConfig::new(server.uri(), dt(2023, 1, 1)),
    )
    .with_clock(Arc::new(|| dt(2023, 1, 20)))
}

fn messages(engine: TestEngine) -> Vec<Value> {
    let (sink, _) = engine.into_parts();
    String::from_utf8(sink.into_inner())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn record_ids(messages: &[Value], stream: &str) -> Vec<i64> {
    messages
        .iter()
        .filter(|m| m["type"] == "RECORD" && m["stream"] == stream)
        .map(|m| m["record"]["id"].as_i64().unwrap())
        .collect()
}

fn read_state(path: &Path) -> State {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

async fn mount_accounts(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(header("Authorization", format!("Token {TOKEN}").as_str()))
        .and(query_param("ordering", "modified"))
        .and(query_param("modified__gte", "2023-01-01T00:00:00.000000Z"))
        .and(query_param("modified__lte", "2023-01-20T00:00:00.000000Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3,
            "next": format!("{}/accounts?page=2", server.uri()),
            "results": [
                {"id": 1, "name": "Acme", "modified": "2023-01-02T00:00:00Z"},
                {"id": 2, "name": "Globex", "modified": "2023-01-05T00:00:00Z"}
            ]
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3,
            "next": null,
            "results": [
                {"id": 3, "name": "Initech", "modified": "2023-01-10T00:00:00Z"}
            ]
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_invoices(server: &MockServer, account: i64, results: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/accounts/{account}/invoices")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": results.as_array().map_or(0, Vec::len),
            "next": null,
            "results": results
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_revenue_entries(server: &MockServer, min: &str, ids: &[i64]) {
    let results: Vec<Value> = ids.iter().map(|id| json!({"id": id, "amount": "10.00"})).collect();
    Mock::given(method("GET"))
        .and(path("/revenue_entries"))
        .and(query_param("ordering", "id"))
        .and(query_param("id__gte", min))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": results.len(),
            "next": null,
            "results": results
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_parent_tree(server: &MockServer) {
    mount_accounts(server).await;
    mount_invoices(
        server,
        1,
        json!([{"id": 10, "modified": "2023-01-03T00:00:00Z"}]),
    )
    .await;
    mount_invoices(
        server,
        2,
        json!([{"id": 20, "modified": "2023-01-04T00:00:00Z"}]),
    )
    .await;
    mount_invoices(server, 3, json!([])).await;
}

// ============================================================================
// Full Sync
// ============================================================================

#[tokio::test]
async fn test_full_sync_to_json_lines() {
    let server = MockServer::start().await;
    mount_parent_tree(&server).await;
    mount_revenue_entries(&server, "0", &[1, 2, 3]).await;

    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");

    let mut engine = engine(&server, &state_path);
    let summary = orchestrator::sync_all(&mut engine, &tree()).await.unwrap();
    assert_eq!(summary.stream_names(), vec!["accounts", "revenue_entries"]);
    assert_eq!(summary.streams[0].total_records, 3);

    let output = messages(engine);
    assert_eq!(record_ids(&output, "accounts"), vec![1, 2, 3]);
    assert_eq!(record_ids(&output, "invoices"), vec![10, 20]);
    assert_eq!(record_ids(&output, "revenue_entries"), vec![1, 2, 3]);

    let invoice_parents: Vec<Value> = output
        .iter()
        .filter(|m| m["type"] == "RECORD" && m["stream"] == "invoices")
        .map(|m| m["record"]["account_id"].clone())
        .collect();
    assert_eq!(invoice_parents, vec![json!(1), json!(2)]);

    // Every record follows a schema for its stream
    let mut schemas = Vec::new();
    for message in &output {
        match message["type"].as_str().unwrap() {
            "SCHEMA" => schemas.push(message["stream"].as_str().unwrap().to_string()),
            "RECORD" => {
                let stream = message["stream"].as_str().unwrap();
                assert!(schemas.iter().any(|s| s == stream), "{stream} before its schema");
                assert_eq!(message["time_extracted"], "2023-01-20T00:00:00.000000Z");
            }
            "STATE" => {}
            other => panic!("unexpected message type {other}"),
        }
    }

    let state = read_state(&state_path);
    assert_eq!(
        state.bookmark("accounts"),
        Some(&Bookmark::Datetime(dt(2023, 1, 10)))
    );
    assert_eq!(
        state.bookmark("invoices"),
        Some(&Bookmark::Datetime(dt(2023, 1, 4)))
    );
    assert_eq!(state.bookmark("revenue_entries"), Some(&Bookmark::Integer(3)));
    assert_eq!(state.currently_syncing, None);

    let last_state = output.iter().rev().find(|m| m["type"] == "STATE").unwrap();
    assert_eq!(last_state["value"]["bookmarks"]["revenue_entries"], 3);
}

// ============================================================================
// Interrupt and Resume
// ============================================================================

#[tokio::test]
async fn test_interrupted_sync_resumes_from_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");

    // First run: accounts completes, revenue_entries fails
    let server = MockServer::start().await;
    mount_parent_tree(&server).await;
    Mock::given(method("GET"))
        .and(path("/revenue_entries"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let mut first = engine(&server, &state_path);
    let err = orchestrator::sync_all(&mut first, &tree()).await.unwrap_err();
    assert!(matches!(err, Error::Sync { .. }), "unexpected error: {err}");

    let interrupted = read_state(&state_path);
    assert_eq!(interrupted.currently_syncing.as_deref(), Some("revenue_entries"));
    assert_eq!(
        interrupted.bookmark("accounts"),
        Some(&Bookmark::Datetime(dt(2023, 1, 10)))
    );

    // Second run: accounts is skipped, revenue_entries starts from its default
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    mount_revenue_entries(&server, "0", &[7, 8]).await;

    let mut second = engine(&server, &state_path);
    let summary = orchestrator::sync_all(&mut second, &tree()).await.unwrap();
    assert_eq!(summary.stream_names(), vec!["revenue_entries"]);

    let output = messages(second);
    assert!(record_ids(&output, "accounts").is_empty());
    assert_eq!(record_ids(&output, "revenue_entries"), vec![7, 8]);

    let resumed = read_state(&state_path);
    assert_eq!(resumed.currently_syncing, None);
    assert_eq!(
        resumed.bookmark("accounts"),
        Some(&Bookmark::Datetime(dt(2023, 1, 10)))
    );
    assert_eq!(resumed.bookmark("revenue_entries"), Some(&Bookmark::Integer(8)));
}

#[tokio::test]
async fn test_second_run_continues_from_bookmarks() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    std::fs::write(
        &state_path,
        r#"{"bookmarks": {"accounts": "2023-01-20T00:00:00.000000Z", "revenue_entries": 3}}"#,
    )
    .unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    mount_revenue_entries(&server, "3", &[3, 4]).await;

    let mut engine = engine(&server, &state_path);
    orchestrator::sync_all(&mut engine, &tree()).await.unwrap();

    let output = messages(engine);
    // Records at the bookmark are re-emitted
    assert_eq!(record_ids(&output, "revenue_entries"), vec![3, 4]);
    assert_eq!(
        read_state(&state_path).bookmark("revenue_entries"),
        Some(&Bookmark::Integer(4))
    );
}
