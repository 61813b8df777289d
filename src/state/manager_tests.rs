//! Tests for StateManager

use super::*;
use chrono::{TimeZone, Utc};
use tempfile::tempdir;

fn datetime(y: i32, m: u32, d: u32) -> Bookmark {
    Bookmark::Datetime(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_state_manager_new() {
    let manager = StateManager::new("/tmp/test-state.json");
    assert!(!manager.is_in_memory());
    assert_eq!(manager.path().to_str().unwrap(), "/tmp/test-state.json");
}

#[test]
fn test_state_manager_in_memory() {
    let manager = StateManager::in_memory();
    assert!(manager.is_in_memory());
    assert!(manager.currently_syncing().is_none());
}

#[test]
fn test_from_json() {
    let manager = StateManager::from_json(
        r#"{"bookmarks": {"revenue_entries": 50}, "currently_syncing": "contracts"}"#,
    )
    .unwrap();
    assert_eq!(
        manager.bookmark("revenue_entries"),
        Some(&Bookmark::Integer(50))
    );
    assert_eq!(manager.currently_syncing(), Some("contracts"));
}

#[test]
fn test_from_json_invalid() {
    assert!(StateManager::from_json("{not json").is_err());
}

// ============================================================================
// Bookmark Tests
// ============================================================================

#[tokio::test]
async fn test_set_bookmark_advances() {
    let mut manager = StateManager::in_memory();

    assert!(manager
        .set_bookmark("accounts", datetime(2023, 1, 1))
        .await
        .unwrap());
    assert!(manager
        .set_bookmark("accounts", datetime(2023, 1, 31))
        .await
        .unwrap());

    assert_eq!(manager.bookmark("accounts"), Some(&datetime(2023, 1, 31)));
}

#[tokio::test]
async fn test_set_bookmark_never_regresses() {
    let mut manager = StateManager::in_memory();

    manager
        .set_bookmark("revenue_entries", Bookmark::Integer(55))
        .await
        .unwrap();
    let changed = manager
        .set_bookmark("revenue_entries", Bookmark::Integer(48))
        .await
        .unwrap();

    assert!(!changed);
    assert_eq!(
        manager.bookmark("revenue_entries"),
        Some(&Bookmark::Integer(55))
    );
}

#[tokio::test]
async fn test_bookmark_or_default() {
    let manager = StateManager::in_memory();
    assert_eq!(
        manager.bookmark_or("accounts", datetime(2020, 1, 1)),
        datetime(2020, 1, 1)
    );
}

// ============================================================================
// Currently Syncing Tests
// ============================================================================

#[tokio::test]
async fn test_currently_syncing_set_and_clear() {
    let mut manager = StateManager::in_memory();

    manager
        .set_currently_syncing(Some("contracts"))
        .await
        .unwrap();
    assert_eq!(manager.currently_syncing(), Some("contracts"));

    manager.set_currently_syncing(None).await.unwrap();
    assert!(manager.currently_syncing().is_none());
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_every_set_is_persisted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut manager = StateManager::new(&path);
    manager
        .set_bookmark("accounts", datetime(2023, 1, 31))
        .await
        .unwrap();

    // Observed on disk without an explicit save
    let on_disk = StateManager::from_file(&path).unwrap();
    assert_eq!(on_disk.bookmark("accounts"), Some(&datetime(2023, 1, 31)));

    manager
        .set_currently_syncing(Some("accounts"))
        .await
        .unwrap();
    let on_disk = StateManager::from_file(&path).unwrap();
    assert_eq!(on_disk.currently_syncing(), Some("accounts"));
}

#[tokio::test]
async fn test_atomic_write_leaves_no_temp_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut manager = StateManager::new(&path);
    manager
        .set_bookmark("revenue_entries", Bookmark::Integer(7))
        .await
        .unwrap();

    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());
}

#[tokio::test]
async fn test_from_file_missing_starts_empty() {
    let dir = tempdir().unwrap();
    let manager = StateManager::from_file(dir.path().join("absent.json")).unwrap();
    assert!(manager.state().bookmarks.is_empty());
}

#[tokio::test]
async fn test_from_file_empty_starts_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "").unwrap();
    let manager = StateManager::from_file(&path).unwrap();
    assert!(manager.state().bookmarks.is_empty());
}

#[tokio::test]
async fn test_persist_failure_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("state.json");

    let mut manager = StateManager::new(&path);
    let result = manager.set_bookmark("accounts", datetime(2023, 1, 1)).await;

    assert!(matches!(result, Err(crate::error::Error::State { .. })));
}

#[tokio::test]
async fn test_clear() {
    let mut manager = StateManager::in_memory();
    manager
        .set_bookmark("accounts", datetime(2023, 1, 1))
        .await
        .unwrap();
    manager.clear().await.unwrap();
    assert!(manager.bookmark("accounts").is_none());
}
