use std::sync::Arc;

use harmatch_application::{AppState, AppStore, SnapshotStorage};
use harmatch_domain::{JobId, OverrideUpdate, ParamsTab, PersistedSnapshot, SNAPSHOT_VERSION};
use harmatch_infrastructure::{FileSnapshotStorage, MemorySnapshotStorage};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn job_id(raw: &str) -> JobId {
    JobId::new(raw).expect("valid job id")
}

fn storage_in(dir: &TempDir) -> FileSnapshotStorage {
    FileSnapshotStorage::new(dir.path().join("nested").join("state.json"))
}

#[tokio::test]
async fn missing_file_loads_as_none() {
    let dir = TempDir::new().expect("temp dir");
    let storage = storage_in(&dir);

    assert_eq!(storage.load().await.expect("load works"), None);
}

#[tokio::test]
async fn store_state_survives_restart_through_file() {
    let dir = TempDir::new().expect("temp dir");

    let first = AppStore::new(Arc::new(storage_in(&dir)));
    first.hydrate().await;
    first.set_job_id(job_id("j1"), "capture.har", 12);
    first.set_prompt("login call");
    first.update_overrides(OverrideUpdate::Body(Some("{}".to_string())));
    first.set_params_tab(ParamsTab::Body);
    let before = first.state();
    drop(first);

    let second = AppStore::new(Arc::new(storage_in(&dir)));
    second.hydrate().await;
    let after = second.state();

    assert_eq!(after.job_id, Some(job_id("j1")));
    assert_eq!(after.prompt, "login call");
    assert_eq!(after.overrides, before.overrides);
    assert_eq!(after.ui.params_tab, ParamsTab::Body);
}

#[tokio::test]
async fn file_is_stable_pretty_json() {
    let dir = TempDir::new().expect("temp dir");
    let storage = storage_in(&dir);
    let store = AppStore::new(Arc::new(storage.clone()));
    store.hydrate().await;
    store.set_prompt("weather");

    let text = std::fs::read_to_string(storage.path()).expect("file written");
    assert!(text.ends_with("}\n"));
    assert!(text.contains("\n  \"prompt\": \"weather\""));
    assert!(text.contains(&format!("\"version\": {SNAPSHOT_VERSION}")));
}

#[tokio::test]
async fn corrupt_file_does_not_block_hydration() {
    let dir = TempDir::new().expect("temp dir");
    let storage = storage_in(&dir);
    std::fs::create_dir_all(dir.path().join("nested")).expect("mkdir");
    std::fs::write(storage.path(), b"{ not json").expect("write");

    assert!(storage.load().await.is_err());

    let store = AppStore::new(Arc::new(storage));
    store.hydrate().await;
    assert!(store.is_hydrated());
    assert_eq!(store.state().prompt, "");
}

#[tokio::test]
async fn clear_removes_file_and_tolerates_absence() {
    let dir = TempDir::new().expect("temp dir");
    let storage = storage_in(&dir);
    let snapshot = PersistedSnapshot {
        prompt: "x".to_string(),
        ..AppState::default().snapshot()
    };
    storage.save(&snapshot).expect("save works");
    assert_eq!(storage.load().await.expect("load"), Some(snapshot));

    storage.clear().expect("clear works");
    assert!(!storage.path().exists());
    storage.clear().expect("clearing twice is fine");
}

#[tokio::test]
async fn memory_storage_round_trips_through_store() {
    let storage = Arc::new(MemorySnapshotStorage::new());
    let store = AppStore::new(storage.clone());
    store.hydrate().await;
    store.set_job_id(job_id("j2"), "other.har", 3);

    let stored = storage.stored().expect("written through");
    assert_eq!(stored.job_id, Some(job_id("j2")));
    assert_eq!(stored.total_requests, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn writes_from_worker_tasks_reach_the_file() {
    let dir = TempDir::new().expect("temp dir");
    let storage = storage_in(&dir);
    let store = AppStore::new(Arc::new(storage.clone()));
    store.hydrate().await;

    let writer = store.clone();
    tokio::spawn(async move { writer.set_prompt("from a task") })
        .await
        .expect("task completes");
    let stored = storage.load().await.expect("load").map(|s| s.prompt);
    assert_eq!(stored.as_deref(), Some("from a task"));

    let resetter = store.clone();
    tokio::spawn(async move { resetter.reset_state() })
        .await
        .expect("task completes");
    assert!(!storage.path().exists());
}
