//! Integration tests for editor sessions against in-memory stores

use quill_editor::{
    EditorError, HistoryState, LocalCacheState, ReconcileSource, RemoteSyncState, SyncConfig,
    SyncController, UserId,
};
use quill_storage::{MemoryLocalCache, MemoryRemoteStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn stores() -> (Arc<MemoryLocalCache>, Arc<MemoryRemoteStore>) {
    (Arc::new(MemoryLocalCache::new()), Arc::new(MemoryRemoteStore::new()))
}

fn user() -> UserId {
    UserId::new("u1")
}

#[tokio::test(start_paused = true)]
async fn test_undo_redo_scenario() {
    let (local, remote) = stores();
    let session = SyncController::new("u1", local.clone(), remote.clone(), SyncConfig::default()).spawn();

    session.set_content("A").await.unwrap();
    session.set_content("AB").await.unwrap();

    assert_eq!(session.undo().await.unwrap().content, "A");
    assert_eq!(session.undo().await.unwrap().content, "");
    assert_eq!(session.redo().await.unwrap().content, "A");
    assert_eq!(session.redo().await.unwrap().content, "AB");

    let outcome = session.redo().await.unwrap();
    assert!(!outcome.changed);
    assert_eq!(outcome.content, "AB");
    assert!(outcome.can_undo);
    assert!(!outcome.can_redo);

    // Every changing transition hit the local cache, the no-op did not
    assert_eq!(local.save_count(), 6);
    assert_eq!(local.record(&user()).unwrap().present, "AB");
}

#[tokio::test(start_paused = true)]
async fn test_local_cache_wins_reconciliation() {
    let stored = HistoryState {
        past: vec!["A".to_string()],
        present: "AB".to_string(),
        future: vec!["ABC".to_string()],
    };
    let local = Arc::new(MemoryLocalCache::new().with_record("u1", stored.clone()));
    let remote = Arc::new(MemoryRemoteStore::new().with_value("u1", "Z"));

    let session = SyncController::new("u1", local.clone(), remote.clone(), SyncConfig::default()).spawn();

    assert_eq!(session.wait_ready().await.unwrap(), ReconcileSource::Local);
    assert_eq!(session.snapshot().await.unwrap(), stored);

    let status = session.status();
    assert_eq!(status.content, "AB");
    assert!(status.can_undo);
    assert!(status.can_redo);

    // Full history survives: redo reaches the cached future
    assert_eq!(session.redo().await.unwrap().content, "ABC");
}

#[tokio::test(start_paused = true)]
async fn test_local_state_pushed_to_stale_remote() {
    let local = Arc::new(MemoryLocalCache::new().with_record("u1", HistoryState::new("AB")));
    let remote = Arc::new(MemoryRemoteStore::new().with_value("u1", "Z"));

    let session = SyncController::new("u1", local.clone(), remote.clone(), SyncConfig::default()).spawn();
    session.wait_ready().await.unwrap();

    sleep(Duration::from_millis(600)).await;
    assert_eq!(remote.writes(&user()), vec!["AB"]);
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_edits_writes_remote_once() {
    let (local, remote) = stores();
    let session = SyncController::new("u1", local.clone(), remote.clone(), SyncConfig::default()).spawn();
    session.wait_ready().await.unwrap();

    session.set_content("A").await.unwrap();
    sleep(Duration::from_millis(100)).await;
    session.set_content("AB").await.unwrap();
    sleep(Duration::from_millis(100)).await;
    session.set_content("ABC").await.unwrap();

    // Still inside the quiet period of the last edit
    sleep(Duration::from_millis(400)).await;
    assert_eq!(remote.save_attempts(), 0);
    assert_eq!(session.status().remote, RemoteSyncState::Pending);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(remote.writes(&user()), vec!["ABC"]);
    assert_eq!(local.save_count(), 3);
    assert!(matches!(session.status().remote, RemoteSyncState::Synced { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_remote_failure_recovers_on_next_edit() {
    let (local, remote) = stores();
    let session = SyncController::new("u1", local.clone(), remote.clone(), SyncConfig::default()).spawn();

    remote.fail_next_saves(1);
    session.set_content("A").await.unwrap();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(remote.save_attempts(), 1);
    assert_eq!(remote.value(&user()), None);
    assert!(matches!(session.status().remote, RemoteSyncState::Failed { .. }));

    // No retry loop on its own
    sleep(Duration::from_secs(10)).await;
    assert_eq!(remote.save_attempts(), 1);

    let outcome = session.set_content("AB").await.unwrap();
    assert!(outcome.changed);
    assert_eq!(local.record(&user()).unwrap().present, "AB");
    assert_eq!(session.status().remote, RemoteSyncState::Pending);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(remote.writes(&user()), vec!["AB"]);
    assert_eq!(remote.save_attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_edits_before_reconciliation_are_queued() {
    let local = Arc::new(MemoryLocalCache::new());
    let remote = Arc::new(
        MemoryRemoteStore::new()
            .with_value("u1", "Z")
            .with_latency(Duration::from_millis(300)),
    );

    let session = SyncController::new("u1", local.clone(), remote.clone(), SyncConfig::default()).spawn();
    assert!(!session.status().ready);

    // Issued while the remote load is still in flight
    let outcome = session.set_content("Z!").await.unwrap();

    assert!(outcome.changed);
    assert!(outcome.can_undo);
    assert_eq!(
        session.snapshot().await.unwrap(),
        HistoryState {
            past: vec!["Z".to_string()],
            present: "Z!".to_string(),
            future: vec![],
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_remote_never_regresses() {
    let local = Arc::new(MemoryLocalCache::new());
    let remote = Arc::new(MemoryRemoteStore::new());
    let session = SyncController::new("u1", local.clone(), remote.clone(), SyncConfig::default()).spawn();
    session.wait_ready().await.unwrap();
    remote.set_latency(Some(Duration::from_secs(2)));

    session.set_content("v1").await.unwrap();
    // Quiet period ends at 500ms; the v1 write is in flight until 2.5s
    sleep(Duration::from_millis(700)).await;
    assert_eq!(session.status().remote, RemoteSyncState::Saving);

    session.set_content("v2").await.unwrap();
    sleep(Duration::from_millis(600)).await;
    session.set_content("v3").await.unwrap();

    sleep(Duration::from_secs(10)).await;

    let writes = remote.writes(&user());
    assert_eq!(writes.first().map(String::as_str), Some("v1"));
    assert_eq!(writes.last().map(String::as_str), Some("v3"));
    assert_eq!(remote.value(&user()).as_deref(), Some("v3"));
    assert!(!writes.windows(2).any(|w| w[0] > w[1]), "writes went backwards: {:?}", writes);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_local_cache_degrades_to_memory() {
    let (local, remote) = stores();
    let session = SyncController::new("u1", local.clone(), remote.clone(), SyncConfig::default()).spawn();

    session.set_content("A").await.unwrap();
    local.set_available(false);

    let outcome = session.set_content("AB").await.unwrap();
    assert_eq!(outcome.content, "AB");
    assert_eq!(session.status().local, LocalCacheState::MemoryOnly);

    // Storage comes back, but the session stays memory-only
    local.set_available(true);
    session.set_content("ABC").await.unwrap();
    assert_eq!(local.save_count(), 1);
    assert_eq!(local.record(&user()).unwrap().present, "A");

    // Remote sync is unaffected
    sleep(Duration::from_secs(1)).await;
    assert_eq!(remote.value(&user()).as_deref(), Some("ABC"));
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_local_cache_at_startup() {
    let local = Arc::new(MemoryLocalCache::new());
    local.set_available(false);
    let remote = Arc::new(MemoryRemoteStore::new().with_value("u1", "Z"));

    let session = SyncController::new("u1", local.clone(), remote.clone(), SyncConfig::default()).spawn();

    assert_eq!(session.wait_ready().await.unwrap(), ReconcileSource::Remote);
    assert_eq!(session.status().local, LocalCacheState::MemoryOnly);
    assert_eq!(session.set_content("Z1").await.unwrap().content, "Z1");
}

#[tokio::test(start_paused = true)]
async fn test_max_history_config() {
    let (local, remote) = stores();
    let config = SyncConfig::default().with_max_history(2);
    let session = SyncController::new("u1", local.clone(), remote.clone(), config).spawn();

    for content in ["a", "b", "c", "d"] {
        session.set_content(content).await.unwrap();
    }

    let state = session.snapshot().await.unwrap();
    assert_eq!(state.past, vec!["b", "c"]);
    assert_eq!(local.record(&user()).unwrap(), state);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_handles_end_session() {
    let (local, remote) = stores();
    let session = SyncController::new("u1", local.clone(), remote.clone(), SyncConfig::default()).spawn();
    let mut status = session.subscribe();

    session.set_content("A").await.unwrap();
    drop(session);

    // Task exits and drops the status sender
    while status.changed().await.is_ok() {}
    sleep(Duration::from_secs(1)).await;

    // Pending write abandoned; local cache is still current
    assert_eq!(remote.save_attempts(), 0);
    assert_eq!(local.record(&user()).unwrap().present, "A");
}

#[tokio::test(start_paused = true)]
async fn test_dropped_handles_let_started_write_finish() {
    let (local, remote) = stores();
    let session = SyncController::new("u1", local.clone(), remote.clone(), SyncConfig::default()).spawn();
    session.wait_ready().await.unwrap();
    remote.set_latency(Some(Duration::from_secs(2)));
    let mut status = session.subscribe();

    session.set_content("final text").await.unwrap();
    // Quiet period ends at 500ms; the write lands at 2.5s
    sleep(Duration::from_millis(700)).await;
    assert_eq!(session.status().remote, RemoteSyncState::Saving);
    assert_eq!(remote.save_attempts(), 1);

    drop(session);
    while status.changed().await.is_ok() {}

    assert_eq!(remote.value(&user()).as_deref(), Some("final text"));
    assert!(matches!(status.borrow().remote, RemoteSyncState::Synced { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_remote_load_failure_keeps_remote_untouched() {
    let local = Arc::new(MemoryLocalCache::new());
    let remote = Arc::new(MemoryRemoteStore::new().with_value("u1", "my 40-page thesis"));
    remote.fail_next_loads(1);

    let session = SyncController::new("u1", local.clone(), remote.clone(), SyncConfig::default()).spawn();
    assert_eq!(session.wait_ready().await.unwrap(), ReconcileSource::Empty);
    assert!(matches!(session.status().remote, RemoteSyncState::Failed { .. }));

    // Edits still reach the local cache
    session.set_content("x").await.unwrap();
    assert_eq!(local.record(&user()).unwrap().present, "x");

    sleep(Duration::from_secs(1)).await;
    let state = session.close().await.unwrap();
    assert_eq!(state.present, "x");

    assert_eq!(remote.save_attempts(), 0);
    assert_eq!(remote.value(&user()).as_deref(), Some("my 40-page thesis"));
}

#[tokio::test(start_paused = true)]
async fn test_remote_load_failure_skips_startup_push() {
    let local = Arc::new(MemoryLocalCache::new().with_record("u1", HistoryState::new("AB")));
    let remote = Arc::new(MemoryRemoteStore::new().with_value("u1", "Z"));
    remote.fail_next_loads(1);

    let session = SyncController::new("u1", local.clone(), remote.clone(), SyncConfig::default()).spawn();
    assert_eq!(session.wait_ready().await.unwrap(), ReconcileSource::Local);

    sleep(Duration::from_secs(1)).await;
    session.close().await.unwrap();
    assert_eq!(remote.save_attempts(), 0);
    assert_eq!(remote.value(&user()).as_deref(), Some("Z"));
}

#[tokio::test(start_paused = true)]
async fn test_close_returns_final_history() {
    let (local, remote) = stores();
    let session = SyncController::new("u1", local.clone(), remote.clone(), SyncConfig::default()).spawn();
    let other = session.clone();

    session.set_content("A").await.unwrap();
    other.set_content("AB").await.unwrap();

    let state = session.close().await.unwrap();
    assert_eq!(state.past, vec!["", "A"]);
    assert_eq!(state.present, "AB");
    assert_eq!(remote.writes(&user()), vec!["AB"]);

    assert!(matches!(other.undo().await, Err(EditorError::SessionClosed)));
}
