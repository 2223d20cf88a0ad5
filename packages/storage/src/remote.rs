//! # Remote Store
//!
//! Asynchronous, higher-latency store holding only the current content of
//! each user's document. Read once at session start, written after a quiet
//! period in typing.

use crate::{Snapshot, StorageError, StorageResult, UserId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Authoritative copy of each user's current content
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Load the current content, `None` if nothing was saved yet
    async fn load(&self, user: &UserId) -> StorageResult<Option<Snapshot>>;

    /// Replace the current content
    async fn save(&self, user: &UserId, content: &str) -> StorageResult<()>;
}

/// Directory-backed store laid out as `users/<id>/editorContent`
#[derive(Debug, Clone)]
pub struct FileRemoteStore {
    root: PathBuf,
}

impl FileRemoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the content file for a user
    pub fn content_path(&self, user: &UserId) -> StorageResult<PathBuf> {
        Ok(self
            .root
            .join("users")
            .join(user.storage_key()?)
            .join("editorContent"))
    }
}

#[async_trait]
impl RemoteStore for FileRemoteStore {
    async fn load(&self, user: &UserId) -> StorageResult<Option<Snapshot>> {
        let path = self.content_path(user)?;

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn save(&self, user: &UserId, content: &str) -> StorageResult<()> {
        let path = self.content_path(user)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;

        Ok(())
    }
}

/// In-process remote for tests and offline sessions
///
/// Records every acknowledged write and can inject latency and failures.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    values: Mutex<HashMap<UserId, Snapshot>>,
    writes: Mutex<Vec<(UserId, Snapshot)>>,
    attempts: AtomicUsize,
    fail_next_saves: AtomicUsize,
    fail_next_loads: AtomicUsize,
    latency: Mutex<Option<Duration>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without recording a write
    pub fn with_value(self, user: impl Into<UserId>, content: impl Into<Snapshot>) -> Self {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.into(), content.into());
        self
    }

    /// Delay every load and save by `latency`
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(Some(latency));
        self
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Make the next `n` saves fail with `StorageError::Remote`
    pub fn fail_next_saves(&self, n: usize) {
        self.fail_next_saves.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` loads fail with `StorageError::Remote`
    pub fn fail_next_loads(&self, n: usize) {
        self.fail_next_loads.store(n, Ordering::SeqCst);
    }

    pub fn value(&self, user: &UserId) -> Option<Snapshot> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user)
            .cloned()
    }

    /// Acknowledged writes for a user, in completion order
    pub fn writes(&self, user: &UserId) -> Vec<Snapshot> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(u, _)| u == user)
            .map(|(_, content)| content.clone())
            .collect()
    }

    /// Acknowledged writes across all users
    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Save calls including failed ones
    pub fn save_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn load(&self, user: &UserId) -> StorageResult<Option<Snapshot>> {
        self.delay().await;

        if Self::take_failure(&self.fail_next_loads) {
            return Err(StorageError::Remote("injected load failure".to_string()));
        }
        Ok(self.value(user))
    }

    async fn save(&self, user: &UserId, content: &str) -> StorageResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        if Self::take_failure(&self.fail_next_saves) {
            return Err(StorageError::Remote("injected failure".to_string()));
        }

        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.clone(), content.to_string());
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((user.clone(), content.to_string()));
        Ok(())
    }
}
