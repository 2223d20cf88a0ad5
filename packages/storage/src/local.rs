//! # Local Cache
//!
//! Synchronous, device-local store holding the full `HistoryState` per user.
//! Written on every state transition, so writes must stay cheap.

use crate::{HistoryState, StorageError, StorageResult, UserId};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Prefix of the per-user cache record name
pub const LOCAL_KEY_PREFIX: &str = "editorHistory_";

/// Record name for a user (`editorHistory_<id>`)
pub fn local_key(user: &UserId) -> StorageResult<String> {
    Ok(format!("{}{}", LOCAL_KEY_PREFIX, user.storage_key()?))
}

/// Device-local history store
pub trait LocalCache: Send + Sync {
    /// Load the stored history, `None` if nothing was saved yet
    fn load(&self, user: &UserId) -> StorageResult<Option<HistoryState>>;

    /// Overwrite the stored history
    fn save(&self, user: &UserId, state: &HistoryState) -> StorageResult<()>;
}

/// One JSON file per user inside a cache directory
#[derive(Debug, Clone)]
pub struct FileLocalCache {
    dir: PathBuf,
}

impl FileLocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for a user
    pub fn record_path(&self, user: &UserId) -> StorageResult<PathBuf> {
        Ok(self.dir.join(format!("{}.json", local_key(user)?)))
    }
}

impl LocalCache for FileLocalCache {
    fn load(&self, user: &UserId) -> StorageResult<Option<HistoryState>> {
        let path = self.record_path(user)?;

        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::from_io(e)),
        };

        let state = serde_json::from_str(&json)?;
        Ok(Some(state))
    }

    fn save(&self, user: &UserId, state: &HistoryState) -> StorageResult<()> {
        let path = self.record_path(user)?;
        let json = serde_json::to_string(state)?;

        fs::create_dir_all(&self.dir).map_err(StorageError::from_io)?;

        // Write-then-rename so a crash never leaves a truncated record
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(StorageError::from_io)?;
        fs::rename(&tmp, &path).map_err(StorageError::from_io)?;

        Ok(())
    }
}

/// In-process cache for tests and ephemeral sessions
///
/// Can be switched off to simulate disabled or full storage.
#[derive(Debug)]
pub struct MemoryLocalCache {
    records: Mutex<HashMap<UserId, HistoryState>>,
    available: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryLocalCache {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            saves: AtomicUsize::new(0),
        }
    }

    /// Seed a record
    pub fn with_record(self, user: impl Into<UserId>, state: HistoryState) -> Self {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.into(), state);
        self
    }

    /// Current record for a user, bypassing availability
    pub fn record(&self, user: &UserId) -> Option<HistoryState> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user)
            .cloned()
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("local storage disabled".to_string()))
        }
    }
}

impl Default for MemoryLocalCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalCache for MemoryLocalCache {
    fn load(&self, user: &UserId) -> StorageResult<Option<HistoryState>> {
        self.check_available()?;
        Ok(self.record(user))
    }

    fn save(&self, user: &UserId, state: &HistoryState) -> StorageResult<()> {
        self.check_available()?;
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.clone(), state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
