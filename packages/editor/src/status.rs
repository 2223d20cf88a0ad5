//! Observable session state

use chrono::{DateTime, Utc};
use quill_storage::Snapshot;
use std::fmt;

/// Where the session's initial state came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileSource {
    /// Full history from the local cache
    Local,
    /// Content only, from the remote store
    Remote,
    /// Neither store had a record
    Empty,
}

impl fmt::Display for ReconcileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReconcileSource::Local => "local",
            ReconcileSource::Remote => "remote",
            ReconcileSource::Empty => "empty",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCacheState {
    Active,
    /// Cache unavailable; history lives in memory until the session ends
    MemoryOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSyncState {
    /// Nothing written this session
    Idle,
    /// Debounce timer armed
    Pending,
    /// Write in flight
    Saving,
    Synced { at: DateTime<Utc> },
    Failed { error: String, at: DateTime<Utc> },
}

/// Snapshot of a session for UI consumers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub ready: bool,
    pub source: Option<ReconcileSource>,
    pub content: Snapshot,
    pub can_undo: bool,
    pub can_redo: bool,
    pub local: LocalCacheState,
    pub remote: RemoteSyncState,
}

impl SessionStatus {
    /// Status before reconciliation completes
    pub fn loading() -> Self {
        Self {
            ready: false,
            source: None,
            content: Snapshot::new(),
            can_undo: false,
            can_redo: false,
            local: LocalCacheState::Active,
            remote: RemoteSyncState::Idle,
        }
    }
}

/// Result of one edit command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    /// False when the edit was a no-op
    pub changed: bool,
    pub content: Snapshot,
    pub can_undo: bool,
    pub can_redo: bool,
}
