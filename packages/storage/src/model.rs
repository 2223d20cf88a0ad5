//! Persisted data model shared by the stores and the editor.

use crate::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Full document content at one point in time. Opaque to this crate.
pub type Snapshot = String;

/// Identity that owns a document; the key for both stores
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate the id for use as a path component
    pub fn storage_key(&self) -> StorageResult<&str> {
        let id = self.0.as_str();
        let bad = id.is_empty()
            || id == "."
            || id == ".."
            || id.contains(['/', '\\', '\0']);

        if bad {
            return Err(StorageError::InvalidKey(id.to_string()));
        }
        Ok(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        UserId(s)
    }
}

/// Undo/redo history of one document
///
/// `past` is ordered oldest to newest, `future` nearest-redo first.
/// `present` is always defined; an empty document is `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    #[serde(default)]
    pub past: Vec<Snapshot>,

    pub present: Snapshot,

    #[serde(default)]
    pub future: Vec<Snapshot>,
}

impl HistoryState {
    /// A state with no history
    pub fn new(present: impl Into<Snapshot>) -> Self {
        Self {
            past: Vec::new(),
            present: present.into(),
            future: Vec::new(),
        }
    }
}
