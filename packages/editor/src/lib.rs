//! # Quill Editor
//!
//! Content history and synchronization engine for the Quill editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ editing surface: text input, toolbar        │
//! └─────────────────────────────────────────────┘
//!                     ↓ set_content / undo / redo
//! ┌─────────────────────────────────────────────┐
//! │ session: one task per editing session       │
//! │  - Reconcile local + remote at startup      │
//! │  - Apply History transitions                │
//! │  - Write LocalCache on every change         │
//! │  - Debounced RemoteStore write of present   │
//! └─────────────────────────────────────────────┘
//!           ↓                         ↓
//! ┌───────────────────┐     ┌───────────────────┐
//! │ LocalCache (sync) │     │ RemoteStore (async)│
//! └───────────────────┘     └───────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Never block typing**: edits are applied in memory immediately
//! 2. **Never lose an edit**: the full history hits the local cache on every change
//! 3. **Don't flood the network**: the remote only sees `present`, after a quiet period
//! 4. **Single writer**: one session owns a user's document; no merging
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quill_editor::{SyncConfig, SyncController};
//! use quill_storage::{FileLocalCache, FileRemoteStore};
//! use std::sync::Arc;
//!
//! let session = SyncController::new(
//!     "user-1",
//!     Arc::new(FileLocalCache::new(".quill/cache")),
//!     Arc::new(FileRemoteStore::new(".quill/remote")),
//!     SyncConfig::default(),
//! )
//! .spawn();
//!
//! session.set_content("Hello").await?;
//! session.undo().await?;
//! let history = session.close().await?;
//! ```

mod config;
mod errors;
mod history;
mod session;
mod status;

pub use config::{SyncConfig, DEFAULT_DEBOUNCE_MS};
pub use errors::EditorError;
pub use history::History;
pub use session::{SessionHandle, SyncController};
pub use status::{EditOutcome, LocalCacheState, ReconcileSource, RemoteSyncState, SessionStatus};

// Re-export storage types for convenience
pub use quill_storage::{HistoryState, Snapshot, UserId};
