//! # Edit Session Sync
//!
//! Owns one user's live history and keeps both stores in step with it.
//!
//! ## Flow
//!
//! ```text
//! startup:  LocalCache.load ┐
//!                           ├─ reconcile → History (local wins, then remote, then "")
//!           RemoteStore.load┘
//!
//! edit:     History transition → LocalCache.save (every change)
//!                              → debounce deadline reset
//! quiet:    deadline passes    → RemoteStore.save(present at fire time)
//! ```
//!
//! The session runs as a single task fed by a command channel. Commands
//! sent before reconciliation finishes wait in the channel, so an edit is
//! never applied to a half-loaded state. Remote writes are serialized: a
//! deadline that passes while a write is in flight queues one follow-up
//! write of the latest present, so the remote never goes backwards.
//! If the startup remote load fails, the session never writes the remote.

use crate::{
    EditOutcome, EditorError, History, LocalCacheState, ReconcileSource, RemoteSyncState,
    SessionStatus, SyncConfig,
};
use chrono::Utc;
use quill_storage::{HistoryState, LocalCache, RemoteStore, Snapshot, StorageError, StorageResult, UserId};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

type WriteFuture = Pin<Box<dyn Future<Output = StorageResult<()>> + Send>>;

/// History transition requested by the editing surface
#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    Set(Snapshot),
    Undo,
    Redo,
}

enum Command {
    Edit {
        edit: Edit,
        reply: oneshot::Sender<EditOutcome>,
    },
    Snapshot {
        reply: oneshot::Sender<HistoryState>,
    },
    Close {
        reply: oneshot::Sender<HistoryState>,
    },
}

/// Builds and starts an editing session for one user
pub struct SyncController {
    user: UserId,
    local: Arc<dyn LocalCache>,
    remote: Arc<dyn RemoteStore>,
    config: SyncConfig,
}

impl SyncController {
    pub fn new(
        user: impl Into<UserId>,
        local: Arc<dyn LocalCache>,
        remote: Arc<dyn RemoteStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            user: user.into(),
            local,
            remote,
            config,
        }
    }

    /// Start the session task on the current tokio runtime
    pub fn spawn(self) -> SessionHandle {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SessionStatus::loading());
        let user = self.user.clone();

        tokio::spawn(self.run(receiver, status_tx));

        SessionHandle {
            user,
            commands,
            status,
        }
    }

    async fn run(
        self,
        commands: mpsc::UnboundedReceiver<Command>,
        status: watch::Sender<SessionStatus>,
    ) {
        let session = self.reconcile(status).await;
        session.event_loop(commands).await;
    }

    /// Load both stores concurrently and pick the initial state
    async fn reconcile(self, status: watch::Sender<SessionStatus>) -> Session {
        let (local_result, remote_result) = tokio::join!(
            async { self.local.load(&self.user) },
            self.remote.load(&self.user)
        );

        let mut local_state = LocalCacheState::Active;
        let local_record = match local_result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(user = %self.user, error = %e, "Ignoring local cache record");
                if e.is_unavailable() {
                    local_state = LocalCacheState::MemoryOnly;
                }
                None
            }
        };

        let mut remote_state = RemoteSyncState::Idle;
        let mut remote_offline = false;
        let remote_value = match remote_result {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    user = %self.user,
                    error = %e,
                    "Remote load failed, remote writes disabled for this session"
                );
                remote_state = RemoteSyncState::Failed {
                    error: format!("load failed: {}", e),
                    at: Utc::now(),
                };
                remote_offline = true;
                None
            }
        };

        let (state, source) = match (local_record, &remote_value) {
            (Some(state), _) => (state, ReconcileSource::Local),
            (None, Some(content)) => (HistoryState::new(content.clone()), ReconcileSource::Remote),
            (None, None) => (HistoryState::default(), ReconcileSource::Empty),
        };

        tracing::info!(
            user = %self.user,
            source = %source,
            undo_levels = state.past.len(),
            redo_levels = state.future.len(),
            "Session reconciled"
        );

        let history = History::from_state(state, self.config.max_history);
        let push_local = !remote_offline
            && source == ReconcileSource::Local
            && remote_value.as_deref() != Some(history.present());

        let mut session = Session {
            user: self.user,
            local: self.local,
            remote: self.remote,
            config: self.config,
            history,
            source,
            local_state,
            remote_state,
            remote_offline,
            last_acked: remote_value,
            deadline: None,
            in_flight: None,
            write_queued: false,
            status,
        };

        // Local history is newer than what the remote holds
        if push_local {
            session.arm_debounce();
        }
        session.publish();
        session
    }
}

/// Live state of a reconciled session
struct Session {
    user: UserId,
    local: Arc<dyn LocalCache>,
    remote: Arc<dyn RemoteStore>,
    config: SyncConfig,
    history: History,
    source: ReconcileSource,
    local_state: LocalCacheState,
    remote_state: RemoteSyncState,

    /// The startup load failed, so the remote may hold content this session
    /// never saw. No remote writes until the next session.
    remote_offline: bool,

    /// Last content the remote store is known to hold
    last_acked: Option<Snapshot>,

    /// When the pending remote write fires
    deadline: Option<Instant>,

    /// Content being written and the write itself
    in_flight: Option<(Snapshot, WriteFuture)>,

    /// A deadline passed while a write was in flight
    write_queued: bool,

    status: watch::Sender<SessionStatus>,
}

impl Session {
    async fn event_loop(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Edit { edit, reply }) => {
                        let outcome = self.apply(edit);
                        let _ = reply.send(outcome);
                    }
                    Some(Command::Snapshot { reply }) => {
                        let _ = reply.send(self.history.state());
                    }
                    Some(Command::Close { reply }) => {
                        self.flush().await;
                        tracing::info!(user = %self.user, "Session closed");
                        let _ = reply.send(self.history.into_state());
                        return;
                    }
                    None => {
                        tracing::debug!(user = %self.user, "All handles dropped, ending session");
                        self.abandon().await;
                        return;
                    }
                },

                _ = wait_deadline(self.deadline) => {
                    self.deadline = None;
                    tracing::debug!(user = %self.user, "Quiet period elapsed");
                    self.request_write();
                }

                result = wait_write(&mut self.in_flight) => {
                    if let Some((content, _)) = self.in_flight.take() {
                        self.finish_write(content, result);
                    }
                    self.drain_queue();
                }
            }
        }
    }

    fn apply(&mut self, edit: Edit) -> EditOutcome {
        let changed = match edit {
            Edit::Set(content) => self.history.set_content(content),
            Edit::Undo => self.history.undo(),
            Edit::Redo => self.history.redo(),
        };

        if changed {
            self.persist_local();
            self.arm_debounce();
            self.publish();
        }

        EditOutcome {
            changed,
            content: self.history.present().to_string(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        }
    }

    /// Write the whole history to the local cache. Never fails the edit.
    fn persist_local(&mut self) {
        if self.local_state == LocalCacheState::MemoryOnly {
            return;
        }

        match self.local.save(&self.user, &self.history.state()) {
            Ok(()) => {
                tracing::trace!(user = %self.user, "Local cache written");
            }
            Err(e) if e.is_unavailable() => {
                tracing::warn!(
                    user = %self.user,
                    error = %e,
                    "Local cache unavailable, keeping history in memory only"
                );
                self.local_state = LocalCacheState::MemoryOnly;
            }
            Err(e) => {
                tracing::warn!(user = %self.user, error = %e, "Failed to write local cache");
            }
        }
    }

    /// Cancel any pending deadline and start a fresh quiet period
    fn arm_debounce(&mut self) {
        if self.remote_offline {
            tracing::trace!(user = %self.user, "Remote offline, not scheduling a write");
            return;
        }

        self.deadline = Some(Instant::now() + self.config.debounce());
        if self.in_flight.is_none() {
            self.remote_state = RemoteSyncState::Pending;
        }
        tracing::debug!(user = %self.user, debounce = ?self.config.debounce(), "Remote write scheduled");
    }

    fn request_write(&mut self) {
        if self.in_flight.is_some() {
            self.write_queued = true;
            return;
        }
        self.start_write();
    }

    fn drain_queue(&mut self) {
        if self.write_queued && self.in_flight.is_none() {
            self.write_queued = false;
            self.start_write();
        }
    }

    /// Send the present as of now to the remote store
    fn start_write(&mut self) {
        let content = self.history.present().to_string();

        if self.last_acked.as_deref() == Some(content.as_str()) {
            tracing::debug!(user = %self.user, "Remote already current, skipping write");
            if matches!(self.remote_state, RemoteSyncState::Pending) {
                self.remote_state = RemoteSyncState::Synced { at: Utc::now() };
            }
            self.publish();
            return;
        }

        let remote = Arc::clone(&self.remote);
        let user = self.user.clone();
        let timeout = self.config.remote_timeout();
        let payload = content.clone();

        let write: WriteFuture = Box::pin(async move {
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, remote.save(&user, &payload)).await {
                    Ok(result) => result,
                    Err(_) => Err(StorageError::Timeout(limit)),
                },
                None => remote.save(&user, &payload).await,
            }
        });

        tracing::debug!(user = %self.user, bytes = content.len(), "Writing to remote store");
        self.in_flight = Some((content, write));
        self.remote_state = RemoteSyncState::Saving;
        self.publish();
    }

    fn finish_write(&mut self, content: Snapshot, result: StorageResult<()>) {
        match result {
            Ok(()) => {
                tracing::debug!(user = %self.user, "Remote store updated");
                self.last_acked = Some(content);
                self.remote_state = if self.deadline.is_some() || self.write_queued {
                    RemoteSyncState::Pending
                } else {
                    RemoteSyncState::Synced { at: Utc::now() }
                };
            }
            Err(e) => {
                // No retry loop: the next edit's quiet period writes again
                tracing::error!(
                    user = %self.user,
                    error = %e,
                    "Remote write failed; remote stays stale until the next edit"
                );
                self.remote_state = RemoteSyncState::Failed {
                    error: e.to_string(),
                    at: Utc::now(),
                };
            }
        }
        self.publish();
    }

    /// Push any pending change out before the session ends
    async fn flush(&mut self) {
        if self.deadline.take().is_some() {
            self.write_queued = true;
        }

        loop {
            if let Some((content, write)) = self.in_flight.take() {
                let result = write.await;
                self.finish_write(content, result);
            } else if self.write_queued {
                self.write_queued = false;
                self.start_write();
            } else {
                break;
            }
        }
    }

    /// Drop the pending quiet period but let a started write land
    async fn abandon(&mut self) {
        self.deadline = None;
        self.write_queued = false;

        if let Some((content, write)) = self.in_flight.take() {
            let result = write.await;
            self.finish_write(content, result);
        }
    }

    fn publish(&self) {
        self.status.send_replace(SessionStatus {
            ready: true,
            source: Some(self.source),
            content: self.history.present().to_string(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            local: self.local_state,
            remote: self.remote_state.clone(),
        });
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn wait_write(in_flight: &mut Option<(Snapshot, WriteFuture)>) -> StorageResult<()> {
    match in_flight {
        Some((_, write)) => write.await,
        None => std::future::pending().await,
    }
}

/// Cloneable handle to a running session
///
/// Every call is queued behind reconciliation, in issue order.
#[derive(Clone)]
pub struct SessionHandle {
    user: UserId,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub async fn set_content(&self, content: impl Into<Snapshot>) -> Result<EditOutcome, EditorError> {
        self.edit(Edit::Set(content.into())).await
    }

    pub async fn undo(&self) -> Result<EditOutcome, EditorError> {
        self.edit(Edit::Undo).await
    }

    pub async fn redo(&self) -> Result<EditOutcome, EditorError> {
        self.edit(Edit::Redo).await
    }

    /// Copy of the full history
    pub async fn snapshot(&self) -> Result<HistoryState, EditorError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Flush pending remote writes, stop the session and return the final history
    pub async fn close(self) -> Result<HistoryState, EditorError> {
        self.request(|reply| Command::Close { reply }).await
    }

    /// Latest published status
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Resolve once reconciliation has finished
    pub async fn wait_ready(&self) -> Result<ReconcileSource, EditorError> {
        let mut status = self.status.clone();
        let ready = status
            .wait_for(|s| s.ready)
            .await
            .map_err(|_| EditorError::SessionClosed)?;

        ready.source.ok_or(EditorError::SessionClosed)
    }

    async fn edit(&self, edit: Edit) -> Result<EditOutcome, EditorError> {
        self.request(|reply| Command::Edit { edit, reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, EditorError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| EditorError::SessionClosed)?;
        response.await.map_err(|_| EditorError::SessionClosed)
    }
}
