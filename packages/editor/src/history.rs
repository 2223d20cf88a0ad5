//! # Undo/Redo History
//!
//! Snapshot-based history over a single document.
//!
//! ## Design
//!
//! - Every change pushes the old present onto `past`
//! - Undo moves the present to the front of `future`
//! - Redo moves it back onto `past`
//! - New content clears `future` (the redo branch is discarded)
//! - Setting content equal to the present is a no-op
//!
//! ## Example
//!
//! ```rust
//! use quill_editor::History;
//!
//! let mut history = History::new();
//! history.set_content("A");
//! history.set_content("AB");
//!
//! history.undo();
//! assert_eq!(history.present(), "A");
//!
//! history.redo();
//! assert_eq!(history.present(), "AB");
//! ```

use quill_storage::{HistoryState, Snapshot};

/// Undo/redo history for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    past: Vec<Snapshot>,
    present: Snapshot,

    /// Redo levels, furthest first so the nearest one pops off the end
    future: Vec<Snapshot>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl History {
    /// Empty document, unlimited history
    pub fn new() -> Self {
        Self::with_max_levels(0)
    }

    /// Empty document with a cap on undo levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self::from_state(HistoryState::default(), max_levels)
    }

    /// Resume from a persisted state, trimming it to `max_levels`
    pub fn from_state(state: HistoryState, max_levels: usize) -> Self {
        let HistoryState {
            past,
            present,
            mut future,
        } = state;
        future.reverse();

        let mut history = Self {
            past,
            present,
            future,
            max_levels,
        };
        history.trim();
        history
    }

    /// Replace the present. Returns false if the content is unchanged.
    pub fn set_content(&mut self, new_present: impl Into<Snapshot>) -> bool {
        let new_present = new_present.into();
        if new_present == self.present {
            return false;
        }

        let old = std::mem::replace(&mut self.present, new_present);
        self.past.push(old);
        self.future.clear();
        self.trim();

        true
    }

    /// Step back one snapshot. Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop() else {
            return false;
        };

        let old = std::mem::replace(&mut self.present, previous);
        self.future.push(old);
        true
    }

    /// Step forward one snapshot. Returns false if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };

        let old = std::mem::replace(&mut self.present, next);
        self.past.push(old);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.past.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.future.len()
    }

    pub fn present(&self) -> &str {
        &self.present
    }

    /// Persistable copy, `future` ordered nearest redo first
    pub fn state(&self) -> HistoryState {
        HistoryState {
            past: self.past.clone(),
            present: self.present.clone(),
            future: self.future.iter().rev().cloned().collect(),
        }
    }

    pub fn into_state(self) -> HistoryState {
        let mut future = self.future;
        future.reverse();
        HistoryState {
            past: self.past,
            present: self.present,
            future,
        }
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// Evict the oldest undo levels and furthest redo levels beyond the cap
    fn trim(&mut self) {
        if self.max_levels == 0 {
            return;
        }

        if self.past.len() > self.max_levels {
            let excess = self.past.len() - self.max_levels;
            self.past.drain(..excess);
        }
        if self.future.len() > self.max_levels {
            let excess = self.future.len() - self.max_levels;
            self.future.drain(..excess);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
