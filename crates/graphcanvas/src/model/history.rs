// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history built from before/after change brackets.
//!
//! The graph takes a snapshot when the outermost `before_change` opens and
//! another when the matching `after_change` closes; the pair is one undo step.
//! Brackets nest, so a drag that also rewires links records a single step.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Maximum undo history depth
const MAX_HISTORY: usize = 100;

/// History errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Serialized graph state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Serialized graph contents
    pub data: Vec<u8>,
}

impl StateSnapshot {
    /// Create from serializable value
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            data: bincode::serialize(value)?,
        })
    }

    /// Deserialize to value
    pub fn to_value<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        Ok(bincode::deserialize(&self.data)?)
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// One undoable step
#[derive(Debug, Clone)]
pub struct Change {
    /// Sequence number
    pub id: u64,
    /// State before the bracket opened
    pub before: StateSnapshot,
    /// State after the bracket closed
    pub after: StateSnapshot,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct ChangeHistory {
    undo_stack: VecDeque<Change>,
    redo_stack: VecDeque<Change>,
    next_id: u64,
    max_depth: usize,
    /// Open before/after brackets
    depth: u32,
    /// Snapshot taken when the outermost bracket opened
    pending: Option<StateSnapshot>,
}

impl ChangeHistory {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            next_id: 1,
            max_depth,
            depth: 0,
            pending: None,
        }
    }

    /// Open a bracket. `snapshot` is only called for the outermost one.
    pub fn open(&mut self, snapshot: impl FnOnce() -> Result<StateSnapshot>) {
        if self.depth == 0 {
            match snapshot() {
                Ok(before) => self.pending = Some(before),
                Err(e) => tracing::warn!("Failed to snapshot graph before change: {e}"),
            }
        }
        self.depth += 1;
    }

    /// Close a bracket. Commits a step when the outermost bracket closes and
    /// the state actually changed. Unbalanced closes are ignored.
    pub fn close(&mut self, snapshot: impl FnOnce() -> Result<StateSnapshot>) {
        if self.depth == 0 {
            tracing::debug!("after_change without matching before_change");
            return;
        }
        self.depth -= 1;
        if self.depth > 0 {
            return;
        }
        let Some(before) = self.pending.take() else {
            return;
        };
        match snapshot() {
            Ok(after) if after != before => self.commit(before, after),
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to snapshot graph after change: {e}"),
        }
    }

    fn commit(&mut self, before: StateSnapshot, after: StateSnapshot) {
        let id = self.next_id;
        self.next_id += 1;
        self.redo_stack.clear();
        self.undo_stack.push_back(Change { id, before, after });
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Pop the last change for undoing
    pub fn undo(&mut self) -> Result<Change> {
        let change = self.undo_stack.pop_back().ok_or(HistoryError::NothingToUndo)?;
        self.redo_stack.push_back(change.clone());
        Ok(change)
    }

    /// Pop the last undone change for redoing
    pub fn redo(&mut self) -> Result<Change> {
        let change = self.redo_stack.pop_back().ok_or(HistoryError::NothingToRedo)?;
        self.undo_stack.push_back(change.clone());
        Ok(change)
    }

    /// Number of open brackets
    pub fn open_depth(&self) -> u32 {
        self.depth
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Memory held by snapshots, in bytes
    pub fn memory_used(&self) -> usize {
        self.undo_stack
            .iter()
            .chain(self.redo_stack.iter())
            .map(|c| c.before.size() + c.after.size())
            .sum()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pending = None;
        self.depth = 0;
    }
}

impl Default for ChangeHistory {
    fn default() -> Self {
        Self::new()
    }
}
