//! Snapshot history behind undo/redo.
//!
//! DESIGN
//! ======
//! Every committed mutation appends a full [`Snapshot`] of the scene. The
//! cursor points at the snapshot matching the live scene. Undo and redo move
//! the cursor and restore the snapshot under it; committing while the cursor
//! is behind the tail discards the redo branch first, so history is always a
//! single line.
//!
//! An optional capacity bound drops the oldest snapshot on overflow. That
//! limits undo depth, never correctness.
//!
//! ERROR HANDLING
//! ==============
//! The cursor only moves once the restore has succeeded, so a snapshot that
//! fails validation leaves both the scene and the stack as they were.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::num::NonZeroUsize;

use tracing::debug;

use crate::scene::{Scene, Snapshot, SnapshotError};

/// Linear snapshot stack with a cursor.
#[derive(Debug, Default)]
pub struct HistoryStack {
    snapshots: Vec<Snapshot>,
    /// `None` until the first commit.
    cursor: Option<usize>,
    capacity: Option<NonZeroUsize>,
}

impl HistoryStack {
    /// An unbounded stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A stack that keeps at most `capacity` snapshots.
    #[must_use]
    pub fn bounded(capacity: NonZeroUsize) -> Self {
        Self { capacity: Some(capacity), ..Self::default() }
    }

    /// Capture the scene, prune any redo branch, and append.
    pub fn commit(&mut self, scene: &Scene) {
        self.push(scene.serialize());
    }

    fn push(&mut self, snapshot: Snapshot) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.snapshots.truncate(keep);
        self.snapshots.push(snapshot);
        if let Some(cap) = self.capacity {
            let excess = self.snapshots.len().saturating_sub(cap.get());
            self.snapshots.drain(..excess);
        }
        self.cursor = self.snapshots.len().checked_sub(1);
        debug!(cursor = ?self.cursor, len = self.snapshots.len(), "history commit");
    }

    /// Step back one snapshot. Returns `Ok(false)` at the oldest snapshot.
    ///
    /// # Errors
    ///
    /// Propagates a restore failure; the cursor does not move.
    pub fn undo(&mut self, scene: &mut Scene) -> Result<bool, SnapshotError> {
        match self.cursor {
            Some(cursor) if cursor > 0 => self.move_to(cursor - 1, scene),
            _ => Ok(false),
        }
    }

    /// Step forward one snapshot. Returns `Ok(false)` at the newest snapshot.
    ///
    /// # Errors
    ///
    /// Propagates a restore failure; the cursor does not move.
    pub fn redo(&mut self, scene: &mut Scene) -> Result<bool, SnapshotError> {
        match self.cursor {
            Some(cursor) if cursor + 1 < self.snapshots.len() => self.move_to(cursor + 1, scene),
            _ => Ok(false),
        }
    }

    fn move_to(&mut self, target: usize, scene: &mut Scene) -> Result<bool, SnapshotError> {
        let Some(snapshot) = self.snapshots.get(target) else {
            return Ok(false);
        };
        scene.restore(snapshot)?;
        self.cursor = Some(target);
        debug!(cursor = target, len = self.snapshots.len(), "history moved");
        Ok(true)
    }

    // --- Queries ---

    /// Index of the snapshot matching the live scene.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> Option<NonZeroUsize> {
        self.capacity
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.snapshots.len())
    }

    #[must_use]
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Snapshot under the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&Snapshot> {
        self.cursor.and_then(|c| self.snapshots.get(c))
    }
}
