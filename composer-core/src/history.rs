//! Linear undo/redo history.
//!
//! The log holds immutable [`SceneList`] snapshots and a cursor. Committing
//! from anywhere but the tip discards the redo tail; there is no branching.
//! Because scene lists share scenes copy-on-write, a snapshot can never be
//! altered by edits made to a list derived from it.

use serde::{Deserialize, Serialize};

use crate::SceneList;

/// Cursor state exposed to the view for enabling undo/redo controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPosition {
    /// Index of the current snapshot.
    pub cursor: usize,
    /// Number of snapshots in the log.
    pub len: usize,
    /// Whether [`History::undo`] would move the cursor.
    pub can_undo: bool,
    /// Whether [`History::redo`] would move the cursor.
    pub can_redo: bool,
}

/// Undo/redo log.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<SceneList>,
    cursor: usize,
    /// Maximum number of snapshots kept; `None` keeps everything.
    limit: Option<usize>,
}

impl History {
    /// Create a log whose only entry is `initial`.
    #[must_use]
    pub fn new(initial: SceneList) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
            limit: None,
        }
    }

    /// Keep at most `limit` snapshots, dropping the oldest first.
    ///
    /// A limit below 1 is treated as 1.
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit.map(|l| l.max(1));
        self.enforce_limit();
        self
    }

    /// The snapshot under the cursor.
    #[must_use]
    pub fn current(&self) -> &SceneList {
        &self.snapshots[self.cursor]
    }

    /// Record a new snapshot, discarding any redo tail.
    pub fn commit(&mut self, scenes: SceneList) {
        let discarded = self.snapshots.len() - self.cursor - 1;
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(scenes);
        self.cursor = self.snapshots.len() - 1;
        self.enforce_limit();
        tracing::debug!(
            "History commit: cursor {} of {} ({discarded} redo entries discarded)",
            self.cursor,
            self.snapshots.len()
        );
    }

    /// Step back one snapshot. Returns `None` at the start of history.
    pub fn undo(&mut self) -> Option<SceneList> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        tracing::debug!("Undo to cursor {}", self.cursor);
        Some(self.current().clone())
    }

    /// Step forward one snapshot. Returns `None` at the tip.
    pub fn redo(&mut self) -> Option<SceneList> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        tracing::debug!("Redo to cursor {}", self.cursor);
        Some(self.current().clone())
    }

    /// Replace the whole log with a single snapshot.
    pub fn reset(&mut self, scenes: SceneList) {
        self.snapshots = vec![scenes];
        self.cursor = 0;
    }

    /// Cursor state.
    #[must_use]
    pub fn position(&self) -> HistoryPosition {
        HistoryPosition {
            cursor: self.cursor,
            len: self.snapshots.len(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    /// Check if there is anything to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if there is anything to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Number of snapshots in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always `false`: the log holds at least the initial snapshot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn enforce_limit(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        if self.snapshots.len() > limit {
            let excess = self.snapshots.len() - limit;
            self.snapshots.drain(..excess);
            self.cursor = self.cursor.saturating_sub(excess);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(SceneList::new())
    }
}
