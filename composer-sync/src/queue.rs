//! Pending writes, keyed by scene.
//!
//! Each scene has at most one pending patch; newer changes merge into it and
//! push its deadline back. Writes that failed are parked with their error and
//! stay parked until [`PendingWrites::unpark`] is called. Changes that arrive
//! for a parked scene merge into the parked patch instead of being scheduled.

use std::collections::HashMap;
use std::time::Duration;

use composer_core::{SceneChange, SceneId, ScenePatch};
use tokio::time::Instant;

/// One scene's patch waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    /// Target scene.
    pub scene_id: SceneId,
    /// Everything that changed since the last successful write.
    pub patch: ScenePatch,
    /// Newest editor revision folded into `patch`.
    pub revision: u64,
}

#[derive(Debug, Clone)]
struct Scheduled {
    write: PendingWrite,
    due: Instant,
}

#[derive(Debug, Clone)]
struct Parked {
    write: PendingWrite,
    error: String,
}

/// What happened to an enqueued change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// First pending change for the scene.
    Scheduled,
    /// Merged into a change already waiting.
    Coalesced,
    /// Merged into a parked write; nothing was scheduled.
    Parked,
}

/// Debounced, coalescing write queue.
#[derive(Debug, Clone)]
pub struct PendingWrites {
    debounce: Duration,
    scheduled: HashMap<SceneId, Scheduled>,
    parked: HashMap<SceneId, Parked>,
}

impl PendingWrites {
    /// Create an empty queue.
    #[must_use]
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            scheduled: HashMap::new(),
            parked: HashMap::new(),
        }
    }

    /// Add a change observed at `now`.
    pub fn enqueue(&mut self, change: SceneChange, now: Instant) -> Enqueued {
        let SceneChange {
            scene_id,
            patch,
            revision,
        } = change;

        if let Some(parked) = self.parked.get_mut(&scene_id) {
            merge_into(&mut parked.write, patch, revision);
            return Enqueued::Parked;
        }

        let due = now + self.debounce;
        if let Some(scheduled) = self.scheduled.get_mut(&scene_id) {
            merge_into(&mut scheduled.write, patch, revision);
            scheduled.due = due;
            return Enqueued::Coalesced;
        }

        self.scheduled.insert(
            scene_id,
            Scheduled {
                write: PendingWrite {
                    scene_id,
                    patch,
                    revision,
                },
                due,
            },
        );
        Enqueued::Scheduled
    }

    /// Earliest deadline among scheduled writes.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.scheduled.values().map(|s| s.due).min()
    }

    /// Remove and return every write whose deadline has passed, oldest
    /// revision first.
    pub fn take_due(&mut self, now: Instant) -> Vec<PendingWrite> {
        let due: Vec<SceneId> = self
            .scheduled
            .iter()
            .filter(|(_, s)| s.due <= now)
            .map(|(id, _)| *id)
            .collect();
        let mut writes: Vec<PendingWrite> = due
            .into_iter()
            .filter_map(|id| self.scheduled.remove(&id))
            .map(|s| s.write)
            .collect();
        writes.sort_by_key(|w| w.revision);
        writes
    }

    /// Remove and return every scheduled write regardless of deadline.
    pub fn take_all(&mut self) -> Vec<PendingWrite> {
        let mut writes: Vec<PendingWrite> =
            self.scheduled.drain().map(|(_, s)| s.write).collect();
        writes.sort_by_key(|w| w.revision);
        writes
    }

    /// Park a write that failed.
    ///
    /// A change for the same scene that was scheduled while the write was in
    /// flight is newer, so it is folded into the parked patch.
    pub fn park(&mut self, mut write: PendingWrite, error: String) {
        if let Some(newer) = self.scheduled.remove(&write.scene_id) {
            merge_into(&mut write, newer.write.patch, newer.write.revision);
        }
        self.parked.insert(write.scene_id, Parked { write, error });
    }

    /// Move a parked write back into the schedule, due immediately.
    ///
    /// Returns `false` if nothing was parked for the scene.
    pub fn unpark(&mut self, scene_id: SceneId, now: Instant) -> bool {
        let Some(parked) = self.parked.remove(&scene_id) else {
            return false;
        };
        self.scheduled.insert(
            scene_id,
            Scheduled {
                write: parked.write,
                due: now,
            },
        );
        true
    }

    /// Number of parked scenes.
    #[must_use]
    pub fn parked_len(&self) -> usize {
        self.parked.len()
    }

    /// Parked scenes and the error that parked them.
    #[must_use]
    pub fn parked(&self) -> Vec<(SceneId, String)> {
        self.parked
            .iter()
            .map(|(id, p)| (*id, p.error.clone()))
            .collect()
    }

    /// Number of scheduled writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scheduled.len()
    }

    /// Check if nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scheduled.is_empty()
    }
}

fn merge_into(write: &mut PendingWrite, patch: ScenePatch, revision: u64) {
    write.patch = std::mem::take(&mut write.patch).merge(patch);
    write.revision = write.revision.max(revision);
}
