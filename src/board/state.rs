//! Board State Cache.
//!
//! The client's transient copy of the remote board. Mutations follow a
//! snapshot → apply → commit-or-revert protocol: `apply_move` returns a
//! `MoveTransaction` carrying everything needed to undo the move, and the
//! caller either drops it (commit) or hands it back to `rollback`.

use std::sync::{Arc, Mutex, MutexGuard};

use super::models::{BucketMap, Task, TaskId, TaskStatus};

#[derive(Debug, Default)]
struct Inner {
    map: BucketMap,
    /// Bumped on every mutation; lets rollback tell whether anything else
    /// touched the map since a move was applied.
    generation: u64,
    closed: bool,
}

/// Undo record for one optimistic move.
#[derive(Debug, Clone)]
pub struct MoveTransaction {
    pub task_id: TaskId,
    pub from: TaskStatus,
    pub to: TaskStatus,
    from_index: usize,
    original: Task,
    snapshot: BucketMap,
    generation_after: u64,
}

impl MoveTransaction {
    /// The board as it was immediately before the move.
    pub fn snapshot(&self) -> &BucketMap {
        &self.snapshot
    }

    /// The task as it was before its status was changed locally.
    pub fn original(&self) -> &Task {
        &self.original
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollback {
    /// Nothing else changed the board; the pre-move snapshot was restored.
    Snapshot,
    /// Other mutations happened meanwhile; only this task's move was undone.
    TaskOnly,
    /// The task is no longer in the target column; nothing to undo.
    Skipped,
}

#[derive(Debug, Clone, Default)]
pub struct BoardState {
    inner: Arc<Mutex<Inner>>,
}

impl BoardState {
    pub fn new(map: BucketMap) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                map,
                generation: 0,
                closed: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The map is always left consistent before the guard drops, so a
        // poisoned lock still holds usable data.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> BucketMap {
        self.lock().map.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn task(&self, task_id: TaskId) -> Option<Task> {
        self.lock().map.task(task_id).cloned()
    }

    pub fn locate(&self, task_id: TaskId) -> Option<(TaskStatus, usize)> {
        self.lock().map.locate(task_id)
    }

    pub fn has_bucket(&self, status: TaskStatus) -> bool {
        self.lock().map.has_bucket(status)
    }

    /// Replace the cache with server truth.
    pub fn replace(&self, map: BucketMap) {
        self.replace_keeping(map, &[]);
    }

    /// Replace the cache with server truth, then re-apply the optimistic
    /// moves in `pending` whose store calls have not answered yet.
    pub fn replace_keeping(&self, mut map: BucketMap, pending: &[(TaskId, TaskStatus)]) {
        for &(task_id, to) in pending {
            if map.move_task(task_id, to).is_some() {
                tracing::debug!(task_id, %to, "kept in-flight move over refreshed board");
            }
        }
        let mut inner = self.lock();
        inner.map = map;
        inner.generation += 1;
    }

    /// Move `task_id` to the end of the `to` column, updating both counts.
    ///
    /// Returns `None` without touching the map when the task is not on the
    /// board, the target column does not exist, or the task is already there.
    pub fn apply_move(&self, task_id: TaskId, to: TaskStatus) -> Option<MoveTransaction> {
        let mut inner = self.lock();
        let snapshot = inner.map.clone();
        let (from, from_index, original) = inner.map.move_task(task_id, to)?;
        inner.generation += 1;
        Some(MoveTransaction {
            task_id,
            from,
            to,
            from_index,
            original,
            snapshot,
            generation_after: inner.generation,
        })
    }

    /// Revert a move that the remote store rejected.
    pub fn rollback(&self, tx: MoveTransaction) -> Rollback {
        let mut inner = self.lock();
        if inner.generation == tx.generation_after {
            inner.map = tx.snapshot;
            inner.generation += 1;
            return Rollback::Snapshot;
        }

        let Some(idx) = inner
            .map
            .buckets
            .get(&tx.to)
            .and_then(|b| b.tasks.iter().position(|t| t.id == tx.task_id))
        else {
            return Rollback::Skipped;
        };
        if let Some(target) = inner.map.buckets.get_mut(&tx.to) {
            target.tasks.remove(idx);
            target.count = target.count.saturating_sub(1);
        }
        if let Some(source) = inner.map.buckets.get_mut(&tx.from) {
            let at = tx.from_index.min(source.tasks.len());
            source.tasks.insert(at, tx.original);
            source.count += 1;
        }
        inner.generation += 1;
        Rollback::TaskOnly
    }

    /// Mark the owning view as gone; late results must be discarded.
    pub fn close(&self) {
        self.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
