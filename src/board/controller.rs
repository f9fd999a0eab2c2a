//! Drag Reconciliation Controller.
//!
//! Turns a drag gesture into a status change: resolve source and target
//! columns, check the permission predicate, apply the move optimistically,
//! then either reconcile with a fresh board from the store or roll back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::events::{TaskEvent, TaskEvents};
use super::models::{BucketMap, Task, TaskId, TaskStatus, User};
use super::notices::{NoticeKind, Notices};
use super::state::{BoardState, MoveTransaction};
use super::store::TaskStore;
use crate::errors::StoreError;

pub const PERMISSION_DENIED_MESSAGE: &str = "You can only move tasks that are assigned to you.";
pub const MOVE_FAILED_MESSAGE: &str = "Failed to move task. Please try again.";
pub const INTEGRITY_WARNING_MESSAGE: &str =
    "Task moved, but the change may not have saved. Please refresh the board.";
pub const BUSY_MESSAGE: &str = "This task is already being moved.";

/// How a single `drag_end` resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// The dragged task is not on the board.
    UnknownTask,
    /// The drop target did not resolve to a column.
    NoTarget,
    /// Dropped back onto its own column.
    SameBucket,
    /// The actor may not move this task.
    Denied,
    /// A move of the same task is still in flight.
    Busy,
    /// Store accepted the change and the refetched board confirms it.
    Reconciled,
    /// Store accepted the change but the refetched board does not show it;
    /// the optimistic state was kept.
    IntegrityWarning,
    /// Store rejected the change; the move was undone.
    RolledBack,
    /// The view was closed before the store answered.
    Discarded,
}

impl DragOutcome {
    /// Whether this outcome involved a status-update call.
    pub fn reached_store(&self) -> bool {
        matches!(
            self,
            Self::Reconciled | Self::IntegrityWarning | Self::RolledBack | Self::Discarded
        )
    }
}

/// Removes the task from the in-flight moves when the move settles.
struct InFlight<'a> {
    moves: &'a Mutex<HashMap<TaskId, TaskStatus>>,
    task_id: TaskId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut moves = self.moves.lock().unwrap_or_else(|e| e.into_inner());
        moves.remove(&self.task_id);
    }
}

pub struct DragController {
    store: Arc<dyn TaskStore>,
    state: BoardState,
    notices: Notices,
    events: TaskEvents,
    org_id: String,
    include_done: bool,
    /// Target column of every move whose store call has not settled.
    in_flight: Mutex<HashMap<TaskId, TaskStatus>>,
}

impl DragController {
    pub fn new(
        store: Arc<dyn TaskStore>,
        org_id: impl Into<String>,
        include_done: bool,
        notices: Notices,
        events: TaskEvents,
    ) -> Self {
        Self {
            store,
            state: BoardState::default(),
            notices,
            events,
            org_id: org_id.into(),
            include_done,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn board(&self) -> BucketMap {
        self.state.snapshot()
    }

    /// Fetch the board and replace the local cache with it.
    pub async fn load(&self) -> Result<(), StoreError> {
        let map = self
            .store
            .fetch_bucket_map(&self.org_id, self.include_done)
            .await?;
        if self.state.is_closed() {
            return Ok(());
        }
        tracing::debug!(org = %self.org_id, total = map.total, "board loaded");
        self.state.replace_keeping(map, &self.pending_moves(None));
        Ok(())
    }

    /// The task being picked up, found by searching every column.
    pub fn drag_start(&self, task_id: TaskId) -> Option<Task> {
        let task = self.state.task(task_id);
        if task.is_none() {
            tracing::debug!(task_id, "drag started on a task that is not on the board");
        }
        task
    }

    /// Resolve a drop target id to a column: either the id names a column
    /// directly, or it names a task and the task's column is used.
    pub fn resolve_drop_target(&self, over_id: &str) -> Option<TaskStatus> {
        if let Ok(status) = over_id.parse::<TaskStatus>() {
            return self.state.has_bucket(status).then_some(status);
        }
        let task_id: TaskId = over_id.trim().parse().ok()?;
        self.state.locate(task_id).map(|(status, _)| status)
    }

    pub async fn drag_end(
        &self,
        actor: &User,
        task_id: TaskId,
        over_id: Option<&str>,
    ) -> DragOutcome {
        let Some((from, _)) = self.state.locate(task_id) else {
            return DragOutcome::UnknownTask;
        };
        let Some(to) = over_id.and_then(|id| self.resolve_drop_target(id)) else {
            tracing::debug!(task_id, ?over_id, "drop target did not resolve to a column");
            return DragOutcome::NoTarget;
        };
        if from == to {
            return DragOutcome::SameBucket;
        }
        let Some(task) = self.state.task(task_id) else {
            return DragOutcome::UnknownTask;
        };
        if !actor.can_move(&task) {
            tracing::info!(task_id, user_id = actor.id, role = %actor.role, "move denied");
            self.notices
                .push(NoticeKind::PermissionDenied, PERMISSION_DENIED_MESSAGE);
            return DragOutcome::Denied;
        }

        let Some(_guard) = self.begin(task_id, to) else {
            self.notices.push(NoticeKind::Busy, BUSY_MESSAGE);
            return DragOutcome::Busy;
        };
        let Some(tx) = self.state.apply_move(task_id, to) else {
            return DragOutcome::NoTarget;
        };
        tracing::debug!(task_id, %from, %to, "optimistic move applied");

        match self.store.update_task_status(task_id, to, Some(from)).await {
            Err(e) => self.fail(tx, e),
            Ok(_) => {
                self.events.publish(TaskEvent::Moved { task_id, from, to });
                if self.state.is_closed() {
                    return DragOutcome::Discarded;
                }
                self.reconcile(&tx).await
            }
        }
    }

    fn begin(&self, task_id: TaskId, to: TaskStatus) -> Option<InFlight<'_>> {
        let mut moves = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if moves.contains_key(&task_id) {
            return None;
        }
        moves.insert(task_id, to);
        Some(InFlight {
            moves: &self.in_flight,
            task_id,
        })
    }

    /// Optimistic moves still waiting on the store, other than `except`.
    fn pending_moves(&self, except: Option<TaskId>) -> Vec<(TaskId, TaskStatus)> {
        let moves = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        moves
            .iter()
            .filter(|(id, _)| Some(**id) != except)
            .map(|(id, to)| (*id, *to))
            .collect()
    }

    fn fail(&self, tx: MoveTransaction, err: StoreError) -> DragOutcome {
        if self.state.is_closed() {
            return DragOutcome::Discarded;
        }
        tracing::warn!(
            task_id = tx.task_id,
            task = %tx.original().readable_id,
            from = %tx.from,
            to = %tx.to,
            error = %err,
            "move failed, rolling back"
        );
        let rollback = self.state.rollback(tx);
        tracing::debug!(?rollback, "rollback applied");
        self.notices.push(NoticeKind::MoveFailed, MOVE_FAILED_MESSAGE);
        DragOutcome::RolledBack
    }

    async fn reconcile(&self, tx: &MoveTransaction) -> DragOutcome {
        let refetched = self
            .store
            .fetch_bucket_map(&self.org_id, self.include_done)
            .await;
        if self.state.is_closed() {
            return DragOutcome::Discarded;
        }
        match refetched {
            Ok(map) if map.contains(tx.to, tx.task_id) => {
                self.state
                    .replace_keeping(map, &self.pending_moves(Some(tx.task_id)));
                tracing::info!(task_id = tx.task_id, to = %tx.to, "move confirmed");
                DragOutcome::Reconciled
            }
            Ok(_) => {
                tracing::warn!(
                    task_id = tx.task_id,
                    to = %tx.to,
                    "refetched board does not show the moved task; keeping local state"
                );
                self.notices
                    .push(NoticeKind::IntegrityWarning, INTEGRITY_WARNING_MESSAGE);
                DragOutcome::IntegrityWarning
            }
            Err(e) => {
                tracing::warn!(task_id = tx.task_id, error = %e, "refetch after move failed");
                self.notices
                    .push(NoticeKind::IntegrityWarning, INTEGRITY_WARNING_MESSAGE);
                DragOutcome::IntegrityWarning
            }
        }
    }

    /// React to a change made elsewhere by refreshing the board.
    pub async fn handle_event(&self, event: &TaskEvent) -> Result<bool, StoreError> {
        match event {
            // Our own moves are reconciled by `drag_end`.
            TaskEvent::Moved { .. } => Ok(false),
            TaskEvent::Created { .. }
            | TaskEvent::Updated { .. }
            | TaskEvent::Archived { .. }
            | TaskEvent::Commented { .. } => {
                self.load().await?;
                Ok(true)
            }
        }
    }

    /// Unmount: any store response arriving later is ignored.
    pub fn close(&self) {
        self.state.close();
    }
}
