use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::models::{Task, TaskId, TaskStatus};

const CHANNEL_CAPACITY: usize = 64;

// ── Task change notifications ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TaskEvent {
    Created {
        task: Task,
    },
    Updated {
        task: Task,
    },
    Moved {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
    Archived {
        task_id: TaskId,
    },
    Commented {
        task_id: TaskId,
        comment_id: String,
    },
}

impl TaskEvent {
    pub fn task_id(&self) -> TaskId {
        match self {
            Self::Created { task } | Self::Updated { task } => task.id,
            Self::Moved { task_id, .. }
            | Self::Archived { task_id }
            | Self::Commented { task_id, .. } => *task_id,
        }
    }
}

/// Observer registry for task-set changes.
///
/// Owned by whoever composes the application (a CLI session, the reference
/// server); views subscribe through the handle they are given rather than a
/// process-global emitter.
#[derive(Debug, Clone)]
pub struct TaskEvents {
    tx: broadcast::Sender<TaskEvent>,
}

impl Default for TaskEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: TaskEvent) {
        tracing::debug!(task_id = event.task_id(), ?event, "task event");
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
