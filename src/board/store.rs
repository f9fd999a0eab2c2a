use async_trait::async_trait;

use super::models::{
    BucketMap, Comment, LinkedCommit, NewComment, NewTask, Task, TaskId, TaskStatus,
};
use crate::errors::StoreError;

/// Remote task store contract.
/// Real implementation: `client::ApiClient`. Test double: `MockTaskStore`.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Full snapshot read of the organisation's board.
    async fn fetch_bucket_map(&self, org_id: &str, include_done: bool)
    -> Result<BucketMap, StoreError>;

    /// Single-field status mutation. Setting a task to the status it already
    /// has succeeds, so retries are safe. When `expected` is given the store
    /// answers `StoreError::Conflict` if the task is no longer in that status.
    async fn update_task_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
        expected: Option<TaskStatus>,
    ) -> Result<Task, StoreError>;

    async fn create_task(&self, org_id: &str, task: &NewTask) -> Result<Task, StoreError>;

    async fn archive_task(&self, task_id: TaskId) -> Result<Task, StoreError>;

    async fn add_comment(&self, task_id: TaskId, comment: &NewComment)
    -> Result<Comment, StoreError>;

    async fn delete_comment(&self, task_id: TaskId, comment_id: &str) -> Result<(), StoreError>;

    async fn link_commit(&self, task_id: TaskId, commit: &LinkedCommit)
    -> Result<Task, StoreError>;
}
