use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type TaskId = i64;
pub type UserId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    PendingValidation,
    Todo,
    Pending,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Board column order.
    pub const ALL: [TaskStatus; 5] = [
        Self::PendingValidation,
        Self::Todo,
        Self::Pending,
        Self::InProgress,
        Self::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingValidation => "pending_validation",
            Self::Todo => "todo",
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PendingValidation => "Pending validation",
            Self::Todo => "To do",
            Self::Pending => "Pending",
            Self::InProgress => "In progress",
            Self::Done => "Done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_validation" => Ok(Self::PendingValidation),
            "todo" => Ok(Self::Todo),
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Member => "member",
        }
    }

    /// Elevated roles may move any task regardless of assignee.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "member" => Ok(Self::Member),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Whether this user may change the status of `task`.
    pub fn can_move(&self, task: &Task) -> bool {
        self.role.is_elevated() || task.assignee_id == Some(self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkedCommit {
    pub sha: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub linked_at: DateTime<Utc>,
}

impl LinkedCommit {
    pub fn short_sha(&self) -> &str {
        short_sha(&self.sha)
    }
}

/// First seven characters of a commit sha (or the whole sha if shorter).
pub fn short_sha(sha: &str) -> &str {
    let end = sha.char_indices().nth(7).map(|(i, _)| i).unwrap_or(sha.len());
    &sha[..end]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub task_id: TaskId,
    pub author_id: UserId,
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub readable_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub commits: Vec<LinkedCommit>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

// Request payloads

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub repository: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub author_id: UserId,
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: TaskStatus,
    /// Status the client last observed; the store rejects the update with a
    /// conflict when the task has since moved elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<TaskStatus>,
}

// Kanban view types

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bucket {
    pub tasks: Vec<Task>,
    pub count: usize,
}

/// Tasks partitioned by status, with per-bucket counts and a grand total.
///
/// A derived view of the remote store: every listed task belongs to exactly
/// one bucket, and archived tasks never appear.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketMap {
    pub buckets: BTreeMap<TaskStatus, Bucket>,
    pub total: usize,
}

impl BucketMap {
    /// Build a map with every column present, even when empty.
    pub fn from_tasks<I>(tasks: I, include_done: bool) -> Self
    where
        I: IntoIterator<Item = Task>,
    {
        let mut buckets: BTreeMap<TaskStatus, Bucket> = TaskStatus::ALL
            .iter()
            .filter(|s| include_done || **s != TaskStatus::Done)
            .map(|s| (*s, Bucket::default()))
            .collect();
        let mut total = 0;
        for task in tasks {
            if task.archived {
                continue;
            }
            if let Some(bucket) = buckets.get_mut(&task.status) {
                bucket.tasks.push(task);
                bucket.count += 1;
                total += 1;
            }
        }
        Self { buckets, total }
    }

    /// Membership search across all buckets: the status column holding the
    /// task and its index within that column.
    pub fn locate(&self, task_id: TaskId) -> Option<(TaskStatus, usize)> {
        self.buckets.iter().find_map(|(status, bucket)| {
            bucket
                .tasks
                .iter()
                .position(|t| t.id == task_id)
                .map(|idx| (*status, idx))
        })
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        let (status, idx) = self.locate(task_id)?;
        self.buckets.get(&status).and_then(|b| b.tasks.get(idx))
    }

    /// Look a task up by numeric id or readable id (case-insensitive).
    pub fn find(&self, reference: &str) -> Option<&Task> {
        let reference = reference.trim();
        let by_id = reference.parse::<TaskId>().ok();
        self.buckets.values().flat_map(|b| b.tasks.iter()).find(|t| {
            Some(t.id) == by_id || t.readable_id.eq_ignore_ascii_case(reference)
        })
    }

    pub fn contains(&self, status: TaskStatus, task_id: TaskId) -> bool {
        self.buckets
            .get(&status)
            .is_some_and(|b| b.tasks.iter().any(|t| t.id == task_id))
    }

    pub fn has_bucket(&self, status: TaskStatus) -> bool {
        self.buckets.contains_key(&status)
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.buckets.get(&status).map(|b| b.count).unwrap_or(0)
    }

    /// Move one task to the end of the `to` column, keeping both counts in
    /// step. Returns the source column, the task's index there and the task
    /// as it was, or `None` without touching the map when the task is not
    /// listed, the column is missing, or the task is already in it.
    pub fn move_task(
        &mut self,
        task_id: TaskId,
        to: TaskStatus,
    ) -> Option<(TaskStatus, usize, Task)> {
        let (from, index) = self.locate(task_id)?;
        if from == to || !self.has_bucket(to) {
            return None;
        }
        let source = self.buckets.get_mut(&from)?;
        let original = source.tasks.remove(index);
        source.count = source.count.saturating_sub(1);

        let mut moved = original.clone();
        moved.status = to;
        let target = self.buckets.get_mut(&to)?;
        target.tasks.push(moved);
        target.count += 1;
        Some((from, index, original))
    }
}
