use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::generator::{ArtifactGenerator, GenerationContext};
use crate::artifact::models::{Artifact, ArtifactKey, ArtifactKind, GenerateOptions};
use crate::artifact::store::ArtifactStore;
use crate::board::events::{TaskEvent, TaskEvents};
use crate::board::models::{
    BucketMap, Comment, LinkedCommit, NewComment, NewTask, Task, TaskId, TaskStatus,
};
use crate::board::store::TaskStore;
use crate::errors::StoreError;

fn bad_request(message: impl Into<String>) -> StoreError {
    StoreError::Http {
        status: 400,
        message: message.into(),
    }
}

fn task_not_found(task_id: TaskId) -> StoreError {
    StoreError::NotFound(format!("Task {} not found", task_id))
}

/// Short uppercase prefix for readable task ids, e.g. `acme-corp` → `ACME`.
fn org_prefix(org_id: &str) -> String {
    let prefix: String = org_id
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_ascii_uppercase();
    if prefix.is_empty() {
        "TASK".to_string()
    } else {
        prefix
    }
}

#[derive(Default)]
struct Inner {
    next_id: TaskId,
    tasks: BTreeMap<TaskId, Task>,
    org_of: HashMap<TaskId, String>,
    org_counters: HashMap<String, u64>,
    artifacts: HashMap<(ArtifactKind, ArtifactKey), Artifact>,
}

impl Inner {
    fn task_mut(&mut self, task_id: TaskId) -> Result<&mut Task, StoreError> {
        self.tasks
            .get_mut(&task_id)
            .ok_or_else(|| task_not_found(task_id))
    }

    fn find_commit(&self, sha: &str) -> Option<LinkedCommit> {
        self.tasks
            .values()
            .flat_map(|t| t.commits.iter())
            .find(|c| c.sha == sha || c.sha.starts_with(sha))
            .cloned()
    }
}

/// In-memory task store and artifact cache.
///
/// Organisations are implicit: a task belongs to the org it was created
/// under and an unknown org simply has an empty board.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    events: TaskEvents,
    generator: Arc<dyn ArtifactGenerator>,
}

impl MemoryStore {
    pub fn new(events: TaskEvents, generator: Arc<dyn ArtifactGenerator>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                ..Inner::default()
            }),
            events,
            generator,
        }
    }

    pub fn events(&self) -> &TaskEvents {
        &self.events
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn task(&self, task_id: TaskId) -> Option<Task> {
        self.lock().tasks.get(&task_id).cloned()
    }

    pub fn cached_artifact_count(&self) -> usize {
        self.lock().artifacts.len()
    }

    /// Populate an org with a handful of tasks spread over every column.
    pub async fn seed_demo(&self, org_id: &str) -> Result<Vec<Task>, StoreError> {
        let samples: [(&str, TaskStatus, Option<i64>); 6] = [
            (
                "Validate onboarding checklist",
                TaskStatus::PendingValidation,
                Some(1),
            ),
            ("Write API pagination docs", TaskStatus::Todo, Some(2)),
            ("Wait on vendor sandbox keys", TaskStatus::Pending, None),
            ("Board drag reconciliation", TaskStatus::InProgress, Some(1)),
            ("PDF export for AI reports", TaskStatus::InProgress, Some(2)),
            ("Set up CI cache", TaskStatus::Done, Some(1)),
        ];
        let today = Utc::now().date_naive();
        let mut created = Vec::with_capacity(samples.len());
        for (i, (title, status, assignee)) in samples.into_iter().enumerate() {
            let task = self
                .create_task(
                    org_id,
                    &NewTask {
                        title: title.to_string(),
                        description: format!("Demo task: {}.", title.to_lowercase()),
                        status: Some(status),
                        assignee_id: assignee,
                        due_date: Some(today + Duration::days(i as i64 * 2)),
                        repository: Some("acme/aether".to_string()),
                    },
                )
                .await?;
            created.push(task);
        }
        if let Some(task) = created.iter().find(|t| t.status == TaskStatus::InProgress) {
            let commit = LinkedCommit {
                sha: "3f9a2c1d8e7b6a5f4e3d2c1b0a9f8e7d6c5b4a39".to_string(),
                message: "Roll back optimistic moves on failed status update".to_string(),
                author: Some("demo".to_string()),
                url: None,
                linked_at: Utc::now(),
            };
            self.link_commit(task.id, &commit).await?;
        }
        tracing::info!(org_id, tasks = created.len(), "seeded demo board");
        Ok(created)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn fetch_bucket_map(
        &self,
        org_id: &str,
        include_done: bool,
    ) -> Result<BucketMap, StoreError> {
        let inner = self.lock();
        let tasks = inner
            .tasks
            .values()
            .filter(|t| inner.org_of.get(&t.id).is_some_and(|o| o == org_id))
            .cloned();
        Ok(BucketMap::from_tasks(tasks, include_done))
    }

    async fn update_task_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
        expected: Option<TaskStatus>,
    ) -> Result<Task, StoreError> {
        let (task, from) = {
            let mut inner = self.lock();
            let task = inner.task_mut(task_id)?;
            if task.archived {
                return Err(StoreError::Conflict(format!(
                    "Task {} is archived",
                    task_id
                )));
            }
            let from = task.status;
            if from == status {
                return Ok(task.clone());
            }
            if let Some(expected) = expected
                && expected != from
            {
                return Err(StoreError::Conflict(format!(
                    "Task {} is now in {}",
                    task_id, from
                )));
            }
            task.status = status;
            (task.clone(), from)
        };
        tracing::info!(task_id, %from, to = %status, "task moved");
        self.events.publish(TaskEvent::Moved {
            task_id,
            from,
            to: status,
        });
        Ok(task)
    }

    async fn create_task(&self, org_id: &str, new: &NewTask) -> Result<Task, StoreError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(bad_request("Task title must not be empty"));
        }
        let task = {
            let mut inner = self.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            let counter = inner.org_counters.entry(org_id.to_string()).or_insert(0);
            *counter += 1;
            let task = Task {
                id,
                readable_id: format!("{}-{}", org_prefix(org_id), counter),
                title: title.to_string(),
                description: new.description.clone(),
                status: new.status.unwrap_or(TaskStatus::Todo),
                assignee_id: new.assignee_id,
                due_date: new.due_date,
                repository: new.repository.clone(),
                archived: false,
                commits: vec![],
                comments: vec![],
            };
            inner.tasks.insert(id, task.clone());
            inner.org_of.insert(id, org_id.to_string());
            task
        };
        tracing::info!(task_id = task.id, readable_id = %task.readable_id, org_id, "task created");
        self.events.publish(TaskEvent::Created { task: task.clone() });
        Ok(task)
    }

    async fn archive_task(&self, task_id: TaskId) -> Result<Task, StoreError> {
        let (task, changed) = {
            let mut inner = self.lock();
            let task = inner.task_mut(task_id)?;
            let changed = !task.archived;
            task.archived = true;
            (task.clone(), changed)
        };
        if changed {
            tracing::info!(task_id, "task archived");
            self.events.publish(TaskEvent::Archived { task_id });
        }
        Ok(task)
    }

    async fn add_comment(
        &self,
        task_id: TaskId,
        new: &NewComment,
    ) -> Result<Comment, StoreError> {
        if new.body.trim().is_empty() && new.attachments.is_empty() {
            return Err(bad_request("Comment must have a body or an attachment"));
        }
        let comment = Comment {
            id: uuid::Uuid::new_v4().to_string(),
            task_id,
            author_id: new.author_id,
            body: new.body.clone(),
            attachments: new.attachments.clone(),
            created_at: Utc::now(),
        };
        self.lock().task_mut(task_id)?.comments.push(comment.clone());
        tracing::debug!(task_id, comment_id = %comment.id, "comment added");
        self.events.publish(TaskEvent::Commented {
            task_id,
            comment_id: comment.id.clone(),
        });
        Ok(comment)
    }

    async fn delete_comment(&self, task_id: TaskId, comment_id: &str) -> Result<(), StoreError> {
        let task = {
            let mut inner = self.lock();
            let task = inner.task_mut(task_id)?;
            let before = task.comments.len();
            task.comments.retain(|c| c.id != comment_id);
            if task.comments.len() == before {
                return Err(StoreError::NotFound(format!(
                    "Comment {} not found on task {}",
                    comment_id, task_id
                )));
            }
            task.clone()
        };
        tracing::debug!(task_id, comment_id, "comment deleted");
        self.events.publish(TaskEvent::Updated { task });
        Ok(())
    }

    async fn link_commit(
        &self,
        task_id: TaskId,
        commit: &LinkedCommit,
    ) -> Result<Task, StoreError> {
        if commit.sha.trim().is_empty() {
            return Err(bad_request("Commit sha must not be empty"));
        }
        let task = {
            let mut inner = self.lock();
            let task = inner.task_mut(task_id)?;
            match task.commits.iter_mut().find(|c| c.sha == commit.sha) {
                Some(existing) => *existing = commit.clone(),
                None => task.commits.push(commit.clone()),
            }
            task.clone()
        };
        tracing::info!(task_id, sha = %commit.short_sha(), "commit linked");
        self.events.publish(TaskEvent::Updated { task: task.clone() });
        Ok(task)
    }
}

impl MemoryStore {
    fn context(&self, key: &ArtifactKey) -> GenerationContext {
        let inner = self.lock();
        let task = key.task_id.and_then(|id| inner.tasks.get(&id).cloned());
        let commit = key.commit_sha.as_deref().and_then(|sha| {
            task.as_ref()
                .and_then(|t| t.commits.iter().find(|c| c.sha == sha).cloned())
                .or_else(|| inner.find_commit(sha))
        });
        GenerationContext { task, commit }
    }

    fn cached(&self, kind: ArtifactKind, key: &ArtifactKey) -> Option<Artifact> {
        self.lock()
            .artifacts
            .get(&(kind, key.clone()))
            .cloned()
            .map(|mut a| {
                a.cached = true;
                a
            })
    }

    async fn run_generator(
        &self,
        kind: ArtifactKind,
        key: &ArtifactKey,
        options: &GenerateOptions,
    ) -> Result<Artifact, StoreError> {
        if let Some(task_id) = key.task_id
            && self.task(task_id).is_none()
        {
            return Err(task_not_found(task_id));
        }
        let context = self.context(key);
        let content = self.generator.generate(kind, key, &context, options).await?;
        let artifact = Artifact {
            kind,
            key: key.clone(),
            content,
            cached: false,
            generated_at: Utc::now(),
            language: Some(options.language.clone()),
            depth: Some(options.depth),
        };
        self.lock()
            .artifacts
            .insert((kind, key.clone()), artifact.clone());
        tracing::info!(
            %kind,
            key = %key.fragment(),
            forced = options.force_regenerate,
            "artifact generated"
        );
        Ok(artifact)
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn fetch_artifact(
        &self,
        kind: ArtifactKind,
        key: &ArtifactKey,
        cache_only: bool,
    ) -> Result<Artifact, StoreError> {
        kind.check_key(key).map_err(|e| bad_request(e.to_string()))?;
        if let Some(artifact) = self.cached(kind, key) {
            return Ok(artifact);
        }
        if cache_only {
            return Err(StoreError::NotFound(format!(
                "No cached {} for {}",
                kind.label(),
                key.fragment()
            )));
        }
        self.run_generator(kind, key, &GenerateOptions::default()).await
    }

    async fn generate_artifact(
        &self,
        kind: ArtifactKind,
        key: &ArtifactKey,
        options: &GenerateOptions,
    ) -> Result<Artifact, StoreError> {
        kind.check_key(key).map_err(|e| bad_request(e.to_string()))?;
        if !options.force_regenerate
            && let Some(artifact) = self.cached(kind, key)
        {
            return Ok(artifact);
        }
        self.run_generator(kind, key, options).await
    }
}
