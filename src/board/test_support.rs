//! Fixtures and doubles shared by board tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use super::models::*;
use super::store::TaskStore;
use crate::errors::StoreError;

pub fn task(id: TaskId, status: TaskStatus, assignee: Option<UserId>) -> Task {
    Task {
        id,
        readable_id: format!("AET-{}", id),
        title: format!("Task {}", id),
        description: String::new(),
        status,
        assignee_id: assignee,
        due_date: None,
        repository: None,
        archived: false,
        commits: vec![],
        comments: vec![],
    }
}

pub fn user(id: UserId, role: Role) -> User {
    User {
        id,
        name: format!("user-{}", id),
        role,
    }
}

/// What the mock returns from the next bucket-map refetch. Without a plan
/// the map is rebuilt from the mock's task list.
pub enum Refetch {
    /// Return this exact map.
    Fixed(BucketMap),
    Fail,
}

/// In-memory `TaskStore` double that records calls and can inject failures.
pub struct MockTaskStore {
    pub tasks: Mutex<Vec<Task>>,
    pub fetch_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub fail_updates: Mutex<VecDeque<StoreError>>,
    pub refetch: Mutex<VecDeque<Refetch>>,
    pub updates: Mutex<Vec<(TaskId, TaskStatus, Option<TaskStatus>)>>,
    /// Status updates for these tasks wait until the gate is notified.
    pub gates: Mutex<HashMap<TaskId, Arc<Notify>>>,
}

impl MockTaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            fetch_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            fail_updates: Mutex::new(VecDeque::new()),
            refetch: Mutex::new(VecDeque::new()),
            updates: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Hold status updates of `task_id` until the returned gate is notified.
    pub fn gate_updates(&self, task_id: TaskId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(task_id, gate.clone());
        gate
    }

    pub fn fail_next_update(&self, err: StoreError) {
        self.fail_updates.lock().unwrap().push_back(err);
    }

    pub fn next_refetch(&self, refetch: Refetch) {
        self.refetch.lock().unwrap().push_back(refetch);
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskStore for MockTaskStore {
    async fn fetch_bucket_map(
        &self,
        _org_id: &str,
        include_done: bool,
    ) -> Result<BucketMap, StoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let plan = self.refetch.lock().unwrap().pop_front();
        match plan {
            None => Ok(BucketMap::from_tasks(
                self.tasks.lock().unwrap().clone(),
                include_done,
            )),
            Some(Refetch::Fixed(map)) => Ok(map),
            Some(Refetch::Fail) => Err(StoreError::Network("connection reset".into())),
        }
    }

    async fn update_task_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
        expected: Option<TaskStatus>,
    ) -> Result<Task, StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.updates.lock().unwrap().push((task_id, status, expected));
        tokio::task::yield_now().await;
        let gate = self.gates.lock().unwrap().get(&task_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.fail_updates.lock().unwrap().pop_front() {
            return Err(err);
        }
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| StoreError::NotFound(format!("task {}", task_id)))?;
        task.status = status;
        Ok(task.clone())
    }

    async fn create_task(&self, _org_id: &str, new: &NewTask) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        let id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let mut created = task(id, new.status.unwrap_or(TaskStatus::Todo), new.assignee_id);
        created.title = new.title.clone();
        tasks.push(created.clone());
        Ok(created)
    }

    async fn archive_task(&self, task_id: TaskId) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| StoreError::NotFound(format!("task {}", task_id)))?;
        task.archived = true;
        Ok(task.clone())
    }

    async fn add_comment(
        &self,
        task_id: TaskId,
        comment: &NewComment,
    ) -> Result<Comment, StoreError> {
        Ok(Comment {
            id: "c-1".into(),
            task_id,
            author_id: comment.author_id,
            body: comment.body.clone(),
            attachments: comment.attachments.clone(),
            created_at: Utc::now(),
        })
    }

    async fn delete_comment(&self, _task_id: TaskId, _comment_id: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn link_commit(
        &self,
        task_id: TaskId,
        commit: &LinkedCommit,
    ) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| StoreError::NotFound(format!("task {}", task_id)))?;
        task.commits.push(commit.clone());
        Ok(task.clone())
    }
}
