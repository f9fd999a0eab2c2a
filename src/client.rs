//! HTTP implementation of the task store and artifact store contracts.
//!
//! Every call carries the configured request timeout; generation requests
//! use the longer generation timeout. A timeout surfaces as
//! `StoreError::Network` and follows the ordinary failure path.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::artifact::models::{
    Artifact, ArtifactKey, ArtifactKind, ArtifactQuery, GenerateOptions, GenerateRequest,
};
use crate::artifact::store::ArtifactStore;
use crate::board::models::{
    BucketMap, Comment, LinkedCommit, NewComment, NewTask, StatusUpdate, Task, TaskId, TaskStatus,
};
use crate::board::store::TaskStore;
use crate::errors::StoreError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub generation_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    generation_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("aether/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = match Url::parse(config.base_url.trim()) {
            Ok(url) => url,
            Err(e) => {
                let message = format!("{}: {}", config.base_url, e);
                return Err(StoreError::InvalidUrl(message));
            }
        };
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl(config.base_url));
        }
        Ok(Self {
            http,
            base_url,
            generation_timeout: config.generation_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Append `segments` to the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<reqwest::Response, StoreError> {
        let started = std::time::Instant::now();
        let resp = request.send().await.map_err(|e| {
            tracing::warn!(%what, error = %e, "request failed");
            StoreError::from(e)
        })?;
        let status = resp.status();
        tracing::debug!(
            %what,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response"
        );
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                if text.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    text
                }
            });
        Err(StoreError::from_status(status.as_u16(), message))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, StoreError> {
        let resp = self.execute(request, what).await?;
        resp.json::<T>()
            .await
            .map_err(|e| StoreError::Decode(format!("{}: {}", what, e)))
    }
}

#[async_trait]
impl TaskStore for ApiClient {
    async fn fetch_bucket_map(
        &self,
        org_id: &str,
        include_done: bool,
    ) -> Result<BucketMap, StoreError> {
        let req = self
            .http
            .get(self.url(&["api", "orgs", org_id, "board"])?)
            .query(&[("include_done", include_done)]);
        self.send_json(req, "fetch board").await
    }

    async fn update_task_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
        expected: Option<TaskStatus>,
    ) -> Result<Task, StoreError> {
        let body = StatusUpdate {
            status,
            expected_status: expected,
        };
        let task = task_id.to_string();
        let req = self
            .http
            .patch(self.url(&["api", "tasks", &task, "status"])?)
            .json(&body);
        self.send_json(req, "update status").await
    }

    async fn create_task(&self, org_id: &str, task: &NewTask) -> Result<Task, StoreError> {
        let req = self
            .http
            .post(self.url(&["api", "orgs", org_id, "tasks"])?)
            .json(task);
        self.send_json(req, "create task").await
    }

    async fn archive_task(&self, task_id: TaskId) -> Result<Task, StoreError> {
        let task = task_id.to_string();
        let req = self.http.post(self.url(&["api", "tasks", &task, "archive"])?);
        self.send_json(req, "archive task").await
    }

    async fn add_comment(
        &self,
        task_id: TaskId,
        comment: &NewComment,
    ) -> Result<Comment, StoreError> {
        let task = task_id.to_string();
        let req = self
            .http
            .post(self.url(&["api", "tasks", &task, "comments"])?)
            .json(comment);
        self.send_json(req, "add comment").await
    }

    async fn delete_comment(&self, task_id: TaskId, comment_id: &str) -> Result<(), StoreError> {
        let task = task_id.to_string();
        let req = self
            .http
            .delete(self.url(&["api", "tasks", &task, "comments", comment_id])?);
        self.execute(req, "delete comment").await?;
        Ok(())
    }

    async fn link_commit(
        &self,
        task_id: TaskId,
        commit: &LinkedCommit,
    ) -> Result<Task, StoreError> {
        let task = task_id.to_string();
        let req = self
            .http
            .post(self.url(&["api", "tasks", &task, "commits"])?)
            .json(commit);
        self.send_json(req, "link commit").await
    }
}

#[async_trait]
impl ArtifactStore for ApiClient {
    async fn fetch_artifact(
        &self,
        kind: ArtifactKind,
        key: &ArtifactKey,
        cache_only: bool,
    ) -> Result<Artifact, StoreError> {
        let req = self
            .http
            .get(self.url(&["api", "ai", kind.as_str()])?)
            .query(&ArtifactQuery::new(key, cache_only));
        self.send_json(req, "fetch artifact").await
    }

    async fn generate_artifact(
        &self,
        kind: ArtifactKind,
        key: &ArtifactKey,
        options: &GenerateOptions,
    ) -> Result<Artifact, StoreError> {
        let body = GenerateRequest {
            key: key.clone(),
            options: options.clone(),
        };
        let req = self
            .http
            .post(self.url(&["api", "ai", kind.as_str()])?)
            .timeout(self.generation_timeout)
            .json(&body);
        self.send_json(req, "generate artifact").await
    }
}
