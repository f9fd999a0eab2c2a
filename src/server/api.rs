use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use serde::Deserialize;

use super::memory::MemoryStore;
use crate::artifact::models::{ArtifactKind, ArtifactQuery, GenerateRequest};
use crate::artifact::store::ArtifactStore;
use crate::board::models::{LinkedCommit, NewComment, NewTask, StatusUpdate, TaskId};
use crate::board::store::TaskStore;
use crate::errors::StoreError;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub tasks: Arc<dyn TaskStore>,
    pub artifacts: Arc<dyn ArtifactStore>,
}

impl AppState {
    /// Serve both contracts from one in-memory store.
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            tasks: store.clone(),
            artifacts: store,
        }
    }
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BoardQuery {
    #[serde(default)]
    pub include_done: bool,
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Http {
                status: 400,
                message,
            } => ApiError::BadRequest(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

fn parse_kind(kind: &str) -> Result<ArtifactKind, ApiError> {
    ArtifactKind::from_str(kind).map_err(|e| ApiError::BadRequest(e.to_string()))
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/orgs/{org}/board", get(get_board))
        .route("/api/orgs/{org}/tasks", post(create_task))
        .route("/api/tasks/{id}/status", patch(update_status))
        .route("/api/tasks/{id}/archive", post(archive_task))
        .route("/api/tasks/{id}/comments", post(add_comment))
        .route(
            "/api/tasks/{id}/comments/{comment_id}",
            delete(delete_comment),
        )
        .route("/api/tasks/{id}/commits", post(link_commit))
        .route("/api/ai/{kind}", get(get_artifact).post(generate_artifact))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn get_board(
    State(state): State<SharedState>,
    Path(org): Path<String>,
    Query(query): Query<BoardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let map = state.tasks.fetch_bucket_map(&org, query.include_done).await?;
    Ok(Json(map))
}

async fn create_task(
    State(state): State<SharedState>,
    Path(org): Path<String>,
    Json(req): Json<NewTask>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.tasks.create_task(&org, &req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_status(
    State(state): State<SharedState>,
    Path(id): Path<TaskId>,
    Json(req): Json<StatusUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state
        .tasks
        .update_task_status(id, req.status, req.expected_status)
        .await?;
    Ok(Json(task))
}

async fn archive_task(
    State(state): State<SharedState>,
    Path(id): Path<TaskId>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.tasks.archive_task(id).await?;
    Ok(Json(task))
}

async fn add_comment(
    State(state): State<SharedState>,
    Path(id): Path<TaskId>,
    Json(req): Json<NewComment>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state.tasks.add_comment(id, &req).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn delete_comment(
    State(state): State<SharedState>,
    Path((id, comment_id)): Path<(TaskId, String)>,
) -> Result<impl IntoResponse, ApiError> {
    state.tasks.delete_comment(id, &comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn link_commit(
    State(state): State<SharedState>,
    Path(id): Path<TaskId>,
    Json(req): Json<LinkedCommit>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.tasks.link_commit(id, &req).await?;
    Ok(Json(task))
}

async fn get_artifact(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    Query(query): Query<ArtifactQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let artifact = state
        .artifacts
        .fetch_artifact(kind, &query.key(), query.cache_only)
        .await?;
    Ok(Json(artifact))
}

async fn generate_artifact(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    Json(req): Json<GenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let artifact = state
        .artifacts
        .generate_artifact(kind, &req.key, &req.options)
        .await?;
    Ok(Json(artifact))
}
