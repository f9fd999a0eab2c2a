//! Integration tests for Aether
//!
//! These tests drive the binary and the HTTP client against the in-memory
//! reference store bound to an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

use aether::board::events::TaskEvents;
use aether::server::{AppState, MemoryStore, TemplateGenerator, build_router};

/// Helper to create an aether Command isolated from the caller's config
fn aether(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("aether");
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env_remove("AETHER_API_URL")
        .env_remove("AETHER_ORG")
        .env_remove("AETHER_USER_ID")
        .env_remove("AETHER_ROLE")
        .env_remove("AETHER_LANGUAGE")
        .env("AETHER_LOG", "warn");
    cmd
}

fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

fn new_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(
        TaskEvents::new(),
        Arc::new(TemplateGenerator),
    ))
}

/// Serve `store` on 127.0.0.1 with an OS-assigned port.
async fn spawn_server(store: Arc<MemoryStore>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(Arc::new(AppState::in_memory(store)));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_aether_help() {
        let dir = create_temp_project();
        aether(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("move"))
            .stdout(predicate::str::contains("export"));
    }

    #[test]
    fn test_aether_version() {
        let dir = create_temp_project();
        aether(&dir).arg("--version").assert().success();
    }

    #[test]
    fn test_unknown_artifact_kind_rejected() {
        let dir = create_temp_project();
        aether(&dir)
            .args(["artifact", "poem"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown artifact kind"));
    }

    #[test]
    fn test_config_init_creates_file() {
        let dir = create_temp_project();
        aether(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created aether.toml"));
        assert!(dir.path().join(".aether/aether.toml").exists());

        aether(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_config_validate_reports_missing_user() {
        let dir = create_temp_project();
        aether(&dir)
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("user.id is not set"));
    }

    #[test]
    fn test_config_show_applies_env_overrides() {
        let dir = create_temp_project();
        std::fs::create_dir_all(dir.path().join(".aether")).unwrap();
        std::fs::write(
            dir.path().join(".aether/aether.toml"),
            "[board]\norg_id = \"file-org\"\n",
        )
        .unwrap();

        aether(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("org_id = \"file-org\""));

        aether(&dir)
            .env("AETHER_ORG", "env-org")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("org_id = \"env-org\""));
    }

    #[test]
    fn test_move_requires_user() {
        let dir = create_temp_project();
        aether(&dir)
            .args(["--api-url", "http://127.0.0.1:9", "move", "1", "done"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No user configured"));
    }
}

// =============================================================================
// Client against the reference store
// =============================================================================

mod client_roundtrip {
    use super::*;
    use aether::artifact::card::{AiCard, CardOptions, CardState};
    use aether::artifact::confirm::Preapproved;
    use aether::artifact::models::{ArtifactKey, ArtifactKind};
    use aether::artifact::store::ArtifactStore;
    use aether::board::controller::{DragController, DragOutcome};
    use aether::board::models::{LinkedCommit, NewTask, Role, TaskStatus, User};
    use aether::board::notices::Notices;
    use aether::board::store::TaskStore;
    use aether::client::{ApiClient, ClientConfig};
    use aether::errors::StoreError;
    use aether::export::{ExportMetadata, export_artifact_to_document};

    fn client(addr: SocketAddr) -> Arc<ApiClient> {
        let config = ClientConfig::new(format!("http://{}", addr));
        Arc::new(ApiClient::new(config).unwrap())
    }

    fn member(id: i64, name: &str) -> User {
        User {
            id,
            name: name.to_string(),
            role: Role::Member,
        }
    }

    fn new_task(title: &str, status: TaskStatus, assignee: Option<i64>) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: String::new(),
            status: Some(status),
            assignee_id: assignee,
            due_date: None,
            repository: None,
        }
    }

    #[tokio::test]
    async fn test_drag_reconciles_against_server() {
        let store = new_store();
        let addr = spawn_server(store.clone()).await;
        let api = client(addr);

        let task = api
            .create_task("acme", &new_task("Ship it", TaskStatus::Todo, Some(7)))
            .await
            .unwrap();
        assert_eq!(task.readable_id, "ACME-1");

        let controller = DragController::new(
            api.clone(),
            "acme",
            false,
            Notices::default(),
            TaskEvents::new(),
        );
        controller.load().await.unwrap();
        assert_eq!(controller.board().count(TaskStatus::Todo), 1);

        let member = member(7, "dana");
        let outcome = controller.drag_end(&member, task.id, Some("in_progress")).await;
        assert_eq!(outcome, DragOutcome::Reconciled);
        assert_eq!(store.task(task.id).unwrap().status, TaskStatus::InProgress);
        assert_eq!(controller.board().count(TaskStatus::InProgress), 1);
        assert_eq!(controller.board().count(TaskStatus::Todo), 0);
    }

    #[tokio::test]
    async fn test_drag_denied_never_reaches_server() {
        let store = new_store();
        let addr = spawn_server(store.clone()).await;
        let api = client(addr);
        let task = api
            .create_task("acme", &new_task("Theirs", TaskStatus::Todo, Some(1)))
            .await
            .unwrap();

        let notices = Notices::default();
        let controller = DragController::new(
            api.clone(),
            "acme",
            false,
            notices.clone(),
            TaskEvents::new(),
        );
        controller.load().await.unwrap();

        let other = member(2, "sam");
        let outcome = controller.drag_end(&other, task.id, Some("pending")).await;
        assert_eq!(outcome, DragOutcome::Denied);
        assert_eq!(store.task(task.id).unwrap().status, TaskStatus::Todo);
        assert!(notices.current().is_some());
    }

    #[tokio::test]
    async fn test_stale_move_rolls_back_on_conflict() {
        let store = new_store();
        let addr = spawn_server(store.clone()).await;
        let api = client(addr);
        let task = api
            .create_task("acme", &new_task("Contested", TaskStatus::Todo, None))
            .await
            .unwrap();

        let controller = DragController::new(
            api.clone(),
            "acme",
            true,
            Notices::default(),
            TaskEvents::new(),
        );
        controller.load().await.unwrap();

        // Another client moves the task after our board was loaded.
        store
            .update_task_status(task.id, TaskStatus::Pending, None)
            .await
            .unwrap();

        let admin = User {
            id: 1,
            name: "root".into(),
            role: Role::Admin,
        };
        let outcome = controller.drag_end(&admin, task.id, Some("done")).await;
        assert_eq!(outcome, DragOutcome::RolledBack);
        let column = controller.board().locate(task.id).map(|(s, _)| s);
        assert_eq!(column, Some(TaskStatus::Todo));
        assert_eq!(store.task(task.id).unwrap().status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_error_bodies_map_to_store_errors() {
        let addr = spawn_server(new_store()).await;
        let api = client(addr);

        let err = api
            .update_task_status(404, TaskStatus::Done, None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = api
            .create_task("acme", &new_task(" ", TaskStatus::Todo, None))
            .await
            .unwrap_err();
        match err {
            StoreError::Http { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("title"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ai_card_probe_generate_and_regenerate() {
        let addr = spawn_server(new_store()).await;
        let api = client(addr);
        let key = ArtifactKey::commit("0badc0ffee");

        let miss = api
            .fetch_artifact(ArtifactKind::Explanation, &key, true)
            .await
            .unwrap_err();
        assert!(miss.is_not_found());

        let card = AiCard::new(
            ArtifactKind::Explanation,
            api.clone(),
            ArtifactKey::default(),
            CardOptions::default(),
        );
        assert!(!card.is_enabled());

        card.mount(key.clone()).await;
        assert_eq!(card.state(), CardState::Idle);

        let state = card.generate().await.unwrap();
        let first = state.artifact().unwrap().clone();
        assert!(!first.cached);
        assert!(first.content.contains("0badc0f"));

        // A second card for the same key finds the cached result silently.
        let other = AiCard::new(
            ArtifactKind::Explanation,
            api.clone(),
            key.clone(),
            CardOptions::default(),
        );
        other.probe().await;
        assert!(other.state().artifact().unwrap().cached);

        card.regenerate(&Preapproved(true)).await.unwrap();
        let regenerated = card.state().artifact().unwrap().clone();
        assert!(!regenerated.cached);
        assert!(regenerated.generated_at >= first.generated_at);
    }

    #[tokio::test]
    async fn test_report_export_produces_pdf() {
        let addr = spawn_server(new_store()).await;
        let api = client(addr);
        let new = new_task("Quarterly report", TaskStatus::InProgress, None);
        let task = api.create_task("acme", &new).await.unwrap();
        let commit = LinkedCommit {
            sha: "cafebabe1234".into(),
            message: "Add PDF export".into(),
            author: Some("dana".into()),
            url: None,
            linked_at: chrono::Utc::now(),
        };
        api.link_commit(task.id, &commit).await.unwrap();

        let key = ArtifactKey::task_commit(task.id, commit.sha.clone());
        let card = AiCard::new(
            ArtifactKind::Report,
            api.clone(),
            key,
            CardOptions::default(),
        );
        let state = card.generate().await.unwrap();
        let artifact = state.artifact().unwrap();
        assert!(artifact.content.contains("Add PDF export"));

        let meta = ExportMetadata {
            task_title: Some(task.title.clone()),
            task_readable_id: Some(task.readable_id.clone()),
            ..ExportMetadata::default()
        };
        let file = export_artifact_to_document(artifact, &meta).unwrap();
        assert!(file.bytes.starts_with(b"%PDF-1.4"));
        assert!(file.file_name.starts_with("aether-report-task1-cafebab-"));

        let dir = create_temp_project();
        let path = file.write_to(dir.path()).unwrap();
        assert!(path.exists());
    }
}

// =============================================================================
// CLI against the reference store
// =============================================================================

mod cli_roundtrip {
    use super::*;

    /// Runs the server on a background runtime for the duration of a test.
    fn background_server() -> (tokio::runtime::Runtime, String) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let addr = runtime.block_on(spawn_server(new_store()));
        (runtime, format!("http://{}", addr))
    }

    fn user_cmd(dir: &TempDir, url: &str) -> Command {
        let mut cmd = aether(dir);
        cmd.env("AETHER_API_URL", url)
            .env("AETHER_ORG", "acme")
            .env("AETHER_USER_ID", "7")
            .env("AETHER_ROLE", "member");
        cmd
    }

    #[test]
    fn test_create_move_and_show_board() {
        let (_runtime, url) = background_server();
        let dir = create_temp_project();

        user_cmd(&dir, &url)
            .args(["create", "Write docs", "--assignee", "7"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created ACME-1"));

        user_cmd(&dir, &url)
            .args(["move", "ACME-1", "in_progress"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Moved ACME-1 to In progress"));

        let output = user_cmd(&dir, &url)
            .args(["board", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let board: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(board["buckets"]["in_progress"]["count"], 1);
        assert_eq!(board["buckets"]["todo"]["count"], 0);
    }

    #[test]
    fn test_move_of_unassigned_task_is_denied() {
        let (_runtime, url) = background_server();
        let dir = create_temp_project();

        user_cmd(&dir, &url)
            .args(["create", "Someone else's"])
            .assert()
            .success();

        user_cmd(&dir, &url)
            .args(["move", "ACME-1", "done"])
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "You can only move tasks that are assigned to you.",
            ));
    }

    #[test]
    fn test_artifact_then_export() {
        let (_runtime, url) = background_server();
        let dir = create_temp_project();

        user_cmd(&dir, &url)
            .args(["create", "Explain me"])
            .assert()
            .success();
        user_cmd(&dir, &url)
            .args([
                "link-commit",
                "ACME-1",
                "feedface42",
                "-m",
                "Tidy rollback",
            ])
            .assert()
            .success();

        user_cmd(&dir, &url)
            .args(["export", "explanation", "--task", "ACME-1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("has been generated yet"));

        user_cmd(&dir, &url)
            .args(["artifact", "explanation", "--task", "ACME-1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Tidy rollback"));

        user_cmd(&dir, &url)
            .args([
                "export",
                "explanation",
                "--task",
                "ACME-1",
                "--out",
                "pdfs",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Exported commit explanation"));

        let exported: Vec<_> = std::fs::read_dir(dir.path().join("pdfs"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(exported.len(), 1);
        assert!(exported[0].starts_with("aether-explanation-task1-feedfac-"));
    }

    #[test]
    fn test_analysis_requires_commit() {
        let (_runtime, url) = background_server();
        let dir = create_temp_project();

        user_cmd(&dir, &url)
            .args(["create", "No commits yet"])
            .assert()
            .success();

        user_cmd(&dir, &url)
            .args(["artifact", "analysis", "--task", "ACME-1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("needs a selected commit"));
    }
}
