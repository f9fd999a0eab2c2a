//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module     | Commands handled                                   |
//! |------------|----------------------------------------------------|
//! | `board`    | `Board`, `Move`                                    |
//! | `task`     | `Create`, `Comment`, `LinkCommit`, `Archive`       |
//! | `artifact` | `Artifact`, `Export`                               |
//! | `serve`    | `Serve`                                            |
//! | `config`   | `Config`                                           |

pub mod artifact;
pub mod board;
pub mod config;
pub mod serve;
pub mod task;

pub use artifact::{cmd_artifact, cmd_export};
pub use board::{cmd_board, cmd_move};
pub use config::cmd_config;
pub use serve::cmd_serve;
pub use task::{cmd_archive, cmd_comment_add, cmd_comment_delete, cmd_create, cmd_link_commit};

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use aether::artifact::confirm::{Confirm, Preapproved, TerminalConfirm};
use aether::board::models::{Task, User};
use aether::board::store::TaskStore;
use aether::client::ApiClient;
use aether::config::{AetherConfig, CliOverrides};

use super::Cli;

pub fn load_config(cli: &Cli, project_dir: &Path) -> Result<AetherConfig> {
    AetherConfig::with_cli_args(
        project_dir.to_path_buf(),
        CliOverrides {
            api_url: cli.api_url.clone(),
            verbose: cli.verbose,
            yes: cli.yes,
        },
    )
}

/// Resolved configuration plus a client for the configured store.
pub struct Session {
    pub config: AetherConfig,
    pub client: Arc<ApiClient>,
}

impl Session {
    pub fn open(cli: &Cli, project_dir: &Path) -> Result<Self> {
        let config = load_config(cli, project_dir)?;
        let client = ApiClient::new(config.client_config()).context("Failed to build HTTP client")?;
        tracing::debug!(
            base_url = client.base_url(),
            org = config.org_id(),
            "session opened"
        );
        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    /// The acting user; board changes need one.
    pub fn require_user(&self) -> Result<User> {
        self.config.user().context(
            "No user configured. Set [user] id in aether.toml or AETHER_USER_ID.",
        )
    }

    /// Find a task on the org's board (Done column included).
    pub async fn find_task(&self, reference: &str) -> Result<Task> {
        let map = self
            .client
            .fetch_bucket_map(self.config.org_id(), true)
            .await
            .context("Failed to load board")?;
        map.find(reference)
            .cloned()
            .with_context(|| {
                format!(
                    "Task '{}' is not on the {} board",
                    reference,
                    self.config.org_id()
                )
            })
    }

    pub fn confirmer(&self) -> Box<dyn Confirm> {
        if self.config.yes {
            Box::new(Preapproved(true))
        } else {
            Box::new(TerminalConfirm)
        }
    }
}
