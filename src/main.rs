use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use aether::artifact::models::{AnalysisDepth, ArtifactKind};
use aether::board::models::{NewTask, TaskStatus, UserId};
use aether::logging::{LogConfig, init_logging};

mod cmd;

#[derive(Parser)]
#[command(name = "aether")]
#[command(
    version,
    about = "Team task board: Kanban moves, AI commit insights and PDF export"
)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Answer yes to every confirmation prompt
    #[arg(long, global = true)]
    pub yes: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Task store base URL. Overrides aether.toml and AETHER_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Also write JSON logs to a daily-rolling file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the board, one column per status
    Board {
        /// Include the Done column
        #[arg(long)]
        include_done: bool,
        /// Print the raw bucket map as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a task to another column (what a drag and drop does)
    Move {
        /// Task id or readable id (e.g. ACME-3)
        task: String,
        /// Target column (e.g. in_progress) or a task already in that column
        target: String,
    },
    /// Create a task
    Create {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        assignee: Option<UserId>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        repository: Option<String>,
    },
    /// Add or delete task comments
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },
    /// Link a git commit to a task
    LinkCommit {
        task: String,
        sha: String,
        #[arg(short, long)]
        message: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
    /// Archive a task (removes it from the board)
    Archive { task: String },
    /// Show an AI artifact, generating it on request
    Artifact {
        /// explanation, analysis or report
        kind: ArtifactKind,
        #[command(flatten)]
        target: ArtifactTarget,
        /// Discard the cached result and generate a new one
        #[arg(long)]
        regenerate: bool,
        /// Output language (e.g. en, fr)
        #[arg(long)]
        language: Option<String>,
        /// Analysis depth: quick, standard, deep
        #[arg(long)]
        depth: Option<AnalysisDepth>,
    },
    /// Export a generated AI artifact to PDF
    Export {
        kind: ArtifactKind,
        #[command(flatten)]
        target: ArtifactTarget,
        /// Output directory (defaults to [export] output_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Run the in-memory reference task store
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
        #[arg(long)]
        host: Option<String>,
        /// Fill the configured org with demo tasks
        #[arg(long)]
        seed: bool,
        /// Allow cross-origin requests
        #[arg(long)]
        cors: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

/// Which task and commit an artifact is about.
#[derive(clap::Args, Clone, Debug)]
pub struct ArtifactTarget {
    /// Task id or readable id
    #[arg(long)]
    pub task: Option<String>,
    /// Commit sha (defaults to the task's most recently linked commit)
    #[arg(long)]
    pub commit: Option<String>,
}

#[derive(Subcommand, Clone)]
pub enum CommentCommands {
    /// Add a comment as the configured user
    Add { task: String, body: String },
    /// Delete a comment by id
    Delete { task: String, comment_id: String },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default aether.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    // A missing .env is normal.
    let _ = dotenvy::from_path(project_dir.join(".env"));

    let _log_guard = init_logging(LogConfig {
        verbose: cli.verbose,
        json: cli.json_logs,
        log_dir: cli.log_dir.clone(),
    })?;

    let session = || cmd::Session::open(&cli, &project_dir);

    match &cli.command {
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
        Commands::Serve {
            port,
            host,
            seed,
            cors,
        } => {
            let config = cmd::load_config(&cli, &project_dir)?;
            cmd::cmd_serve(&config, *port, host.clone(), *seed, *cors).await?;
        }
        Commands::Board { include_done, json } => {
            cmd::cmd_board(&session()?, *include_done, *json).await?
        }
        Commands::Move { task, target } => cmd::cmd_move(&session()?, task, target).await?,
        Commands::Create {
            title,
            description,
            status,
            assignee,
            due,
            repository,
        } => {
            let new = NewTask {
                title: title.clone(),
                description: description.clone(),
                status: *status,
                assignee_id: *assignee,
                due_date: *due,
                repository: repository.clone(),
            };
            cmd::cmd_create(&session()?, &new).await?
        }
        Commands::Comment { command } => match command {
            CommentCommands::Add { task, body } => {
                cmd::cmd_comment_add(&session()?, task, body).await?
            }
            CommentCommands::Delete { task, comment_id } => {
                cmd::cmd_comment_delete(&session()?, task, comment_id).await?
            }
        },
        Commands::LinkCommit {
            task,
            sha,
            message,
            author,
            url,
        } => {
            cmd::cmd_link_commit(
                &session()?,
                task,
                sha,
                message.clone(),
                author.clone(),
                url.clone(),
            )
            .await?
        }
        Commands::Archive { task } => cmd::cmd_archive(&session()?, task).await?,
        Commands::Artifact {
            kind,
            target,
            regenerate,
            language,
            depth,
        } => {
            cmd::cmd_artifact(
                &session()?,
                *kind,
                target,
                *regenerate,
                language.clone(),
                *depth,
            )
            .await?
        }
        Commands::Export { kind, target, out } => {
            cmd::cmd_export(&session()?, *kind, target, out.clone()).await?
        }
    }

    Ok(())
}
