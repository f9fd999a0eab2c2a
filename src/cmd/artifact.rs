//! AI artifact commands: `aether artifact`, `aether export`.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;

use aether::artifact::card::{AiCard, CardState, RegenerateOutcome};
use aether::artifact::models::{AnalysisDepth, Artifact, ArtifactKey, ArtifactKind};
use aether::board::models::Task;
use aether::export::{ExportMetadata, export_artifact_to_document};
use aether::ui::GenerationSpinner;
use aether::ui::icons::{CACHED, CHECK, DOCUMENT, SPARKLE};

use super::Session;
use crate::ArtifactTarget;

const SPINNER_TICK: Duration = Duration::from_millis(150);

/// Resolve the artifact key. Without `--commit`, the task's most recently
/// linked commit is used.
async fn resolve_target(
    session: &Session,
    target: &ArtifactTarget,
) -> Result<(ArtifactKey, Option<Task>)> {
    let task = match &target.task {
        Some(reference) => Some(session.find_task(reference).await?),
        None => None,
    };
    let commit = target.commit.clone().or_else(|| {
        task.as_ref().and_then(|t| {
            t.commits
                .iter()
                .max_by_key(|c| c.linked_at)
                .map(|c| c.sha.clone())
        })
    });
    let key = ArtifactKey::new(task.as_ref().map(|t| t.id), commit);
    Ok((key, task))
}

/// Drive `fut` to completion, showing a spinner with the card's rotating
/// message whenever the card is loading.
async fn with_spinner<T>(card: &AiCard, fut: impl Future<Output = T>) -> T {
    tokio::pin!(fut);
    let mut spinner: Option<GenerationSpinner> = None;
    let mut ticker = tokio::time::interval(SPINNER_TICK);
    let out = loop {
        tokio::select! {
            out = &mut fut => break out,
            _ = ticker.tick() => {
                if let Some(message) = card.loading_message() {
                    spinner
                        .get_or_insert_with(|| GenerationSpinner::new(message))
                        .set_message(message);
                }
            }
        }
    };
    if let Some(spinner) = spinner {
        match card.state() {
            CardState::Completed(_) => spinner.finish_ok("Done"),
            _ => spinner.finish_err("Generation failed"),
        }
    }
    out
}

fn print_artifact(artifact: &Artifact) {
    println!();
    let badge = if artifact.cached {
        format!(" {}", style(format!("{}cached", CACHED)).dim())
    } else {
        String::new()
    };
    println!(
        "{}{} {}{}",
        SPARKLE,
        style(artifact.kind.title()).bold(),
        style(artifact.key.fragment()).cyan(),
        badge
    );
    println!(
        "{}",
        style(format!(
            "Generated {}",
            artifact.generated_at.format("%Y-%m-%d %H:%M UTC")
        ))
        .dim()
    );
    println!();
    println!("{}", artifact.content.trim_end());
    println!();
}

pub async fn cmd_artifact(
    session: &Session,
    kind: ArtifactKind,
    target: &ArtifactTarget,
    regenerate: bool,
    language: Option<String>,
    depth: Option<AnalysisDepth>,
) -> Result<()> {
    let (key, _task) = resolve_target(session, target).await?;

    let mut options = session.config.card_options();
    if let Some(language) = language {
        options.language = language;
    }
    if let Some(depth) = depth {
        options.depth = depth;
    }

    let card = AiCard::new(
        kind,
        session.client.clone(),
        ArtifactKey::default(),
        options,
    );
    card.mount(key).await;

    match card.state() {
        CardState::Disabled { reason } => anyhow::bail!(reason),
        CardState::Completed(_) if regenerate => {
            let confirm = session.confirmer();
            let outcome = with_spinner(&card, card.regenerate(confirm.as_ref())).await?;
            if outcome == RegenerateOutcome::Declined {
                println!("Kept the existing {}.", kind.label());
            }
        }
        CardState::Idle => {
            with_spinner(&card, card.generate()).await?;
        }
        _ => {}
    }

    match card.state() {
        CardState::Completed(artifact) => {
            print_artifact(&artifact);
            Ok(())
        }
        CardState::Error { message } => {
            anyhow::bail!("Failed to generate {}: {}", kind.label(), message)
        }
        other => anyhow::bail!("Unexpected card state: {}", other.name()),
    }
}

pub async fn cmd_export(
    session: &Session,
    kind: ArtifactKind,
    target: &ArtifactTarget,
    out: Option<PathBuf>,
) -> Result<()> {
    let (key, task) = resolve_target(session, target).await?;
    let card = AiCard::new(
        kind,
        session.client.clone(),
        ArtifactKey::default(),
        session.config.card_options(),
    );
    card.mount(key).await;

    let artifact = match card.state() {
        CardState::Completed(artifact) => artifact,
        CardState::Disabled { reason } => anyhow::bail!(reason),
        _ => anyhow::bail!(
            "No {} has been generated yet. Run 'aether artifact {}' first.",
            kind.label(),
            kind.as_str()
        ),
    };

    let export = &session.config.toml.export;
    let meta = ExportMetadata {
        task_title: task.as_ref().map(|t| t.title.clone()),
        task_readable_id: task.as_ref().map(|t| t.readable_id.clone()),
        repository: task.as_ref().and_then(|t| t.repository.clone()),
        author: export
            .author
            .clone()
            .or_else(|| session.config.toml.user.name.clone()),
    };
    let file = export_artifact_to_document(&artifact, &meta)?;
    let dir = out.unwrap_or_else(|| session.config.export_dir());
    let path = file
        .write_to(&dir)
        .with_context(|| format!("Failed to export {}", kind.label()))?;

    println!(
        "{}{}Exported {} ({} page(s)) to {}",
        CHECK,
        DOCUMENT,
        kind.label(),
        file.page_count,
        path.display()
    );
    Ok(())
}
