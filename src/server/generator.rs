use async_trait::async_trait;

use crate::artifact::models::{AnalysisDepth, ArtifactKey, ArtifactKind, GenerateOptions};
use crate::board::models::{LinkedCommit, Task, short_sha};
use crate::errors::StoreError;

/// What the store knows about the subject of a generation request.
#[derive(Debug, Clone, Default)]
pub struct GenerationContext {
    pub task: Option<Task>,
    pub commit: Option<LinkedCommit>,
}

/// Produces the text of an AI artifact.
///
/// The reference server ships `TemplateGenerator`; a deployment backed by a
/// model provider implements this trait instead.
#[async_trait]
pub trait ArtifactGenerator: Send + Sync {
    async fn generate(
        &self,
        kind: ArtifactKind,
        key: &ArtifactKey,
        context: &GenerationContext,
        options: &GenerateOptions,
    ) -> Result<String, StoreError>;
}

/// Deterministic markdown built from the task and commit metadata.
#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator;

#[async_trait]
impl ArtifactGenerator for TemplateGenerator {
    async fn generate(
        &self,
        kind: ArtifactKind,
        key: &ArtifactKey,
        context: &GenerationContext,
        options: &GenerateOptions,
    ) -> Result<String, StoreError> {
        Ok(render(kind, key, context, options))
    }
}

fn render(
    kind: ArtifactKind,
    key: &ArtifactKey,
    context: &GenerationContext,
    options: &GenerateOptions,
) -> String {
    let sha = key.commit_sha.as_deref().map(short_sha).unwrap_or("unknown");
    let message = context
        .commit
        .as_ref()
        .map(|c| c.message.trim())
        .filter(|m| !m.is_empty())
        .unwrap_or("No commit message recorded.");
    let author = context
        .commit
        .as_ref()
        .and_then(|c| c.author.as_deref())
        .unwrap_or("unknown author");
    let footer = format!(
        "_Language: {}, depth: {}_",
        options.language, options.depth
    );

    match kind {
        ArtifactKind::Explanation => format!(
            "# Commit {sha}\n\n\
             {message}\n\n\
             ## What changed\n\n\
             - Authored by {author}\n\
             - Summarised from the commit message and linked task\n\n\
             {footer}\n"
        ),
        ArtifactKind::Analysis => {
            let risk = match options.depth {
                AnalysisDepth::Quick => "not assessed",
                AnalysisDepth::Standard => "low",
                AnalysisDepth::Deep => "low, no hotspots found",
            };
            format!(
                "# Code analysis for {sha}\n\n\
                 **Risk:** {risk}\n\n\
                 ## Observations\n\n\
                 1. Commit message: {message}\n\
                 2. Author: {author}\n\n\
                 {footer}\n"
            )
        }
        ArtifactKind::Report => {
            let (title, status, description) = match &context.task {
                Some(task) => (
                    format!("{} {}", task.readable_id, task.title),
                    task.status.label(),
                    if task.description.trim().is_empty() {
                        "No description.".to_string()
                    } else {
                        task.description.trim().to_string()
                    },
                ),
                None => (
                    "Unknown task".to_string(),
                    "Unknown",
                    "No description.".to_string(),
                ),
            };
            let commits = context
                .task
                .as_ref()
                .map(|t| {
                    t.commits
                        .iter()
                        .map(|c| format!("- `{}` {}", c.short_sha(), c.message.trim()))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            let commits = if commits.is_empty() {
                "- none".to_string()
            } else {
                commits.join("\n")
            };
            format!(
                "# Task report: {title}\n\n\
                 **Status:** {status}\n\n\
                 {description}\n\n\
                 ## Linked commits\n\n\
                 {commits}\n\n\
                 ## Focus commit\n\n\
                 `{sha}` {message}\n\n\
                 {footer}\n"
            )
        }
    }
}
