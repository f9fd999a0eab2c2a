//! Confirmation seam for destructive actions.

use async_trait::async_trait;

pub const REGENERATE_PROMPT: &str =
    "Regenerate this result? This consumes AI credits and cannot be undone.";

#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt the same way (`--yes`, non-interactive sessions).
pub struct Preapproved(pub bool);

#[async_trait]
impl Confirm for Preapproved {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

/// Interactive terminal prompt. Defaults to "no".
pub struct TerminalConfirm;

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
        })
        .await;
        match answer {
            Ok(Ok(yes)) => yes,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "confirmation prompt failed; treating as declined");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "confirmation prompt task failed");
                false
            }
        }
    }
}
