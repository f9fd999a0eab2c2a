//! Task lifecycle commands: create, comment, link commits, archive.

use anyhow::{Context, Result};
use chrono::Utc;
use console::style;

use aether::artifact::confirm::Confirm;
use aether::board::models::{LinkedCommit, NewComment, NewTask, short_sha};
use aether::board::store::TaskStore;
use aether::ui::icons::CHECK;

use super::Session;

pub async fn cmd_create(session: &Session, new: &NewTask) -> Result<()> {
    let task = session
        .client
        .create_task(session.config.org_id(), new)
        .await
        .context("Failed to create task")?;
    println!(
        "{}Created {} {} in {}",
        CHECK,
        style(&task.readable_id).cyan(),
        task.title,
        task.status.label()
    );
    Ok(())
}

pub async fn cmd_comment_add(session: &Session, task_ref: &str, body: &str) -> Result<()> {
    let user = session.require_user()?;
    let task = session.find_task(task_ref).await?;
    let comment = session
        .client
        .add_comment(
            task.id,
            &NewComment {
                author_id: user.id,
                body: body.to_string(),
                attachments: vec![],
            },
        )
        .await
        .context("Failed to add comment")?;
    println!(
        "{}Commented on {} ({})",
        CHECK,
        style(&task.readable_id).cyan(),
        style(&comment.id).dim()
    );
    Ok(())
}

pub async fn cmd_comment_delete(session: &Session, task_ref: &str, comment_id: &str) -> Result<()> {
    let task = session.find_task(task_ref).await?;
    session
        .client
        .delete_comment(task.id, comment_id)
        .await
        .context("Failed to delete comment")?;
    println!("{}Deleted comment {}", CHECK, comment_id);
    Ok(())
}

pub async fn cmd_link_commit(
    session: &Session,
    task_ref: &str,
    sha: &str,
    message: Option<String>,
    author: Option<String>,
    url: Option<String>,
) -> Result<()> {
    let task = session.find_task(task_ref).await?;
    let commit = LinkedCommit {
        sha: sha.trim().to_string(),
        message: message.unwrap_or_default(),
        author,
        url,
        linked_at: Utc::now(),
    };
    let task = session
        .client
        .link_commit(task.id, &commit)
        .await
        .context("Failed to link commit")?;
    println!(
        "{}Linked {} to {} ({} commit(s))",
        CHECK,
        short_sha(&commit.sha),
        style(&task.readable_id).cyan(),
        task.commits.len()
    );
    Ok(())
}

pub async fn cmd_archive(session: &Session, task_ref: &str) -> Result<()> {
    let task = session.find_task(task_ref).await?;
    let prompt = format!("Archive {} \"{}\"?", task.readable_id, task.title);
    if !session.confirmer().confirm(&prompt).await {
        println!("Archive cancelled.");
        return Ok(());
    }
    session
        .client
        .archive_task(task.id)
        .await
        .context("Failed to archive task")?;
    println!("{}Archived {}", CHECK, style(&task.readable_id).cyan());
    Ok(())
}
