//! Board view and moves: `aether board`, `aether move`.

use anyhow::{Context, Result};
use console::style;

use aether::board::controller::{DragController, DragOutcome};
use aether::board::events::TaskEvents;
use aether::board::models::TaskStatus;
use aether::board::notices::Notices;
use aether::board::store::TaskStore;
use aether::ui::icons::CHECK;
use aether::ui::{render_board, render_notice};

use super::Session;

pub async fn cmd_board(session: &Session, include_done: bool, json: bool) -> Result<()> {
    let include_done = include_done || session.config.toml.board.include_done;
    let map = session
        .client
        .fetch_bucket_map(session.config.org_id(), include_done)
        .await
        .context("Failed to load board")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        println!();
        println!(
            "{}",
            style(format!("Board: {}", session.config.org_id())).bold()
        );
        println!();
        print!("{}", render_board(&map));
    }
    Ok(())
}

pub async fn cmd_move(session: &Session, task_ref: &str, target: &str) -> Result<()> {
    let user = session.require_user()?;
    let notices = Notices::new(session.config.notice_ttl());
    let controller = DragController::new(
        session.client.clone(),
        session.config.org_id(),
        true,
        notices.clone(),
        TaskEvents::new(),
    );
    controller.load().await.context("Failed to load board")?;

    let board = controller.board();
    let task = board
        .find(task_ref)
        .cloned()
        .with_context(|| format!("Task '{}' is not on the board", task_ref))?;
    controller.drag_start(task.id);

    // Targets may be a column name or another task's readable id.
    let over_id = match (target.parse::<TaskStatus>(), board.find(target)) {
        (Ok(status), _) => status.as_str().to_string(),
        (Err(_), Some(other)) => other.id.to_string(),
        (Err(_), None) => target.to_string(),
    };

    let outcome = controller.drag_end(&user, task.id, Some(&over_id)).await;
    tracing::debug!(?outcome, task = %task.readable_id, target, "move finished");

    let notice = notices.current();
    match outcome {
        DragOutcome::Reconciled => {
            let to = controller
                .state()
                .locate(task.id)
                .map(|(status, _)| status.label())
                .unwrap_or("its new column");
            println!(
                "{}Moved {} to {}",
                CHECK, style(&task.readable_id).cyan(), to
            );
            Ok(())
        }
        DragOutcome::SameBucket => {
            println!("{} is already in {}", task.readable_id, task.status.label());
            Ok(())
        }
        DragOutcome::IntegrityWarning => {
            if let Some(notice) = notice {
                eprintln!("{}", render_notice(&notice));
            }
            Ok(())
        }
        DragOutcome::NoTarget => {
            anyhow::bail!("'{}' is not a column or a task on the board", target)
        }
        DragOutcome::UnknownTask => anyhow::bail!("Task '{}' is not on the board", task_ref),
        DragOutcome::Denied
        | DragOutcome::Busy
        | DragOutcome::RolledBack
        | DragOutcome::Discarded => match notice {
            Some(notice) => anyhow::bail!("{}", notice.message),
            None => anyhow::bail!("Move of {} was not applied", task.readable_id),
        },
    }
}
