use console::style;

use super::icons::{CROSS, INFO, WARN};
use crate::board::models::{BucketMap, Task};
use crate::board::notices::{Notice, NoticeKind};

/// One line per task: readable id, title, assignee and due date.
pub fn render_task(task: &Task) -> String {
    let mut line = format!(
        "{} {}",
        style(&task.readable_id).cyan(),
        task.title
    );
    if let Some(assignee) = task.assignee_id {
        line.push_str(&format!(" {}", style(format!("@{}", assignee)).dim()));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" {}", style(format!("due {}", due)).dim()));
    }
    if !task.commits.is_empty() {
        line.push_str(&format!(
            " {}",
            style(format!("[{} commit(s)]", task.commits.len())).dim()
        ));
    }
    line
}

/// The board as column headers with their tasks, in column order.
pub fn render_board(map: &BucketMap) -> String {
    let mut out = String::new();
    for (status, bucket) in &map.buckets {
        out.push_str(&format!(
            "{} {}\n",
            style(status.label()).bold(),
            style(format!("({})", bucket.count)).dim()
        ));
        if bucket.tasks.is_empty() {
            out.push_str(&format!("  {}\n", style("-").dim()));
        }
        for task in &bucket.tasks {
            out.push_str(&format!("  {}\n", render_task(task)));
        }
        out.push('\n');
    }
    out.push_str(&format!("{} task(s)\n", map.total));
    out
}

pub fn render_notice(notice: &Notice) -> String {
    match notice.kind {
        NoticeKind::PermissionDenied | NoticeKind::MoveFailed => {
            format!("{}{}", CROSS, style(&notice.message).red())
        }
        NoticeKind::IntegrityWarning | NoticeKind::Busy => {
            format!("{}{}", WARN, style(&notice.message).yellow())
        }
        NoticeKind::Info => format!("{}{}", INFO, notice.message),
    }
}
