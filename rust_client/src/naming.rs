//! Display names and URL helpers.

use crate::models::task::{Schedule, Task};

pub const SITE_NAME: &str = "Trojan Scheduler";

/// `"<title> | Trojan Scheduler"`.
pub fn format_title(title: &str) -> String {
    format!("{} | {}", title, SITE_NAME)
}

/// Join `path` onto `base` with exactly the separator `base` lacks.
pub fn join_url(base: &str, path: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

pub fn add_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

fn display_name(kind: &str, name: Option<&str>, id: Option<i64>, alt_id: Option<i64>) -> String {
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    match id.filter(|&i| i != 0).or(alt_id.filter(|&i| i != 0)) {
        Some(id) => format!("{} {}", kind, id),
        None => format!("{} ?", kind),
    }
}

/// The task's name, else `Task <id>`, else `Task ?`.
pub fn task_name(task: Option<&Task>, alt_id: Option<i64>) -> String {
    display_name(
        "Task",
        task.and_then(|t| t.name.as_deref()),
        task.map(|t| t.id),
        alt_id,
    )
}

/// The schedule's name, else `Schedule <id>`, else `Schedule ?`.
pub fn schedule_name(schedule: Option<&Schedule>, alt_id: Option<i64>) -> String {
    display_name(
        "Schedule",
        schedule.and_then(|s| s.name.as_deref()),
        schedule.map(|s| s.id),
        alt_id,
    )
}
