use serde::{Deserialize, Serialize};

use crate::executor::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub plan_id: i64,
    pub plan_task_number: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub created_at: i64,
    pub updated_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
}

impl FromRow for Task {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let status_str: String = row.get(5)?;
        Ok(Task {
            id: row.get(0)?,
            plan_id: row.get(1)?,
            plan_task_number: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            status: TaskStatus::from_str(&status_str).unwrap_or(TaskStatus::Open),
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
            started_at: row.get(8)?,
            completed_at: row.get(9)?,
        })
    }
}

pub const TASK_COLUMNS: &str =
    "id, plan_id, plan_task_number, title, description, status, created_at, updated_at, started_at, completed_at";

/// A task together with its owning plan's slug, for external-ID formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskWithSlug {
    pub task: Task,
    pub plan_slug: String,
}

impl TaskWithSlug {
    pub fn external_id(&self) -> String {
        crate::identifiers::format_task_id(&self.plan_slug, self.task.plan_task_number)
    }
}

/// A task blocking (or blocked by) another, annotated with the shortest
/// chain depth to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthAnnotatedTask {
    pub task: Task,
    pub plan_slug: String,
    pub depth: i64,
}

/// A task that is not yet ready, paired with the number of its incomplete
/// blockers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedTask {
    pub task: Task,
    pub plan_slug: String,
    pub blocker_count: i64,
}
