use serde::{Deserialize, Serialize};

use crate::executor::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Open,
    InProgress,
    Completed,
}

impl PlanStatus {
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
pub struct Plan {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub status: PlanStatus,
    pub task_counter: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub execution_started_at: Option<i64>,
    pub completed_at: Option<i64>,
}

impl FromRow for Plan {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let status_str: String = row.get(4)?;
        Ok(Plan {
            id: row.get(0)?,
            slug: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            status: PlanStatus::from_str(&status_str).unwrap_or(PlanStatus::Open),
            task_counter: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
            execution_started_at: row.get(8)?,
            completed_at: row.get(9)?,
        })
    }
}

pub const PLAN_COLUMNS: &str =
    "id, slug, title, description, status, task_counter, created_at, updated_at, execution_started_at, completed_at";

/// Per-status task counts, aggregated for a single plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskCounts {
    pub open: i64,
    pub in_progress: i64,
    pub completed: i64,
}

impl TaskCounts {
    pub fn total(&self) -> i64 {
        self.open + self.in_progress + self.completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub plan: Plan,
    pub tasks: TaskCounts,
}
