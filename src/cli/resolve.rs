//! Smart-ID resolution: a bare id or `slug:NNN` resolves to an internal
//! task id; its owning plan slug is looked up alongside it since most
//! output needs to format the external id back out again.

use rusqlite::Connection;

use crate::error::StoreError;
use crate::identifiers::{parse_task_id, TaskRef};
use crate::models::{PlanStatus, Task, TaskStatus, TaskWithSlug};
use crate::store::{plan_store, task_store};

pub fn resolve_task(conn: &Connection, id: &str) -> Result<TaskWithSlug, StoreError> {
    let internal_id = match parse_task_id(id)? {
        TaskRef::Internal(n) => n,
        TaskRef::Formatted { slug, number } => {
            let plan = plan_store::get_by_slug(conn, &slug)?
                .ok_or_else(|| StoreError::InvalidData(format!("plan '{slug}' not found")))?;
            task_store::resolve_by_plan_and_number(conn, plan.id, number)?
                .ok_or_else(|| StoreError::InvalidData(format!("task '{id}' not found")))?
        }
    };
    let task = task_store::get(conn, internal_id)?
        .ok_or_else(|| StoreError::InvalidData(format!("task '{id}' not found")))?;
    let plan = plan_store::get_by_id(conn, task.plan_id)?
        .ok_or_else(|| StoreError::InvalidData(format!("task {internal_id} has no owning plan")))?;
    Ok(TaskWithSlug { task, plan_slug: plan.slug })
}

pub fn attach_slug(conn: &Connection, task: Task) -> Result<TaskWithSlug, StoreError> {
    let plan = plan_store::get_by_id(conn, task.plan_id)?
        .ok_or_else(|| StoreError::InvalidData(format!("task {} has no owning plan", task.id)))?;
    Ok(TaskWithSlug { task, plan_slug: plan.slug })
}

pub fn parse_status(s: &str) -> Result<TaskStatus, StoreError> {
    TaskStatus::from_str(s).ok_or_else(|| {
        StoreError::InvalidInput(format!(
            "invalid status '{s}', expected one of: open, in_progress, completed"
        ))
    })
}

pub fn parse_plan_status(s: &str) -> Result<PlanStatus, StoreError> {
    PlanStatus::from_str(s).ok_or_else(|| {
        StoreError::InvalidInput(format!(
            "invalid status '{s}', expected one of: open, in_progress, completed"
        ))
    })
}
