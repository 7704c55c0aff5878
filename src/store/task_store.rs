use rusqlite::{params, Connection};

use crate::clock::now_unix;
use crate::error::StoreError;
use crate::executor::{begin, commit, exec, query_all, query_one};
use crate::models::{Task, TaskStatus, TASK_COLUMNS};

// Numbering increments the plan's task_counter and reads it back in the
// same transaction, so a failed insert never leaves the counter ahead of
// the task rows.
pub fn create(
    conn: &mut Connection,
    plan_id: i64,
    title: &str,
    description: Option<&str>,
) -> Result<Task, StoreError> {
    if title.len() > 500 {
        return Err(StoreError::InvalidInput(
            "task title must be at most 500 characters".to_string(),
        ));
    }

    let txn = begin(conn)?;

    let affected = exec(
        &txn,
        "UPDATE plans SET task_counter = task_counter + 1 WHERE id = ?1",
        params![plan_id],
    )?;
    if affected != 1 {
        return Err(StoreError::InvalidData(format!("plan {plan_id} not found")));
    }

    let plan_task_number: i64 = txn
        .query_row(
            "SELECT task_counter FROM plans WHERE id = ?1",
            params![plan_id],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::StepFailed(e.to_string()))?;
    if plan_task_number > 999 {
        return Err(StoreError::InvalidData(format!(
            "plan {plan_id} has reached its 999-task limit"
        )));
    }

    let now = now_unix();
    exec(
        &txn,
        "INSERT INTO tasks (plan_id, plan_task_number, title, description, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 'open', ?5, ?5)",
        params![plan_id, plan_task_number, title, description, now],
    )?;
    let id = txn.last_insert_rowid();
    let task = get(&txn, id)?.ok_or_else(|| StoreError::InvalidData("task vanished after insert".to_string()))?;
    commit(txn)?;
    Ok(task)
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Task>, StoreError> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
    query_one(conn, &sql, params![id])
}

pub fn resolve_by_plan_and_number(
    conn: &Connection,
    plan_id: i64,
    number: i64,
) -> Result<Option<i64>, StoreError> {
    conn.query_row(
        "SELECT id FROM tasks WHERE plan_id = ?1 AND plan_task_number = ?2",
        params![plan_id, number],
        |row| row.get(0),
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(StoreError::from(other)),
    })
}

pub fn list(
    conn: &Connection,
    status: Option<TaskStatus>,
    plan_id: Option<i64>,
) -> Result<Vec<Task>, StoreError> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE (?1 IS NULL OR status = ?1)
           AND (?2 IS NULL OR plan_id = ?2)
         ORDER BY created_at ASC, id ASC"
    );
    let status_str = status.map(|s| s.as_str().to_string());
    query_all(conn, &sql, params![status_str, plan_id])
}

// started_at sticks once set; completed_at is set on entry to `completed`
// and cleared on any move out of it.
pub fn update(
    conn: &Connection,
    id: i64,
    title: Option<&str>,
    description: Option<Option<&str>>,
    status: Option<TaskStatus>,
) -> Result<Task, StoreError> {
    if title.is_none() && description.is_none() && status.is_none() {
        return Err(StoreError::InvalidInput(
            "update requires at least one field".to_string(),
        ));
    }
    if let Some(t) = title {
        if t.len() > 500 {
            return Err(StoreError::InvalidInput(
                "task title must be at most 500 characters".to_string(),
            ));
        }
    }
    let task = get(conn, id)?.ok_or_else(|| StoreError::InvalidData(format!("task {id} not found")))?;

    let now = now_unix();
    let new_title = title.unwrap_or(&task.title);
    let new_description = match description {
        Some(d) => d,
        None => task.description.as_deref(),
    };
    let new_status = status.unwrap_or(task.status);

    let started_at = match new_status {
        TaskStatus::Open => None,
        _ => Some(task.started_at.unwrap_or(now)),
    };
    let completed_at = match new_status {
        TaskStatus::Completed => Some(now),
        _ => None,
    };

    exec(
        conn,
        "UPDATE tasks SET title = ?1, description = ?2, status = ?3,
                started_at = ?4, completed_at = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            new_title,
            new_description,
            new_status.as_str(),
            started_at,
            completed_at,
            now,
            id
        ],
    )?;
    get(conn, id)?.ok_or_else(|| StoreError::InvalidData("task vanished after update".to_string()))
}

pub fn delete(conn: &Connection, id: i64) -> Result<(), StoreError> {
    let blockers: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM dependencies WHERE blocks_on_id = ?1",
            params![id],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::StepFailed(e.to_string()))?;
    if blockers > 0 {
        return Err(StoreError::InvalidData(format!(
            "task {id} is still a dependency of {blockers} other task(s)"
        )));
    }

    let affected = exec(conn, "DELETE FROM tasks WHERE id = ?1", params![id])?;
    if affected != 1 {
        return Err(StoreError::InvalidData(format!("task {id} not found")));
    }
    Ok(())
}
