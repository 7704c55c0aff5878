use rusqlite::{params, Connection};

use crate::clock::now_unix;
use crate::error::StoreError;
use crate::executor::{exec, query_all, query_one};
use crate::identifiers::validate_slug;
use crate::models::{Plan, PlanStatus, PlanSummary, TaskCounts, PLAN_COLUMNS};

pub fn create(
    conn: &Connection,
    slug: &str,
    title: &str,
    description: Option<&str>,
) -> Result<Plan, StoreError> {
    validate_slug(slug)?;
    if title.len() > 500 {
        return Err(StoreError::InvalidInput(
            "plan title must be at most 500 characters".to_string(),
        ));
    }

    let now = now_unix();
    let sql = format!(
        "INSERT INTO plans (slug, title, description, status, task_counter, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'open', 0, ?4, ?4)"
    );
    exec(conn, &sql, params![slug, title, description, now]).map_err(|e| match e {
        StoreError::StepFailed(msg) if msg.contains("UNIQUE") => {
            StoreError::InvalidData(format!("plan slug '{slug}' already exists"))
        }
        other => other,
    })?;

    let id = conn.last_insert_rowid();
    get_by_id(conn, id)?.ok_or_else(|| StoreError::InvalidData("plan vanished after insert".to_string()))
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Plan>, StoreError> {
    let sql = format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = ?1");
    query_one(conn, &sql, params![id])
}

pub fn get_by_slug(conn: &Connection, slug: &str) -> Result<Option<Plan>, StoreError> {
    let sql = format!("SELECT {PLAN_COLUMNS} FROM plans WHERE slug = ?1");
    query_one(conn, &sql, params![slug])
}

fn task_counts(conn: &Connection, plan_id: i64) -> Result<TaskCounts, StoreError> {
    let mut counts = TaskCounts::default();
    let sql = "SELECT status, COUNT(*) FROM tasks WHERE plan_id = ?1 GROUP BY status";
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| StoreError::PrepareStatementFailed(e.to_string()))?;
    let rows = stmt
        .query_map(params![plan_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(|e| StoreError::BindFailed(e.to_string()))?;
    for row in rows {
        let (status, count) = row.map_err(|e| StoreError::StepFailed(e.to_string()))?;
        match status.as_str() {
            "open" => counts.open = count,
            "in_progress" => counts.in_progress = count,
            "completed" => counts.completed = count,
            _ => {}
        }
    }
    Ok(counts)
}

pub fn get_summary(conn: &Connection, slug: &str) -> Result<Option<PlanSummary>, StoreError> {
    let Some(plan) = get_by_slug(conn, slug)? else {
        return Ok(None);
    };
    let tasks = task_counts(conn, plan.id)?;
    Ok(Some(PlanSummary { plan, tasks }))
}

pub fn list(conn: &Connection, status: Option<PlanStatus>) -> Result<Vec<PlanSummary>, StoreError> {
    let sql = format!(
        "SELECT {PLAN_COLUMNS} FROM plans
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY created_at ASC, id ASC"
    );
    let status_str = status.map(|s| s.as_str().to_string());
    let plans: Vec<Plan> = query_all(conn, &sql, params![status_str])?;
    plans
        .into_iter()
        .map(|plan| {
            let tasks = task_counts(conn, plan.id)?;
            Ok(PlanSummary { plan, tasks })
        })
        .collect()
}

pub fn update(
    conn: &Connection,
    slug: &str,
    title: Option<&str>,
    description: Option<Option<&str>>,
) -> Result<Plan, StoreError> {
    if title.is_none() && description.is_none() {
        return Err(StoreError::InvalidInput(
            "update requires at least one field".to_string(),
        ));
    }
    if let Some(t) = title {
        if t.len() > 500 {
            return Err(StoreError::InvalidInput(
                "plan title must be at most 500 characters".to_string(),
            ));
        }
    }
    let plan = get_by_slug(conn, slug)?.ok_or_else(|| StoreError::InvalidData(format!("plan '{slug}' not found")))?;

    let now = now_unix();
    let new_title = title.unwrap_or(&plan.title);
    let new_description = match description {
        Some(d) => d,
        None => plan.description.as_deref(),
    };

    exec(
        conn,
        "UPDATE plans SET title = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
        params![new_title, new_description, now, plan.id],
    )?;
    get_by_id(conn, plan.id)?.ok_or_else(|| StoreError::InvalidData("plan vanished after update".to_string()))
}

pub fn delete(conn: &Connection, slug: &str) -> Result<usize, StoreError> {
    exec(conn, "DELETE FROM plans WHERE slug = ?1", params![slug])
}

// Only task_store drives plan status past this point, so the start/complete
// transitions stay out of this module's public surface.
pub fn mark_execution_started(conn: &Connection, plan_id: i64) -> Result<(), StoreError> {
    let now = now_unix();
    exec(
        conn,
        "UPDATE plans SET status = 'in_progress', execution_started_at = ?1, updated_at = ?1
         WHERE id = ?2 AND execution_started_at IS NULL",
        params![now, plan_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{configure_connection, run_migrations};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        configure_connection(&conn).unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn create_rejects_duplicate_slug() {
        let conn = test_conn();
        create(&conn, "auth", "Auth", None).unwrap();
        let err = create(&conn, "auth", "Auth Again", None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[test]
    fn create_rejects_bad_slug() {
        let conn = test_conn();
        assert!(matches!(create(&conn, "Auth", "x", None), Err(StoreError::InvalidKebabCase(_))));
        assert!(matches!(create(&conn, "", "x", None), Err(StoreError::EmptyId)));
    }

    #[test]
    fn get_summary_counts_tasks_by_status() {
        let mut conn = test_conn();
        let plan = create(&conn, "auth", "Auth", None).unwrap();
        crate::store::task_store::create(&mut conn, plan.id, "t1", None).unwrap();
        crate::store::task_store::create(&mut conn, plan.id, "t2", None).unwrap();

        let summary = get_summary(&conn, "auth").unwrap().unwrap();
        assert_eq!(summary.tasks.open, 2);
        assert_eq!(summary.tasks.total(), 2);
    }

    #[test]
    fn mark_execution_started_is_idempotent() {
        let conn = test_conn();
        let plan = create(&conn, "auth", "Auth", None).unwrap();
        mark_execution_started(&conn, plan.id).unwrap();
        let first = get_by_id(&conn, plan.id).unwrap().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1));
        mark_execution_started(&conn, plan.id).unwrap();
        let second = get_by_id(&conn, plan.id).unwrap().unwrap();
        assert_eq!(first.execution_started_at, second.execution_started_at);
        assert_eq!(second.status, PlanStatus::InProgress);
    }

    #[test]
    fn update_requires_at_least_one_field() {
        let conn = test_conn();
        create(&conn, "auth", "Auth", None).unwrap();
        assert!(matches!(update(&conn, "auth", None, None), Err(StoreError::InvalidInput(_))));
    }

    #[test]
    fn delete_cascades_to_tasks() {
        let mut conn = test_conn();
        let plan = create(&conn, "auth", "Auth", None).unwrap();
        crate::store::task_store::create(&mut conn, plan.id, "t1", None).unwrap();
        delete(&conn, "auth").unwrap();
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM tasks WHERE plan_id = ?1", params![plan.id], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
