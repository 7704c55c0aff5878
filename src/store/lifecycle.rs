use rusqlite::{params, Connection};

use crate::clock::now_unix;
use crate::error::StoreError;
use crate::executor::{begin, commit, exec};
use crate::store::plan_store;

pub fn start(conn: &mut Connection, task_id: i64) -> Result<(), StoreError> {
    let txn = begin(conn)?;
    let now = now_unix();
    let affected = exec(
        &txn,
        "UPDATE tasks SET status = 'in_progress', started_at = ?1, updated_at = ?1
         WHERE id = ?2 AND status = 'open'",
        params![now, task_id],
    )?;
    if affected != 1 {
        return Err(StoreError::InvalidData(format!(
            "task {task_id} is not open (missing, or already started/completed)"
        )));
    }

    let plan_id: i64 = txn
        .query_row("SELECT plan_id FROM tasks WHERE id = ?1", params![task_id], |row| {
            row.get(0)
        })
        .map_err(|e| StoreError::StepFailed(e.to_string()))?;
    plan_store::mark_execution_started(&txn, plan_id)?;
    commit(txn)?;
    tracing::debug!(task_id, plan_id, "task started");
    Ok(())
}

pub fn complete(conn: &mut Connection, task_id: i64) -> Result<(), StoreError> {
    let txn = begin(conn)?;
    let now = now_unix();
    let affected = exec(
        &txn,
        "UPDATE tasks SET status = 'completed', completed_at = ?1, updated_at = ?1
         WHERE id = ?2 AND status = 'in_progress'",
        params![now, task_id],
    )?;
    if affected != 1 {
        return Err(StoreError::InvalidData(format!(
            "task {task_id} is not in_progress (missing, or not started/already completed)"
        )));
    }

    let plan_id: i64 = txn
        .query_row("SELECT plan_id FROM tasks WHERE id = ?1", params![task_id], |row| {
            row.get(0)
        })
        .map_err(|e| StoreError::StepFailed(e.to_string()))?;
    cascade_plan_completion(&txn, plan_id)?;
    commit(txn)?;
    tracing::debug!(task_id, plan_id, "task completed");
    Ok(())
}

fn cascade_plan_completion(conn: &Connection, plan_id: i64) -> Result<(), StoreError> {
    let now = now_unix();
    let affected = exec(
        conn,
        "UPDATE plans SET status = 'completed', completed_at = ?1, updated_at = ?1
         WHERE id = ?2
           AND NOT EXISTS (SELECT 1 FROM tasks WHERE plan_id = plans.id AND status != 'completed')",
        params![now, plan_id],
    )?;
    if affected == 1 {
        tracing::debug!(plan_id, "plan completed");
    }
    Ok(())
}

// Skips the plan-completion cascade by default; pass cascade_plans=true to
// run one cascade pass per distinct plan touched after the batch completes.
pub fn complete_bulk(
    conn: &mut Connection,
    task_ids: &[i64],
    cascade_plans: bool,
) -> Result<(), StoreError> {
    if task_ids.is_empty() || task_ids.len() > 1000 {
        return Err(StoreError::InvalidInput(
            "complete_bulk requires between 1 and 1000 task ids".to_string(),
        ));
    }

    let txn = begin(conn)?;
    let now = now_unix();
    let mut touched_plans = Vec::new();
    for &task_id in task_ids {
        let affected = exec(
            &txn,
            "UPDATE tasks SET status = 'completed', completed_at = ?1, updated_at = ?1
             WHERE id = ?2 AND status = 'in_progress'",
            params![now, task_id],
        )?;
        if affected != 1 {
            return Err(StoreError::InvalidData(format!(
                "task {task_id} is not in_progress (missing, or not started/already completed)"
            )));
        }
        if cascade_plans {
            let plan_id: i64 = txn
                .query_row("SELECT plan_id FROM tasks WHERE id = ?1", params![task_id], |row| {
                    row.get(0)
                })
                .map_err(|e| StoreError::StepFailed(e.to_string()))?;
            touched_plans.push(plan_id);
        }
    }

    if cascade_plans {
        touched_plans.sort_unstable();
        touched_plans.dedup();
        for plan_id in touched_plans {
            cascade_plan_completion(&txn, plan_id)?;
        }
    }

    commit(txn)?;
    tracing::debug!(count = task_ids.len(), "bulk completed tasks");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlanStatus, TaskStatus};
    use crate::schema::{configure_connection, run_migrations};
    use crate::store::{plan_store, task_store};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        configure_connection(&conn).unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn single_task_plan_completes_end_to_end() {
        let mut conn = test_conn();
        let plan = plan_store::create(&conn, "p", "P", None).unwrap();
        let t = task_store::create(&mut conn, plan.id, "t1", None).unwrap();

        start(&mut conn, t.id).unwrap();
        let after_start = plan_store::get_by_id(&conn, plan.id).unwrap().unwrap();
        assert!(after_start.execution_started_at.is_some());
        assert_eq!(after_start.status, PlanStatus::InProgress);

        complete(&mut conn, t.id).unwrap();
        let after_complete = plan_store::get_by_id(&conn, plan.id).unwrap().unwrap();
        assert_eq!(after_complete.status, PlanStatus::Completed);
        assert!(after_complete.completed_at.is_some());
    }

    #[test]
    fn start_rejects_non_open_task() {
        let mut conn = test_conn();
        let plan = plan_store::create(&conn, "p", "P", None).unwrap();
        let t = task_store::create(&mut conn, plan.id, "t1", None).unwrap();
        start(&mut conn, t.id).unwrap();
        assert!(matches!(start(&mut conn, t.id), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn complete_rejects_task_not_in_progress() {
        let mut conn = test_conn();
        let plan = plan_store::create(&conn, "p", "P", None).unwrap();
        let t = task_store::create(&mut conn, plan.id, "t1", None).unwrap();
        assert!(matches!(complete(&mut conn, t.id), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn complete_bulk_is_atomic_on_failure() {
        let mut conn = test_conn();
        let plan = plan_store::create(&conn, "p", "P", None).unwrap();
        let t1 = task_store::create(&mut conn, plan.id, "t1", None).unwrap();
        let t2 = task_store::create(&mut conn, plan.id, "t2", None).unwrap();
        let t3 = task_store::create(&mut conn, plan.id, "t3", None).unwrap();
        start(&mut conn, t1.id).unwrap();
        start(&mut conn, t2.id).unwrap();
        start(&mut conn, t3.id).unwrap();

        let err = complete_bulk(&mut conn, &[t1.id, t2.id, 999_999], false);
        assert!(err.is_err());

        for t in [&t1, &t2, &t3] {
            let refreshed = task_store::get(&conn, t.id).unwrap().unwrap();
            assert_eq!(refreshed.status, TaskStatus::InProgress);
        }
    }

    #[test]
    fn complete_bulk_skips_cascade_by_default() {
        let mut conn = test_conn();
        let plan = plan_store::create(&conn, "p", "P", None).unwrap();
        let t1 = task_store::create(&mut conn, plan.id, "t1", None).unwrap();
        start(&mut conn, t1.id).unwrap();

        complete_bulk(&mut conn, &[t1.id], false).unwrap();
        let plan_after = plan_store::get_by_id(&conn, plan.id).unwrap().unwrap();
        assert_eq!(plan_after.status, PlanStatus::InProgress);

        complete_bulk(&mut conn, &[], true).unwrap_err();
    }

    #[test]
    fn complete_bulk_with_cascade_completes_plan() {
        let mut conn = test_conn();
        let plan = plan_store::create(&conn, "p", "P", None).unwrap();
        let t1 = task_store::create(&mut conn, plan.id, "t1", None).unwrap();
        start(&mut conn, t1.id).unwrap();

        complete_bulk(&mut conn, &[t1.id], true).unwrap();
        let plan_after = plan_store::get_by_id(&conn, plan.id).unwrap().unwrap();
        assert_eq!(plan_after.status, PlanStatus::Completed);
    }
}
