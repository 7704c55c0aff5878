//! Query engine (L7): the ready set, the blocked set, and system-wide
//! statistics. Each is a single query through the executor — no
//! layer-by-layer iteration in Rust.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::executor::{query_all, FromRow};
use crate::models::{BlockedTask, Task, TASK_COLUMNS};

/// Tasks with `status = 'open'` and no outgoing edge to a task whose
/// `status != 'completed'`, ordered by `created_at ASC`. `limit` of `0`
/// means unlimited, capped defensively at 1000 per the return-contract
/// bound (see `executor`/spec §6.3).
pub fn ready_tasks(conn: &Connection, limit: u32) -> Result<Vec<Task>, StoreError> {
    let effective_limit = if limit == 0 { 1000 } else { limit.min(1000) };
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks t
         WHERE t.status = 'open'
           AND NOT EXISTS (
               SELECT 1 FROM dependencies d
               JOIN tasks bt ON bt.id = d.blocks_on_id
               WHERE d.task_id = t.id AND bt.status != 'completed'
           )
         ORDER BY t.created_at ASC, t.id ASC
         LIMIT ?1"
    );
    query_all(conn, &sql, params![effective_limit])
}

/// Tasks that are not completed and have at least one incomplete blocker,
/// each paired with the count of such blockers. Ordered by descending
/// blocker count then ascending `created_at`.
pub fn blocked_tasks(conn: &Connection) -> Result<Vec<BlockedTask>, StoreError> {
    struct Row(Task, String, i64);
    impl FromRow for Row {
        fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
            let task = Task::from_row(row)?;
            let slug: String = row.get(10)?;
            let count: i64 = row.get(11)?;
            Ok(Row(task, slug, count))
        }
    }

    let task_columns = TASK_COLUMNS
        .split(", ")
        .map(|c| format!("t.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {task_columns}, p.slug,
                (SELECT COUNT(*) FROM dependencies d
                 JOIN tasks bt ON bt.id = d.blocks_on_id
                 WHERE d.task_id = t.id AND bt.status != 'completed') AS blocker_count
         FROM tasks t
         JOIN plans p ON p.id = t.plan_id
         WHERE t.status != 'completed'
           AND EXISTS (
               SELECT 1 FROM dependencies d
               JOIN tasks bt ON bt.id = d.blocks_on_id
               WHERE d.task_id = t.id AND bt.status != 'completed'
           )
         ORDER BY blocker_count DESC, t.created_at ASC, t.id ASC"
    );
    let rows: Vec<Row> = query_all(conn, &sql, &[])?;
    Ok(rows
        .into_iter()
        .map(|Row(task, plan_slug, blocker_count)| BlockedTask { task, plan_slug, blocker_count })
        .collect())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemStats {
    pub plans_total: i64,
    pub plans_completed: i64,
    pub tasks_total: i64,
    pub tasks_open: i64,
    pub tasks_in_progress: i64,
    pub tasks_completed: i64,
    pub ready_count: i64,
    pub blocked_count: i64,
}

/// Three independent aggregations over the whole workspace: plan counts,
/// task counts by status, and the ready/blocked set sizes.
pub fn system_stats(conn: &Connection) -> Result<SystemStats, StoreError> {
    let mut stats = SystemStats::default();

    stats.plans_total = conn
        .query_row("SELECT COUNT(*) FROM plans", [], |row| row.get(0))
        .map_err(|e| StoreError::StepFailed(e.to_string()))?;
    stats.plans_completed = conn
        .query_row(
            "SELECT COUNT(*) FROM plans WHERE status = 'completed'",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::StepFailed(e.to_string()))?;

    let mut stmt = conn
        .prepare("SELECT status, COUNT(*) FROM tasks GROUP BY status")
        .map_err(|e| StoreError::PrepareStatementFailed(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(|e| StoreError::BindFailed(e.to_string()))?;
    for row in rows {
        let (status, count) = row.map_err(|e| StoreError::StepFailed(e.to_string()))?;
        match status.as_str() {
            "open" => stats.tasks_open = count,
            "in_progress" => stats.tasks_in_progress = count,
            "completed" => stats.tasks_completed = count,
            _ => {}
        }
    }
    stats.tasks_total = stats.tasks_open + stats.tasks_in_progress + stats.tasks_completed;

    stats.ready_count = ready_tasks(conn, 0)?.len() as i64;
    stats.blocked_count = blocked_tasks(conn)?.len() as i64;

    debug_assert!(stats.plans_completed <= stats.plans_total);
    debug_assert!(stats.tasks_completed <= stats.tasks_total);
    debug_assert!(stats.ready_count + stats.blocked_count <= stats.tasks_total);

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{configure_connection, run_migrations};
    use crate::store::{dependency_store, lifecycle, plan_store, task_store};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        configure_connection(&conn).unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn ready_tasks_excludes_blocked_ones() {
        let mut conn = test_conn();
        let plan = plan_store::create(&conn, "auth", "Auth", None).unwrap();
        let t1 = task_store::create(&mut conn, plan.id, "t1", None).unwrap();
        let t2 = task_store::create(&mut conn, plan.id, "t2", None).unwrap();
        dependency_store::add(&mut conn, t2.id, t1.id).unwrap();

        let ready = ready_tasks(&conn, 0).unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, t1.id);
    }

    #[test]
    fn diamond_ready_set_progresses_in_creation_order() {
        let mut conn = test_conn();
        let plan = plan_store::create(&conn, "auth", "Auth", None).unwrap();
        let t1 = task_store::create(&mut conn, plan.id, "t1", None).unwrap();
        let t2 = task_store::create(&mut conn, plan.id, "t2", None).unwrap();
        let t3 = task_store::create(&mut conn, plan.id, "t3", None).unwrap();
        let t4 = task_store::create(&mut conn, plan.id, "t4", None).unwrap();
        dependency_store::add(&mut conn, t2.id, t1.id).unwrap();
        dependency_store::add(&mut conn, t3.id, t1.id).unwrap();
        dependency_store::add(&mut conn, t4.id, t2.id).unwrap();
        dependency_store::add(&mut conn, t4.id, t3.id).unwrap();

        assert_eq!(ready_tasks(&conn, 0).unwrap().iter().map(|t| t.id).collect::<Vec<_>>(), vec![t1.id]);

        lifecycle::start(&mut conn, t1.id).unwrap();
        lifecycle::complete(&mut conn, t1.id).unwrap();
        assert_eq!(
            ready_tasks(&conn, 0).unwrap().iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![t2.id, t3.id]
        );

        lifecycle::start(&mut conn, t2.id).unwrap();
        lifecycle::complete(&mut conn, t2.id).unwrap();
        lifecycle::start(&mut conn, t3.id).unwrap();
        lifecycle::complete(&mut conn, t3.id).unwrap();
        assert_eq!(ready_tasks(&conn, 0).unwrap().iter().map(|t| t.id).collect::<Vec<_>>(), vec![t4.id]);
    }

    #[test]
    fn blocked_tasks_counts_incomplete_blockers() {
        let mut conn = test_conn();
        let plan = plan_store::create(&conn, "auth", "Auth", None).unwrap();
        let t1 = task_store::create(&mut conn, plan.id, "t1", None).unwrap();
        let t2 = task_store::create(&mut conn, plan.id, "t2", None).unwrap();
        let t3 = task_store::create(&mut conn, plan.id, "t3", None).unwrap();
        dependency_store::add(&mut conn, t3.id, t1.id).unwrap();
        dependency_store::add(&mut conn, t3.id, t2.id).unwrap();

        let blocked = blocked_tasks(&conn).unwrap();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].task.id, t3.id);
        assert_eq!(blocked[0].blocker_count, 2);
    }

    #[test]
    fn system_stats_are_self_consistent() {
        let mut conn = test_conn();
        let plan = plan_store::create(&conn, "auth", "Auth", None).unwrap();
        task_store::create(&mut conn, plan.id, "t1", None).unwrap();
        task_store::create(&mut conn, plan.id, "t2", None).unwrap();
        let stats = system_stats(&conn).unwrap();
        assert_eq!(stats.tasks_total, 2);
        assert_eq!(stats.plans_total, 1);
        assert_eq!(stats.ready_count, 2);
        assert_eq!(stats.blocked_count, 0);
    }
}
