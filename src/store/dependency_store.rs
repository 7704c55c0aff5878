use rusqlite::{params, Connection};

use crate::clock::now_unix;
use crate::error::StoreError;
use crate::executor::{begin, commit, exec, query_all};
use crate::models::{DepthAnnotatedTask, Task, TASK_COLUMNS};

const MAX_DEPTH: i64 = 100;

/// `true` iff `blocks_on_task` can already reach `from_task` by following
/// existing edges, i.e. adding `from_task → blocks_on_task` would close a loop.
pub fn detect_cycle(conn: &Connection, from_task: i64, blocks_on_task: i64) -> Result<bool, StoreError> {
    if from_task == blocks_on_task {
        return Ok(true);
    }
    let sql = "
        WITH RECURSIVE reachable(id, depth) AS (
            SELECT blocks_on_id, 1 FROM dependencies WHERE task_id = ?1
            UNION
            SELECT d.blocks_on_id, r.depth + 1
            FROM dependencies d
            JOIN reachable r ON d.task_id = r.id
            WHERE r.depth < ?2
        )
        SELECT COUNT(*) FROM reachable WHERE id = ?3
    ";
    let count: i64 = conn
        .query_row(sql, params![blocks_on_task, MAX_DEPTH, from_task], |row| row.get(0))
        .map_err(|e| StoreError::StepFailed(e.to_string()))?;
    Ok(count > 0)
}

pub fn add(conn: &mut Connection, task_id: i64, blocks_on_id: i64) -> Result<(), StoreError> {
    if task_id == blocks_on_id {
        return Err(StoreError::InvalidInput(
            "a task cannot block on itself".to_string(),
        ));
    }
    if task_id <= 0 || blocks_on_id <= 0 {
        return Err(StoreError::InvalidInput(
            "task ids must be positive".to_string(),
        ));
    }

    let txn = begin(conn)?;

    for id in [task_id, blocks_on_id] {
        let exists: i64 = txn
            .query_row("SELECT COUNT(*) FROM tasks WHERE id = ?1", params![id], |row| row.get(0))
            .map_err(|e| StoreError::StepFailed(e.to_string()))?;
        if exists == 0 {
            return Err(StoreError::InvalidData(format!("task {id} does not exist")));
        }
    }

    if detect_cycle(&txn, task_id, blocks_on_id)? {
        return Err(StoreError::CycleDetected);
    }

    let now = now_unix();
    exec(
        &txn,
        "INSERT INTO dependencies (task_id, blocks_on_id, created_at) VALUES (?1, ?2, ?3)",
        params![task_id, blocks_on_id, now],
    )
    .map_err(|e| match e {
        StoreError::StepFailed(msg) if msg.contains("UNIQUE") || msg.contains("PRIMARY KEY") => {
            StoreError::InvalidData(format!(
                "dependency {task_id} -> {blocks_on_id} already exists"
            ))
        }
        other => other,
    })?;
    exec(
        &txn,
        "UPDATE tasks SET updated_at = ?1 WHERE id = ?2",
        params![now, task_id],
    )?;
    commit(txn)?;
    tracing::debug!(task_id, blocks_on_id, "dependency added");
    Ok(())
}

pub fn remove(conn: &mut Connection, task_id: i64, blocks_on_id: i64) -> Result<(), StoreError> {
    let txn = begin(conn)?;
    let affected = exec(
        &txn,
        "DELETE FROM dependencies WHERE task_id = ?1 AND blocks_on_id = ?2",
        params![task_id, blocks_on_id],
    )?;
    if affected != 1 {
        return Err(StoreError::InvalidData(format!(
            "dependency {task_id} -> {blocks_on_id} does not exist"
        )));
    }
    let now = now_unix();
    exec(
        &txn,
        "UPDATE tasks SET updated_at = ?1 WHERE id = ?2",
        params![now, task_id],
    )?;
    commit(txn)?;
    tracing::debug!(task_id, blocks_on_id, "dependency removed");
    Ok(())
}

fn transitive(
    conn: &Connection,
    task_id: i64,
    forward: bool,
) -> Result<Vec<DepthAnnotatedTask>, StoreError> {
    let (from_col, to_col) = if forward {
        ("task_id", "blocks_on_id")
    } else {
        ("blocks_on_id", "task_id")
    };
    let sql = format!(
        "WITH RECURSIVE chain(id, depth) AS (
            SELECT {to_col}, 1 FROM dependencies WHERE {from_col} = ?1
            UNION
            SELECT d.{to_col}, c.depth + 1
            FROM dependencies d
            JOIN chain c ON d.{from_col} = c.id
            WHERE c.depth < ?2
        ),
        shortest AS (
            SELECT id, MIN(depth) AS depth FROM chain GROUP BY id
        )
        SELECT {task_columns}, p.slug, shortest.depth
        FROM shortest
        JOIN tasks t ON t.id = shortest.id
        JOIN plans p ON p.id = t.plan_id
        ORDER BY shortest.depth ASC, t.title ASC",
        task_columns = TASK_COLUMNS
            .split(", ")
            .map(|c| format!("t.{c}"))
            .collect::<Vec<_>>()
            .join(", "),
    );

    struct Row(Task, String, i64);
    impl crate::executor::FromRow for Row {
        fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
            let task = Task::from_row(row)?;
            let ncols = 10;
            let slug: String = row.get(ncols)?;
            let depth: i64 = row.get(ncols + 1)?;
            Ok(Row(task, slug, depth))
        }
    }

    let rows: Vec<Row> = query_all(conn, &sql, params![task_id, MAX_DEPTH])?;
    Ok(rows
        .into_iter()
        .map(|Row(task, plan_slug, depth)| DepthAnnotatedTask { task, plan_slug, depth })
        .collect())
}

pub fn blockers(conn: &Connection, task_id: i64) -> Result<Vec<DepthAnnotatedTask>, StoreError> {
    transitive(conn, task_id, true)
}

pub fn dependents(conn: &Connection, task_id: i64) -> Result<Vec<DepthAnnotatedTask>, StoreError> {
    transitive(conn, task_id, false)
}

pub fn direct_blockers(conn: &Connection, task_id: i64) -> Result<Vec<i64>, StoreError> {
    query_all(
        conn,
        "SELECT blocks_on_id FROM dependencies WHERE task_id = ?1",
        params![task_id],
    )
    .map(|rows: Vec<IdRow>| rows.into_iter().map(|r| r.0).collect())
}

struct IdRow(i64);
impl crate::executor::FromRow for IdRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(IdRow(row.get(0)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{configure_connection, run_migrations};
    use crate::store::{plan_store, task_store};

    fn setup_chain() -> (Connection, i64, i64, i64) {
        let mut conn = Connection::open_in_memory().unwrap();
        configure_connection(&conn).unwrap();
        run_migrations(&conn).unwrap();
        let plan = plan_store::create(&conn, "auth", "Auth", None).unwrap();
        let t1 = task_store::create(&mut conn, plan.id, "t1", None).unwrap();
        let t2 = task_store::create(&mut conn, plan.id, "t2", None).unwrap();
        let t3 = task_store::create(&mut conn, plan.id, "t3", None).unwrap();
        add(&mut conn, t2.id, t1.id).unwrap();
        add(&mut conn, t3.id, t2.id).unwrap();
        (conn, t1.id, t2.id, t3.id)
    }

    #[test]
    fn rejects_self_edge() {
        let (mut conn, t1, _, _) = setup_chain();
        assert!(matches!(add(&mut conn, t1, t1), Err(StoreError::InvalidInput(_))));
    }

    #[test]
    fn rejects_duplicate_edge() {
        let (mut conn, t1, t2, _) = setup_chain();
        assert!(matches!(add(&mut conn, t2, t1), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn rejects_cycle() {
        let (mut conn, t1, _, t3) = setup_chain();
        assert!(matches!(add(&mut conn, t1, t3), Err(StoreError::CycleDetected)));
        // edge set unchanged
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM dependencies WHERE task_id = ?1", params![t1], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn blockers_are_depth_ordered() {
        let (conn, t1, t2, t3) = setup_chain();
        let got = blockers(&conn, t3).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].task.id, t2);
        assert_eq!(got[0].depth, 1);
        assert_eq!(got[1].task.id, t1);
        assert_eq!(got[1].depth, 2);
    }

    #[test]
    fn dependents_are_symmetric_to_blockers() {
        let (conn, t1, t2, t3) = setup_chain();
        let got = dependents(&conn, t1).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].task.id, t2);
        assert_eq!(got[1].task.id, t3);
    }

    #[test]
    fn remove_then_readd_restores_prior_edge_set() {
        let (mut conn, t1, t2, _) = setup_chain();
        remove(&mut conn, t2, t1).unwrap();
        assert!(direct_blockers(&conn, t2).unwrap().is_empty());
        add(&mut conn, t2, t1).unwrap();
        assert_eq!(direct_blockers(&conn, t2).unwrap(), vec![t1]);
    }

    #[test]
    fn remove_missing_edge_is_an_error() {
        let (mut conn, t1, t2, _) = setup_chain();
        remove(&mut conn, t2, t1).unwrap();
        assert!(matches!(remove(&mut conn, t2, t1), Err(StoreError::InvalidData(_))));
    }
}
