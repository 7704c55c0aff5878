//! Statement executor (L1): a type-safe vocabulary over `rusqlite` so every
//! higher layer talks in terms of `exec`/`query_one`/`query_all`/transactions
//! instead of raw `Connection` calls.
//!
//! `begin` returns a `rusqlite::Transaction`, whose `Drop` rolls back if it
//! was never committed — that is our scope-guarded rollback, for free.

use rusqlite::{Connection, ToSql, Transaction};

use crate::error::StoreError;

/// A record decodable from a single result row, column by column, in order.
pub trait FromRow: Sized {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self>;
}

/// Runs `sql` for its side effect (INSERT/UPDATE/DELETE/pragma) and returns
/// the number of rows affected.
pub fn exec(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<usize, StoreError> {
    conn.execute(sql, params)
        .map_err(|e| StoreError::ExecFailed(e.to_string()))
}

/// Runs a SELECT expected to return at most one row.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<Option<T>, StoreError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| StoreError::PrepareStatementFailed(e.to_string()))?;
    let mut rows = stmt
        .query(params)
        .map_err(|e| StoreError::BindFailed(e.to_string()))?;
    match rows.next().map_err(|e| StoreError::StepFailed(e.to_string()))? {
        Some(row) => Ok(Some(
            T::from_row(row).map_err(|e| StoreError::StepFailed(e.to_string()))?,
        )),
        None => Ok(None),
    }
}

/// Runs a SELECT and collects every row into an owned `Vec<T>`.
///
/// If decoding row `n` fails, rows `0..n` are simply dropped as part of the
/// `collect::<Result<_, _>>()` early return — Rust's ownership model frees
/// their allocations without any manual cleanup step.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<T>, StoreError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| StoreError::PrepareStatementFailed(e.to_string()))?;
    let rows = stmt
        .query_map(params, |row| T::from_row(row))
        .map_err(|e| StoreError::BindFailed(e.to_string()))?;
    rows.collect::<Result<Vec<T>, _>>()
        .map_err(|e| StoreError::StepFailed(e.to_string()))
}

/// Opens a write transaction with an upfront exclusive lock, matching the
/// teacher's own use of `BEGIN IMMEDIATE` rather than a deferred `BEGIN`
/// that could race another process between the first read and first write.
pub fn begin(conn: &mut Connection) -> Result<Transaction<'_>, StoreError> {
    conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
        .map_err(|e| StoreError::ExecFailed(e.to_string()))
}

/// Commits a transaction.
pub fn commit(txn: Transaction<'_>) -> Result<(), StoreError> {
    txn.commit().map_err(|e| StoreError::ExecFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Count(i64);
    impl FromRow for Count {
        fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
            Ok(Count(row.get(0)?))
        }
    }

    #[test]
    fn query_one_returns_none_on_empty_result() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(x INTEGER)").unwrap();
        let got: Option<Count> = query_one(&conn, "SELECT x FROM t WHERE x = ?1", &[&1i64]).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn query_all_collects_every_row() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(x INTEGER); INSERT INTO t VALUES (1),(2),(3);")
            .unwrap();
        let got: Vec<Count> = query_all(&conn, "SELECT x FROM t ORDER BY x", &[]).unwrap();
        assert_eq!(got.iter().map(|c| c.0).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn begin_without_commit_rolls_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(x INTEGER)").unwrap();
        {
            let txn = begin(&mut conn).unwrap();
            exec(&txn, "INSERT INTO t VALUES (1)", &[]).unwrap();
            // txn dropped here without commit
        }
        let count: Count = query_one(&conn, "SELECT COUNT(*) FROM t", &[]).unwrap().unwrap();
        assert_eq!(count.0, 0);
    }

    #[test]
    fn begin_then_commit_persists() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(x INTEGER)").unwrap();
        let txn = begin(&mut conn).unwrap();
        exec(&txn, "INSERT INTO t VALUES (1)", &[]).unwrap();
        commit(txn).unwrap();
        let count: Count = query_one(&conn, "SELECT COUNT(*) FROM t", &[]).unwrap().unwrap();
        assert_eq!(count.0, 1);
    }
}
