//! Schema DDL and connection configuration (L2), the data half of the
//! "Schema & identifier rules" layer (see `identifiers` for the other half).

use rusqlite::Connection;

use crate::error::StoreError;

pub const SCHEMA_VERSION: i64 = 1;

const DDL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS plans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL CHECK (length(title) <= 500),
    description TEXT,
    status TEXT NOT NULL DEFAULT 'open'
        CHECK (status IN ('open', 'in_progress', 'completed')),
    task_counter INTEGER NOT NULL DEFAULT 0 CHECK (task_counter >= 0),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    execution_started_at INTEGER,
    completed_at INTEGER,
    CHECK (completed_at IS NULL OR execution_started_at IS NOT NULL),
    CHECK (completed_at IS NULL OR completed_at >= execution_started_at)
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    plan_id INTEGER NOT NULL REFERENCES plans(id) ON DELETE CASCADE,
    plan_task_number INTEGER NOT NULL CHECK (plan_task_number BETWEEN 1 AND 999),
    title TEXT NOT NULL CHECK (length(title) <= 500),
    description TEXT,
    status TEXT NOT NULL DEFAULT 'open'
        CHECK (status IN ('open', 'in_progress', 'completed')),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    started_at INTEGER,
    completed_at INTEGER,
    UNIQUE (plan_id, plan_task_number),
    CHECK ((status = 'open') = (started_at IS NULL)),
    CHECK ((status = 'completed') = (completed_at IS NOT NULL)),
    CHECK (completed_at IS NULL OR started_at IS NOT NULL),
    CHECK (completed_at IS NULL OR completed_at >= started_at)
);

CREATE TABLE IF NOT EXISTS dependencies (
    task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    blocks_on_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (task_id, blocks_on_id),
    CHECK (task_id != blocks_on_id)
);

CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_plan_id ON tasks(plan_id);
CREATE INDEX IF NOT EXISTS idx_tasks_status_plan ON tasks(status, plan_id);
CREATE INDEX IF NOT EXISTS idx_tasks_plan_created ON tasks(plan_id, created_at ASC);
CREATE INDEX IF NOT EXISTS idx_deps_task_id ON dependencies(task_id);
CREATE INDEX IF NOT EXISTS idx_deps_blocks_on_id ON dependencies(blocks_on_id);
CREATE INDEX IF NOT EXISTS idx_plans_slug ON plans(slug);
CREATE INDEX IF NOT EXISTS idx_plans_status ON plans(status);
";

/// The mandated index names, checked for existence by the health checker.
pub const MANDATED_INDEXES: &[&str] = &[
    "idx_tasks_status",
    "idx_tasks_plan_id",
    "idx_tasks_status_plan",
    "idx_tasks_plan_created",
    "idx_deps_task_id",
    "idx_deps_blocks_on_id",
    "idx_plans_slug",
    "idx_plans_status",
];

/// Creates every table/index and seeds `schema_version` if empty.
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(DDL)
        .map_err(|e| StoreError::ExecFailed(e.to_string()))?;

    let existing: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .map_err(|e| StoreError::StepFailed(e.to_string()))?;
    if existing == 0 {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION],
        )
        .map_err(|e| StoreError::StepFailed(e.to_string()))?;
    }
    Ok(())
}

/// Enables foreign-key enforcement and a busy timeout on a fresh connection.
/// Must be called on every connection the store opens — `rusqlite` leaves
/// foreign keys off by default.
pub fn configure_connection(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA foreign_keys = ON;",
    )
    .map_err(|e| StoreError::ExecFailed(e.to_string()))?;
    Ok(())
}
