//! Workspace discovery (collaborator, not part of the core L0–L8 stack):
//! walks parent directories looking for a `.taskgraph` directory, the way
//! the teacher's `db::connection` walks up for `.git`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::StoreError;
use crate::schema::{configure_connection, run_migrations};

const WORKSPACE_DIR: &str = ".taskgraph";
const DB_FILE: &str = "graph.db";

/// Walks up from `start` looking for a `.taskgraph` directory. Returns the
/// directory that contains it (not the `.taskgraph` path itself).
fn find_workspace_root_from(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(WORKSPACE_DIR).is_dir() {
            return Some(dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}

fn find_workspace_root() -> Result<PathBuf, StoreError> {
    let cwd = env::current_dir().map_err(|e| StoreError::OpenFailed(e.to_string()))?;
    find_workspace_root_from(&cwd).ok_or(StoreError::NotAWorkspace)
}

fn db_path(root: &Path) -> PathBuf {
    root.join(WORKSPACE_DIR).join(DB_FILE)
}

/// Opens the database for the workspace containing the current directory.
/// Fails with `NotAWorkspace` if no ancestor directory has a `.taskgraph`.
pub fn open_db() -> Result<Connection, StoreError> {
    let root = find_workspace_root()?;
    let conn = Connection::open(db_path(&root))
        .map_err(|e| StoreError::OpenFailed(e.to_string()))?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Creates `.taskgraph/` in the current directory and runs migrations.
/// Fails with `AlreadyInWorkspace` if the current directory is already
/// inside one (walking up finds an existing `.taskgraph`), so workspaces
/// never nest.
pub fn init_workspace() -> Result<PathBuf, StoreError> {
    let cwd = env::current_dir().map_err(|e| StoreError::OpenFailed(e.to_string()))?;
    if let Some(existing) = find_workspace_root_from(&cwd) {
        return Err(StoreError::AlreadyInWorkspace(
            existing.to_string_lossy().to_string(),
        ));
    }

    let dir = cwd.join(WORKSPACE_DIR);
    fs::create_dir_all(&dir).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
    let path = db_path(&cwd);
    let conn = Connection::open(&path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
    configure_connection(&conn)?;
    run_migrations(&conn)?;
    tracing::info!(path = %path.display(), "workspace initialized");
    Ok(path)
}
