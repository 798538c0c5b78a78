use std::env;
use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;
use tracing::debug;

use crate::error::{ErrorCode, TasktimeError};

use super::migrations;

/// Find the .git root by walking up from current directory.
pub fn find_git_root() -> Result<PathBuf, TasktimeError> {
    let mut dir = env::current_dir().map_err(|e| TasktimeError::database(e.to_string()))?;
    loop {
        if dir.join(".git").exists() {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(TasktimeError::new(
                ErrorCode::NotInitialized,
                "Not inside a git repository. tasktime requires a git repository.",
            ));
        }
    }
}

/// Directory holding the database and config file.
pub fn data_dir() -> Result<PathBuf, TasktimeError> {
    let root = find_git_root()?;
    Ok(root.join(".worktoolai").join("tasktime"))
}

pub fn db_path() -> Result<PathBuf, TasktimeError> {
    Ok(data_dir()?.join("tasktime.db"))
}

pub fn config_path() -> Result<PathBuf, TasktimeError> {
    Ok(data_dir()?.join("config.json"))
}

/// Open a connection to the database. Returns error if not initialized.
pub fn open_db() -> Result<Connection, TasktimeError> {
    let path = db_path()?;
    if !path.exists() {
        return Err(TasktimeError::not_initialized());
    }
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    debug!(path = %path.display(), "opened database");
    Ok(conn)
}

/// Initialize the database: create directories, database, and run migrations.
pub fn init_db() -> Result<PathBuf, TasktimeError> {
    let path = db_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TasktimeError::database(e.to_string()))?;
    }
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(path)
}

/// Fresh migrated database that lives only as long as the connection.
pub fn open_in_memory() -> Result<Connection, TasktimeError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Run `f` inside `BEGIN IMMEDIATE`, committing on success and rolling back on error.
pub fn in_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T, TasktimeError>,
) -> Result<T, TasktimeError> {
    conn.execute_batch("BEGIN IMMEDIATE")?;
    match f(conn) {
        Ok(value) => {
            conn.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

fn configure_connection(conn: &Connection) -> Result<(), TasktimeError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}
