use rusqlite::Connection;

use crate::error::TasktimeError;

pub fn run_migrations(conn: &Connection) -> Result<(), TasktimeError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS tickets (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'open'
                CHECK (status IN ('open', 'done')),
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            ticket_id TEXT NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
            parent_id TEXT REFERENCES tasks(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'todo'
                CHECK (status IN ('todo', 'running', 'pending', 'done')),
            task_type TEXT NOT NULL DEFAULT 'first_pass'
                CHECK (task_type IN ('first_pass', 'post_survey', 'post_survey_missed', 'unknown')),
            is_survey_task INTEGER NOT NULL DEFAULT 1,
            progress_rate INTEGER NOT NULL DEFAULT 0
                CHECK (progress_rate BETWEEN 0 AND 100),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK (parent_id IS NULL OR parent_id != id)
        );

        CREATE TABLE IF NOT EXISTS plans (
            id TEXT PRIMARY KEY,
            task_id TEXT NOT NULL UNIQUE REFERENCES tasks(id) ON DELETE CASCADE,
            predicted_required_time_first REAL,
            predicted_required_time_final REAL,
            predicted_survey_time_first REAL,
            predicted_survey_time_final REAL,
            survey_detail TEXT
        );

        CREATE TABLE IF NOT EXISTS achievements (
            id TEXT PRIMARY KEY,
            task_id TEXT NOT NULL UNIQUE REFERENCES tasks(id) ON DELETE CASCADE,
            operating_time INTEGER NOT NULL DEFAULT 0,
            survey_time INTEGER NOT NULL DEFAULT 0,
            done_at TEXT
        );

        CREATE TABLE IF NOT EXISTS histories (
            id TEXT PRIMARY KEY,
            achievement_id TEXT NOT NULL REFERENCES achievements(id) ON DELETE CASCADE,
            day TEXT NOT NULL,
            operating_time INTEGER NOT NULL DEFAULT 0,
            survey_time INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (achievement_id, day)
        );

        CREATE TABLE IF NOT EXISTS checks (
            id TEXT PRIMARY KEY,
            task_id TEXT NOT NULL UNIQUE REFERENCES tasks(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS feedbacks (
            id TEXT PRIMARY KEY,
            task_id TEXT NOT NULL UNIQUE REFERENCES tasks(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS terms (
            id TEXT PRIMARY KEY,
            task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            term_id TEXT NOT NULL UNIQUE,
            started_at TEXT NOT NULL,
            ended_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_ticket_status ON tasks(ticket_id, status);
        CREATE INDEX IF NOT EXISTS idx_tasks_parent ON tasks(parent_id);
        CREATE INDEX IF NOT EXISTS idx_terms_task ON terms(task_id, started_at);
        ",
    )?;
    Ok(())
}
