use rusqlite::{params, Connection};

use crate::error::TasktimeError;
use crate::models::{Task, TaskStatus, TaskType};

const TASK_COLUMNS: &str = "id, ticket_id, parent_id, title, status, task_type,
                            is_survey_task, progress_rate, created_at, updated_at";

/// Everything needed to insert a task together with its one-to-one rows.
#[derive(Debug, Clone)]
pub struct NewTask<'a> {
    pub ticket_id: &'a str,
    pub parent_id: Option<&'a str>,
    pub title: &'a str,
    pub task_type: TaskType,
    pub is_survey_task: bool,
    pub predicted_required_time_first: Option<f64>,
}

/// Insert a task plus its plan, achievement, check and feedback rows.
/// Callers wrap this in a transaction.
pub fn create_task(conn: &Connection, new: &NewTask<'_>) -> Result<Task, TasktimeError> {
    let id = ulid::Ulid::new().to_string();
    conn.execute(
        "INSERT INTO tasks (id, ticket_id, parent_id, title, task_type, is_survey_task)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            new.ticket_id,
            new.parent_id,
            new.title,
            new.task_type.as_str(),
            new.is_survey_task
        ],
    )?;
    conn.execute(
        "INSERT INTO plans (id, task_id, predicted_required_time_first) VALUES (?1, ?2, ?3)",
        params![ulid::Ulid::new().to_string(), id, new.predicted_required_time_first],
    )?;
    conn.execute(
        "INSERT INTO achievements (id, task_id) VALUES (?1, ?2)",
        params![ulid::Ulid::new().to_string(), id],
    )?;
    conn.execute(
        "INSERT INTO checks (id, task_id) VALUES (?1, ?2)",
        params![ulid::Ulid::new().to_string(), id],
    )?;
    conn.execute(
        "INSERT INTO feedbacks (id, task_id) VALUES (?1, ?2)",
        params![ulid::Ulid::new().to_string(), id],
    )?;
    get_task_by_id(conn, &id)
}

pub fn get_task_by_id(conn: &Connection, id: &str) -> Result<Task, TasktimeError> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        row_to_task,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => TasktimeError::task_not_found(id),
        _ => TasktimeError::from(e),
    })
}

/// Resolve task by exact ID, then unique ID prefix.
pub fn resolve_task(conn: &Connection, reference: &str) -> Result<Task, TasktimeError> {
    if let Ok(task) = get_task_by_id(conn, reference) {
        return Ok(task);
    }

    let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id LIKE ?1"))?;
    let prefix = format!("{reference}%");
    let mut tasks: Vec<Task> = stmt
        .query_map(params![prefix], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;

    match tasks.len() {
        0 => Err(TasktimeError::task_not_found(reference)),
        1 => Ok(tasks.remove(0)),
        _ => {
            let candidates: Vec<String> = tasks.iter().map(|t| format!("{} ({})", t.title, t.id)).collect();
            Err(TasktimeError::ambiguous_ref(reference, &candidates))
        }
    }
}

/// Every task of a ticket regardless of status, in creation order.
pub fn list_tasks_by_ticket(conn: &Connection, ticket_id: &str) -> Result<Vec<Task>, TasktimeError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE ticket_id = ?1 ORDER BY rowid ASC"
    ))?;
    let tasks = stmt
        .query_map(params![ticket_id], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

/// Top-level tasks of a ticket that are not done.
pub fn list_open_roots(conn: &Connection, ticket_id: &str) -> Result<Vec<Task>, TasktimeError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE ticket_id = ?1 AND parent_id IS NULL AND status != 'done'
         ORDER BY rowid ASC"
    ))?;
    let tasks = stmt
        .query_map(params![ticket_id], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

/// Direct children of a task that are not done.
pub fn list_open_children(conn: &Connection, parent_id: &str) -> Result<Vec<Task>, TasktimeError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE parent_id = ?1 AND status != 'done'
         ORDER BY rowid ASC"
    ))?;
    let tasks = stmt
        .query_map(params![parent_id], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

/// Write back every mutable column of `task`.
pub fn save_task(conn: &Connection, task: &Task) -> Result<(), TasktimeError> {
    let changed = conn.execute(
        "UPDATE tasks SET ticket_id = ?1, parent_id = ?2, title = ?3, status = ?4,
         task_type = ?5, is_survey_task = ?6, progress_rate = ?7,
         updated_at = datetime('now')
         WHERE id = ?8",
        params![
            task.ticket_id,
            task.parent_id,
            task.title,
            task.status.as_str(),
            task.task_type.as_str(),
            task.is_survey_task,
            task.progress_rate,
            task.id
        ],
    )?;
    if changed == 0 {
        return Err(TasktimeError::task_not_found(&task.id));
    }
    Ok(())
}

pub fn set_survey_mode(conn: &Connection, id: &str, is_survey_task: bool) -> Result<(), TasktimeError> {
    let changed = conn.execute(
        "UPDATE tasks SET is_survey_task = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![is_survey_task, id],
    )?;
    if changed == 0 {
        return Err(TasktimeError::task_not_found(id));
    }
    Ok(())
}

/// Task status counts for a ticket.
pub fn ticket_progress(conn: &Connection, ticket_id: &str) -> Result<TicketProgress, TasktimeError> {
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*) FROM tasks WHERE ticket_id = ?1 GROUP BY status",
    )?;
    let mut progress = TicketProgress::default();
    let rows = stmt.query_map(params![ticket_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (status, count) = row?;
        match TaskStatus::from_str(&status) {
            Some(TaskStatus::Todo) => progress.todo = count,
            Some(TaskStatus::Running) => progress.running = count,
            Some(TaskStatus::Pending) => progress.pending = count,
            Some(TaskStatus::Done) => progress.done = count,
            None => {}
        }
    }
    progress.total = progress.todo + progress.running + progress.pending + progress.done;
    Ok(progress)
}

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct TicketProgress {
    pub total: i64,
    pub todo: i64,
    pub running: i64,
    pub pending: i64,
    pub done: i64,
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        parent_id: row.get(2)?,
        title: row.get(3)?,
        status: TaskStatus::from_str(&row.get::<_, String>(4)?).unwrap_or(TaskStatus::Todo),
        task_type: TaskType::from_str(&row.get::<_, String>(5)?).unwrap_or(TaskType::Unknown),
        is_survey_task: row.get(6)?,
        progress_rate: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
