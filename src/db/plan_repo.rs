use rusqlite::{params, Connection};

use crate::error::TasktimeError;
use crate::models::{Check, Feedback, Plan, PlanChanges};

pub fn get_plan_for_task(conn: &Connection, task_id: &str) -> Result<Plan, TasktimeError> {
    conn.query_row(
        "SELECT id, task_id, predicted_required_time_first, predicted_required_time_final,
                predicted_survey_time_first, predicted_survey_time_final, survey_detail
         FROM plans WHERE task_id = ?1",
        params![task_id],
        |row| {
            Ok(Plan {
                id: row.get(0)?,
                task_id: row.get(1)?,
                predicted_required_time_first: row.get(2)?,
                predicted_required_time_final: row.get(3)?,
                predicted_survey_time_first: row.get(4)?,
                predicted_survey_time_final: row.get(5)?,
                survey_detail: row.get(6)?,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => TasktimeError::task_not_found(task_id),
        _ => TasktimeError::from(e),
    })
}

/// Apply the fields present in `changes`; absent fields keep their stored value.
pub fn update_plan(conn: &Connection, task_id: &str, changes: &PlanChanges) -> Result<Plan, TasktimeError> {
    let changed = conn.execute(
        "UPDATE plans SET
            predicted_required_time_first = COALESCE(?1, predicted_required_time_first),
            predicted_required_time_final = COALESCE(?2, predicted_required_time_final),
            predicted_survey_time_first = COALESCE(?3, predicted_survey_time_first),
            predicted_survey_time_final = COALESCE(?4, predicted_survey_time_final),
            survey_detail = COALESCE(?5, survey_detail)
         WHERE task_id = ?6",
        params![
            changes.predicted_required_time_first,
            changes.predicted_required_time_final,
            changes.predicted_survey_time_first,
            changes.predicted_survey_time_final,
            changes.survey_detail,
            task_id
        ],
    )?;
    if changed == 0 {
        return Err(TasktimeError::task_not_found(task_id));
    }
    get_plan_for_task(conn, task_id)
}

pub fn get_check_for_task(conn: &Connection, task_id: &str) -> Result<Check, TasktimeError> {
    conn.query_row(
        "SELECT id, task_id FROM checks WHERE task_id = ?1",
        params![task_id],
        |row| Ok(Check { id: row.get(0)?, task_id: row.get(1)? }),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => TasktimeError::task_not_found(task_id),
        _ => TasktimeError::from(e),
    })
}

pub fn get_feedback_for_task(conn: &Connection, task_id: &str) -> Result<Feedback, TasktimeError> {
    conn.query_row(
        "SELECT id, task_id FROM feedbacks WHERE task_id = ?1",
        params![task_id],
        |row| Ok(Feedback { id: row.get(0)?, task_id: row.get(1)? }),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => TasktimeError::task_not_found(task_id),
        _ => TasktimeError::from(e),
    })
}
