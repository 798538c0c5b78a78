use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::TasktimeError;
use crate::models::{Achievement, History};

/// Whether a daily write inserted a new history row or rewrote today's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Seconds written by one daily upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTimes {
    pub day: NaiveDate,
    pub cumulative_operating: i64,
    pub cumulative_survey: i64,
    pub day_operating: i64,
    pub day_survey: i64,
}

pub fn get_achievement_for_task(conn: &Connection, task_id: &str) -> Result<Achievement, TasktimeError> {
    let mut achievement = conn
        .query_row(
            "SELECT id, task_id, operating_time, survey_time, done_at FROM achievements WHERE task_id = ?1",
            params![task_id],
            |row| {
                Ok(Achievement {
                    id: row.get(0)?,
                    task_id: row.get(1)?,
                    operating_time: row.get(2)?,
                    survey_time: row.get(3)?,
                    done_at: row.get(4)?,
                    histories: Vec::new(),
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => TasktimeError::task_not_found(task_id),
            _ => TasktimeError::from(e),
        })?;
    achievement.histories = list_histories(conn, &achievement.id)?;
    Ok(achievement)
}

pub fn list_histories(conn: &Connection, achievement_id: &str) -> Result<Vec<History>, TasktimeError> {
    let mut stmt = conn.prepare(
        "SELECT id, achievement_id, day, operating_time, survey_time, created_at, updated_at
         FROM histories WHERE achievement_id = ?1 ORDER BY day ASC",
    )?;
    let histories = stmt
        .query_map(params![achievement_id], |row| {
            Ok(History {
                id: row.get(0)?,
                achievement_id: row.get(1)?,
                day: row.get(2)?,
                operating_time: row.get(3)?,
                survey_time: row.get(4)?,
                created_at: row.get(5)?,
                updated_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(histories)
}

/// Write cumulative totals to the achievement and the day's share to the history row
/// keyed by (achievement, day). Values are absolute, so repeating a write is harmless.
pub fn upsert_daily(conn: &Connection, task_id: &str, times: &DailyTimes) -> Result<UpsertOutcome, TasktimeError> {
    let achievement_id: String = conn
        .query_row(
            "SELECT id FROM achievements WHERE task_id = ?1",
            params![task_id],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => TasktimeError::task_not_found(task_id),
            _ => TasktimeError::from(e),
        })?;

    conn.execute(
        "UPDATE achievements SET operating_time = ?1, survey_time = ?2 WHERE id = ?3",
        params![times.cumulative_operating, times.cumulative_survey, achievement_id],
    )?;

    let existed: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM histories WHERE achievement_id = ?1 AND day = ?2)",
        params![achievement_id, times.day],
        |row| row.get(0),
    )?;

    conn.execute(
        "INSERT INTO histories (id, achievement_id, day, operating_time, survey_time)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (achievement_id, day) DO UPDATE SET
            operating_time = excluded.operating_time,
            survey_time = excluded.survey_time,
            updated_at = datetime('now')",
        params![
            ulid::Ulid::new().to_string(),
            achievement_id,
            times.day,
            times.day_operating,
            times.day_survey
        ],
    )?;

    Ok(if existed { UpsertOutcome::Updated } else { UpsertOutcome::Created })
}

/// Stamp or clear the completion date.
pub fn set_done(conn: &Connection, task_id: &str, done: bool) -> Result<(), TasktimeError> {
    let sql = if done {
        "UPDATE achievements SET done_at = COALESCE(done_at, datetime('now')) WHERE task_id = ?1"
    } else {
        "UPDATE achievements SET done_at = NULL WHERE task_id = ?1"
    };
    let changed = conn.execute(sql, params![task_id])?;
    if changed == 0 {
        return Err(TasktimeError::task_not_found(task_id));
    }
    Ok(())
}
