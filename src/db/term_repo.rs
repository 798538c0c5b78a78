use rusqlite::{params, Connection};

use crate::error::TasktimeError;
use crate::models::Term;

/// Insert the term, or move the end of an already saved term with the same correlation id.
pub fn save_term(conn: &Connection, term: &Term) -> Result<(), TasktimeError> {
    conn.execute(
        "INSERT INTO terms (id, task_id, term_id, started_at, ended_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (term_id) DO UPDATE SET ended_at = excluded.ended_at",
        params![
            ulid::Ulid::new().to_string(),
            term.task_id,
            term.term_id,
            term.started_at,
            term.ended_at
        ],
    )?;
    Ok(())
}

pub fn list_terms(conn: &Connection, task_id: &str) -> Result<Vec<Term>, TasktimeError> {
    let mut stmt = conn.prepare(
        "SELECT task_id, term_id, started_at, ended_at FROM terms
         WHERE task_id = ?1 ORDER BY started_at ASC",
    )?;
    let terms = stmt
        .query_map(params![task_id], |row| {
            Ok(Term {
                task_id: row.get(0)?,
                term_id: row.get(1)?,
                started_at: row.get(2)?,
                ended_at: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(terms)
}
