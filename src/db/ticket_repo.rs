use rusqlite::{params, Connection};

use crate::error::TasktimeError;
use crate::models::{Ticket, TicketStatus};

pub fn create_ticket(conn: &Connection, id: &str, title: &str) -> Result<Ticket, TasktimeError> {
    conn.execute(
        "INSERT INTO tickets (id, title) VALUES (?1, ?2)",
        params![id, title],
    )?;
    get_ticket_by_id(conn, id)
}

pub fn get_ticket_by_id(conn: &Connection, id: &str) -> Result<Ticket, TasktimeError> {
    conn.query_row(
        "SELECT id, title, status, created_at FROM tickets WHERE id = ?1",
        params![id],
        row_to_ticket,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => TasktimeError::ticket_not_found(id),
        _ => TasktimeError::from(e),
    })
}

/// Resolve a ticket reference: exact ID, then unique ID prefix.
pub fn resolve_ticket(conn: &Connection, reference: &str) -> Result<Ticket, TasktimeError> {
    if let Ok(ticket) = get_ticket_by_id(conn, reference) {
        return Ok(ticket);
    }

    let mut stmt = conn.prepare(
        "SELECT id, title, status, created_at FROM tickets WHERE id LIKE ?1",
    )?;
    let prefix = format!("{reference}%");
    let mut tickets: Vec<Ticket> = stmt
        .query_map(params![prefix], row_to_ticket)?
        .collect::<Result<Vec<_>, _>>()?;

    match tickets.len() {
        0 => Err(TasktimeError::ticket_not_found(reference)),
        1 => Ok(tickets.remove(0)),
        _ => {
            let candidates: Vec<String> = tickets.iter().map(|t| format!("{} ({})", t.title, t.id)).collect();
            Err(TasktimeError::ambiguous_ref(reference, &candidates))
        }
    }
}

pub fn list_tickets(conn: &Connection) -> Result<Vec<Ticket>, TasktimeError> {
    let mut stmt = conn.prepare(
        "SELECT id, title, status, created_at FROM tickets ORDER BY rowid ASC",
    )?;
    let tickets = stmt
        .query_map([], row_to_ticket)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tickets)
}

pub fn update_ticket_status(conn: &Connection, id: &str, status: TicketStatus) -> Result<(), TasktimeError> {
    let changed = conn.execute(
        "UPDATE tickets SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    if changed == 0 {
        return Err(TasktimeError::ticket_not_found(id));
    }
    Ok(())
}

fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: row.get(0)?,
        title: row.get(1)?,
        status: TicketStatus::from_str(&row.get::<_, String>(2)?).unwrap_or(TicketStatus::Open),
        created_at: row.get(3)?,
    })
}
