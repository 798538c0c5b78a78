use serde_json::json;

use crate::cli::commands::TicketCommands;
use crate::db::{connection, task_repo, ticket_repo};
use crate::error::TasktimeError;
use crate::models::TicketStatus;
use crate::output;

pub fn run(cmd: TicketCommands, json_output: bool) -> i32 {
    let result = match cmd {
        TicketCommands::Add { title } => run_add(&title, json_output),
        TicketCommands::List => run_list(json_output),
        TicketCommands::Close { reference } => run_set_status(&reference, TicketStatus::Done, json_output),
        TicketCommands::Reopen { reference } => run_set_status(&reference, TicketStatus::Open, json_output),
    };
    super::exit_code(result, json_output)
}

fn run_add(title: &str, json_output: bool) -> Result<(), TasktimeError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TasktimeError::validation("Ticket title must not be empty"));
    }
    let conn = connection::open_db()?;
    let id = ulid::Ulid::new().to_string();
    let ticket = ticket_repo::create_ticket(&conn, &id, title)?;

    if json_output {
        output::json::print(&output::json::success(json!({
            "ticket": output::json::ticket_json(&ticket)
        })));
    } else {
        println!("Added ticket: {} ({})", ticket.title, ticket.id);
    }
    Ok(())
}

fn run_list(json_output: bool) -> Result<(), TasktimeError> {
    let conn = connection::open_db()?;
    let tickets = ticket_repo::list_tickets(&conn)?;

    if json_output {
        let mut items = Vec::with_capacity(tickets.len());
        for t in &tickets {
            let mut v = output::json::ticket_json(t);
            v["progress"] = output::json::progress_json(&task_repo::ticket_progress(&conn, &t.id)?);
            items.push(v);
        }
        output::json::print(&output::json::success(json!({ "tickets": items })));
    } else {
        output::text::print_ticket_list(&tickets);
    }
    Ok(())
}

fn run_set_status(reference: &str, status: TicketStatus, json_output: bool) -> Result<(), TasktimeError> {
    let conn = connection::open_db()?;
    let ticket = ticket_repo::resolve_ticket(&conn, reference)?;
    ticket_repo::update_ticket_status(&conn, &ticket.id, status)?;
    let ticket = ticket_repo::get_ticket_by_id(&conn, &ticket.id)?;

    if json_output {
        output::json::print(&output::json::success(json!({
            "ticket": output::json::ticket_json(&ticket)
        })));
    } else {
        println!("Ticket {} is {}", ticket.title, ticket.status.as_str());
    }
    Ok(())
}
