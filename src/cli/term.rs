use chrono::Local;
use serde_json::json;

use crate::cli::commands::TermCommands;
use crate::db::{connection, task_repo, term_repo};
use crate::error::TasktimeError;
use crate::output;

pub fn run(cmd: TermCommands, json_output: bool) -> i32 {
    let result = match cmd {
        TermCommands::List { task, all } => run_list(&task, all, json_output),
    };
    super::exit_code(result, json_output)
}

fn run_list(task_ref: &str, all: bool, json_output: bool) -> Result<(), TasktimeError> {
    let conn = connection::open_db()?;
    let task = task_repo::resolve_task(&conn, task_ref)?;
    let today = Local::now().date_naive();
    let terms: Vec<_> = term_repo::list_terms(&conn, &task.id)?
        .into_iter()
        .filter(|t| !t.is_empty())
        .filter(|t| all || t.local_day() == today)
        .collect();

    if json_output {
        let items: Vec<_> = terms.iter().map(output::json::term_json).collect();
        let total: i64 = terms.iter().map(|t| t.duration_secs()).sum();
        output::json::print(&output::json::success(json!({
            "task": output::json::task_json(&task),
            "terms": items,
            "total_secs": total
        })));
    } else {
        println!("Terms of {} ({})", task.title, task.id);
        output::text::print_terms(&terms);
    }
    Ok(())
}
