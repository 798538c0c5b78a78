use chrono::Local;
use rusqlite::Connection;
use serde_json::json;
use tracing::{debug, info};

use crate::cli::commands::{ModeArg, TaskCommands, TaskStatusArg, TaskTypeArg};
use crate::db::task_repo::NewTask;
use crate::db::{achievement_repo, connection, in_transaction, plan_repo, task_repo, ticket_repo};
use crate::error::TasktimeError;
use crate::estimate::{self, has_first_prediction};
use crate::graph::ancestry::{self, Ancestry};
use crate::graph::tree::{self, TaskNode};
use crate::models::{PlanChanges, Task, TaskStatus, TaskType};
use crate::output;
use crate::tracker::{TaskClock, UpsertOutcome};

pub fn run(cmd: TaskCommands, json_output: bool) -> i32 {
    let result = match cmd {
        TaskCommands::Add { title, ticket, parent, task_type, predict_first, operating } => run_add(
            &title,
            &ticket,
            parent.as_deref(),
            task_type,
            predict_first,
            operating,
            json_output,
        ),
        TaskCommands::Split { parent, children } => run_split(&parent, &children, json_output),
        TaskCommands::Tree { ticket } => run_tree(&ticket, json_output),
        TaskCommands::Show { id } => run_show(&id, json_output),
        TaskCommands::Update {
            id,
            status,
            task_type,
            progress_rate,
            title,
            parent,
            ticket,
            predict_first,
            predict_final,
            predict_survey_first,
            predict_survey_final,
            survey_detail,
            mode,
            operating_time,
            survey_time,
        } => {
            let update = TaskUpdate {
                status,
                task_type,
                progress_rate,
                title,
                parent,
                ticket,
                plan: PlanChanges {
                    predicted_required_time_first: predict_first,
                    predicted_required_time_final: predict_final,
                    predicted_survey_time_first: predict_survey_first,
                    predicted_survey_time_final: predict_survey_final,
                    survey_detail,
                },
                mode,
                times: operating_time.zip(survey_time),
            };
            run_update(&id, update, json_output)
        }
    };
    super::exit_code(result, json_output)
}

fn check_hours(name: &str, hours: Option<f64>) -> Result<(), TasktimeError> {
    match hours {
        Some(h) if !h.is_finite() || h < 0.0 => Err(TasktimeError::validation(format!(
            "{name} must be a non-negative number of hours, got {h}"
        ))),
        _ => Ok(()),
    }
}

fn check_title(title: &str) -> Result<&str, TasktimeError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TasktimeError::validation("Task title must not be empty"));
    }
    Ok(title)
}

fn ticket_edges(conn: &Connection, ticket_id: &str) -> Result<Vec<(String, Option<String>)>, TasktimeError> {
    Ok(task_repo::list_tasks_by_ticket(conn, ticket_id)?
        .into_iter()
        .map(|t| (t.id, t.parent_id))
        .collect())
}

/// Resolve `parent_ref` and check a new child may hang below it in `ticket_id`.
fn resolve_new_parent(conn: &Connection, ticket_id: &str, parent_ref: &str) -> Result<Task, TasktimeError> {
    let parent = task_repo::resolve_task(conn, parent_ref)?;
    if parent.ticket_id != ticket_id {
        return Err(TasktimeError::cross_ticket_parent());
    }
    ancestry::validate_parent(&ticket_edges(conn, ticket_id)?, None, &parent.id)?;
    Ok(parent)
}

fn run_add(
    title: &str,
    ticket_ref: &str,
    parent_ref: Option<&str>,
    task_type: TaskTypeArg,
    predict_first: Option<f64>,
    operating: bool,
    json_output: bool,
) -> Result<(), TasktimeError> {
    let title = check_title(title)?;
    check_hours("--predict-first", predict_first)?;
    if operating && !has_first_prediction(predict_first) {
        return Err(TasktimeError::validation(
            "Operating mode needs a first-pass prediction (--predict-first)",
        ));
    }

    let conn = connection::open_db()?;
    let ticket = ticket_repo::resolve_ticket(&conn, ticket_ref)?;
    let parent = parent_ref
        .map(|r| resolve_new_parent(&conn, &ticket.id, r))
        .transpose()?;

    let task = in_transaction(&conn, |conn| {
        task_repo::create_task(
            conn,
            &NewTask {
                ticket_id: &ticket.id,
                parent_id: parent.as_ref().map(|p| p.id.as_str()),
                title,
                task_type: TaskType::from(task_type),
                is_survey_task: !operating,
                predicted_required_time_first: predict_first,
            },
        )
    })?;
    info!(task_id = %task.id, ticket_id = %ticket.id, "task created");

    if json_output {
        let node = TaskNode::load(&conn, task)?;
        output::json::print(&output::json::success(json!({
            "task": output::json::node_json(&node)
        })));
    } else {
        println!("Added task: {} ({})", task.title, task.id);
    }
    Ok(())
}

/// `title` or `title=hours`.
fn parse_child_arg(arg: &str) -> Result<(String, Option<f64>), TasktimeError> {
    if let Some((title, hours)) = arg.rsplit_once('=') {
        if let Ok(h) = hours.trim().parse::<f64>() {
            check_hours("child prediction", Some(h))?;
            return Ok((check_title(title)?.to_string(), Some(h)));
        }
    }
    Ok((check_title(arg)?.to_string(), None))
}

fn run_split(parent_ref: &str, children: &[String], json_output: bool) -> Result<(), TasktimeError> {
    let specs = children
        .iter()
        .map(|c| parse_child_arg(c))
        .collect::<Result<Vec<_>, _>>()?;

    let conn = connection::open_db()?;
    let parent = task_repo::resolve_task(&conn, parent_ref)?;
    ancestry::validate_parent(&ticket_edges(&conn, &parent.ticket_id)?, None, &parent.id)?;

    let created = in_transaction(&conn, |conn| {
        specs
            .iter()
            .map(|(title, hours)| {
                task_repo::create_task(
                    conn,
                    &NewTask {
                        ticket_id: &parent.ticket_id,
                        parent_id: Some(parent.id.as_str()),
                        title,
                        task_type: parent.task_type,
                        is_survey_task: true,
                        predicted_required_time_first: *hours,
                    },
                )
            })
            .collect::<Result<Vec<_>, _>>()
    })?;
    info!(parent_id = %parent.id, count = created.len(), "tasks split");

    if json_output {
        let tasks: Vec<_> = created.iter().map(output::json::task_json).collect();
        output::json::print(&output::json::success(json!({
            "parent": output::json::task_json(&parent),
            "tasks": tasks
        })));
    } else {
        println!("Split {} into {} tasks:", parent.title, created.len());
        for t in &created {
            println!("  {} ({})", t.title, t.id);
        }
    }
    Ok(())
}

fn run_tree(ticket_ref: &str, json_output: bool) -> Result<(), TasktimeError> {
    let conn = connection::open_db()?;
    let ticket = ticket_repo::resolve_ticket(&conn, ticket_ref)?;
    let nodes = tree::fetch_tree(&conn, &ticket.id)?;
    let progress = task_repo::ticket_progress(&conn, &ticket.id)?;

    if json_output {
        let tasks: Vec<_> = nodes.iter().map(output::json::node_json).collect();
        output::json::print(&output::json::success(json!({
            "ticket": output::json::ticket_json(&ticket),
            "progress": output::json::progress_json(&progress),
            "tasks": tasks
        })));
    } else {
        println!("Ticket: {} ({})", ticket.title, ticket.id);
        output::text::print_progress(&progress);
        output::text::print_tree(&nodes);
    }
    Ok(())
}

fn load_with_children(conn: &Connection, task: Task) -> Result<TaskNode, TasktimeError> {
    let children = task_repo::list_open_children(conn, &task.id)?;
    let mut node = TaskNode::load(conn, task)?;
    node.children = children
        .into_iter()
        .map(|c| TaskNode::load(conn, c))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(node)
}

fn run_show(reference: &str, json_output: bool) -> Result<(), TasktimeError> {
    let conn = connection::open_db()?;
    let task = task_repo::resolve_task(&conn, reference)?;
    let node = load_with_children(&conn, task)?;

    if json_output {
        let gauge = estimate::gauge_view(node.task.progress_rate, node.done_time_rate);
        output::json::print(&output::json::success(json!({
            "task": output::json::node_json(&node),
            "gauge": output::json::gauge_json(&gauge)
        })));
    } else {
        output::text::print_task_detail(&node);
    }
    Ok(())
}

struct TaskUpdate {
    status: Option<TaskStatusArg>,
    task_type: Option<TaskTypeArg>,
    progress_rate: Option<i64>,
    title: Option<String>,
    parent: Option<String>,
    ticket: Option<String>,
    plan: PlanChanges,
    mode: Option<ModeArg>,
    /// (operating, survey) cumulative seconds
    times: Option<(i64, i64)>,
}

impl TaskUpdate {
    fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.task_type.is_none()
            && self.progress_rate.is_none()
            && self.title.is_none()
            && self.parent.is_none()
            && self.ticket.is_none()
            && self.plan.is_empty()
            && self.mode.is_none()
            && self.times.is_none()
    }

    fn validate(&self) -> Result<(), TasktimeError> {
        if let Some(rate) = self.progress_rate {
            if !(0..=100).contains(&rate) {
                return Err(TasktimeError::validation(format!(
                    "--progress-rate must be between 0 and 100, got {rate}"
                )));
            }
        }
        if let Some(ref title) = self.title {
            check_title(title)?;
        }
        check_hours("--predict-first", self.plan.predicted_required_time_first)?;
        check_hours("--predict-final", self.plan.predicted_required_time_final)?;
        check_hours("--predict-survey-first", self.plan.predicted_survey_time_first)?;
        check_hours("--predict-survey-final", self.plan.predicted_survey_time_final)?;
        if let Some((operating, survey)) = self.times {
            if operating < 0 || survey < 0 {
                return Err(TasktimeError::validation("Tracked times must not be negative"));
            }
        }
        Ok(())
    }
}

fn run_update(reference: &str, update: TaskUpdate, json_output: bool) -> Result<(), TasktimeError> {
    if update.is_empty() {
        return Err(TasktimeError::validation("Nothing to update"));
    }
    update.validate()?;

    let conn = connection::open_db()?;
    let original = task_repo::resolve_task(&conn, reference)?;
    let mut task = original.clone();

    // ticket and parent
    let target_ticket = match update.ticket {
        Some(ref r) => ticket_repo::resolve_ticket(&conn, r)?.id,
        None => task.ticket_id.clone(),
    };
    let moving = target_ticket != task.ticket_id;
    let new_parent: Option<Option<String>> = match update.parent.as_deref() {
        Some("none") => Some(None),
        Some(r) => Some(Some(task_repo::resolve_task(&conn, r)?.id)),
        None if moving => Some(None),
        None => None,
    };
    let mut edges = ticket_edges(&conn, &task.ticket_id)?;
    if moving {
        edges.extend(ticket_edges(&conn, &target_ticket)?);
    }
    if let Some(Some(ref parent_id)) = new_parent {
        let parent = task_repo::get_task_by_id(&conn, parent_id)?;
        if parent.ticket_id != target_ticket {
            return Err(TasktimeError::cross_ticket_parent());
        }
        ancestry::validate_parent(&edges, Some(&task.id), parent_id)?;
    }
    let descendants: Vec<String> = if moving {
        Ancestry::new(&edges)
            .descendants(&task.id)
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };

    // mode
    let stored_plan = plan_repo::get_plan_for_task(&conn, &task.id)?;
    if update.mode == Some(ModeArg::Operating) {
        let first = update
            .plan
            .predicted_required_time_first
            .or(stored_plan.predicted_required_time_first);
        if !has_first_prediction(first) {
            return Err(TasktimeError::validation(
                "Operating mode needs a first-pass prediction (--predict-first)",
            ));
        }
    }

    if let Some(status) = update.status {
        task.status = TaskStatus::from(status);
    }
    if let Some(task_type) = update.task_type {
        task.task_type = TaskType::from(task_type);
    }
    if let Some(rate) = update.progress_rate {
        task.progress_rate = rate as u8;
    }
    if let Some(ref title) = update.title {
        task.title = check_title(title)?.to_string();
    }
    if let Some(parent) = new_parent {
        task.parent_id = parent;
    }
    task.ticket_id = target_ticket.clone();
    if let Some(mode) = update.mode {
        task.is_survey_task = mode == ModeArg::Survey;
    }

    let history = in_transaction(&conn, |conn| {
        task_repo::save_task(conn, &task)?;
        for id in &descendants {
            let mut child = task_repo::get_task_by_id(conn, id)?;
            child.ticket_id = target_ticket.clone();
            task_repo::save_task(conn, &child)?;
        }
        if !update.plan.is_empty() {
            plan_repo::update_plan(conn, &task.id, &update.plan)?;
        }
        if original.status.is_done() != task.status.is_done() {
            achievement_repo::set_done(conn, &task.id, task.status.is_done())?;
        }
        match update.times {
            Some((operating, survey)) => {
                let today = Local::now().date_naive();
                let achievement = achievement_repo::get_achievement_for_task(conn, &task.id)?;
                let past = TaskClock::from_histories(&task.id, task.is_survey_task, &achievement.histories, today);
                // earlier days are closed; only today's share can change
                if operating < past.past_operating_time() || survey < past.past_survey_time() {
                    return Err(TasktimeError::validation(format!(
                        "Totals cannot go below time recorded before today (operating {}s, survey {}s)",
                        past.past_operating_time(),
                        past.past_survey_time()
                    )));
                }
                let mut record = past.flush_record(today);
                record.operating_time = operating;
                record.survey_time = survey;
                achievement_repo::upsert_daily(conn, &task.id, &record.daily_times()).map(Some)
            }
            None => Ok(None),
        }
    })?;
    debug!(task_id = %task.id, ?history, moved = descendants.len(), "task updated");

    let node = load_with_children(&conn, task_repo::get_task_by_id(&conn, &task.id)?)?;
    if json_output {
        let mut data = json!({ "task": output::json::node_json(&node) });
        if let Some(outcome) = history {
            data["history"] = json!(outcome);
        }
        output::json::print(&output::json::success(data));
    } else {
        println!("Updated task: {} ({})", node.task.title, node.task.id);
        if let Some(outcome) = history {
            let verb = match outcome {
                UpsertOutcome::Created => "created",
                UpsertOutcome::Updated => "updated",
            };
            println!("  Today's history {verb}");
        }
    }
    Ok(())
}
