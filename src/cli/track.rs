use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use serde_json::json;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::db::{connection, plan_repo};
use crate::error::TasktimeError;
use crate::output;
use crate::output::text::hms;
use crate::timer::{TimerEvent, TimerMode};
use crate::tracker::{Command, Reply, Tracker};

pub fn run(task_ref: &str, seconds: Option<u64>, autostart: bool, json_output: bool) -> i32 {
    super::exit_code(run_track(task_ref, seconds, autostart, json_output), json_output)
}

/// Status lines go to stderr when stdout carries the JSON envelope.
fn say(json_output: bool, line: &str) {
    if json_output {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

fn ring_bell(json_output: bool) {
    if json_output {
        eprint!("\x07");
        let _ = io::stderr().flush();
    } else {
        print!("\x07");
        let _ = io::stdout().flush();
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn describe_event(event: &TimerEvent) -> String {
    match event {
        TimerEvent::Started { mode, remaining_secs, .. } => {
            format!("Timer started ({}, {} left)", mode.as_str(), hms(*remaining_secs))
        }
        TimerEvent::Paused { mode, remaining_secs, .. } => {
            format!("Timer paused ({}, {} left)", mode.as_str(), hms(*remaining_secs))
        }
        TimerEvent::Restarted { mode, .. } => format!("Timer reset ({})", mode.as_str()),
        TimerEvent::ModeSwitched { mode, .. } => format!("Switched to {} interval", mode.as_str()),
        TimerEvent::Expired { mode, .. } => mode.notification().to_string(),
    }
}

fn run_track(task_ref: &str, seconds: Option<u64>, autostart: bool, json_output: bool) -> Result<(), TasktimeError> {
    let conn = connection::open_db()?;
    let config = Config::load()?;
    let mut clock = SystemClock::new();
    let start = clock.now();

    let mut tracker = Tracker::new(&conn, clock.today(), config.timer, start);
    let task = tracker.activate(task_ref, start)?;
    say(json_output, &format!("Tracking: {} ({})", task.title, task.id));
    if autostart {
        let reply = tracker.handle(Command::Start, start)?;
        report(json_output, &reply);
    }

    let input = spawn_stdin_reader();
    let mut input_open = true;
    let mut ticks: u64 = 0;

    'session: loop {
        if seconds.is_some_and(|limit| ticks >= limit) {
            break;
        }
        clock.wait_tick();
        ticks += 1;
        let now = clock.now();

        while input_open {
            let line = match input.try_recv() {
                Ok(line) => line,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    input_open = false;
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let reply = Command::parse(&line).and_then(|cmd| tracker.handle(cmd, now));
            match reply {
                Ok(Reply::Quit) => break 'session,
                Ok(reply) => report(json_output, &reply),
                Err(e) => say(json_output, &format!("Error: {}", e.message)),
            }
        }
        // without a tick limit, closing stdin ends the session
        if !input_open && seconds.is_none() {
            debug!("stdin closed");
            break;
        }

        let tick = tracker.tick(now);
        if let Some(event) = tick.event {
            say(json_output, &describe_event(&event));
            ring_bell(json_output);
            if matches!(event, TimerEvent::Expired { mode: TimerMode::Operating, .. }) {
                break;
            }
        }
    }

    let end = clock.now();
    let stats = tracker.finish(end);
    if stats.failures > 0 {
        warn!(failures = stats.failures, "some writes failed during the session");
    }

    let mut clocks = Vec::new();
    for c in tracker.session().clocks() {
        let plan = plan_repo::get_plan_for_task(&conn, c.task_id())?;
        clocks.push((c.clone(), c.done_time_rate(plan.predicted_required_time_first)));
    }
    if json_output {
        let tasks: Vec<_> = clocks
            .iter()
            .map(|(c, rate)| {
                json!({
                    "task_id": c.task_id(),
                    "operating_time": c.operating_time(),
                    "survey_time": c.survey_time(),
                    "today_operating_time": c.today_operating_time(),
                    "today_survey_time": c.today_survey_time(),
                    "done_time_rate": rate
                })
            })
            .collect();
        output::json::print(&output::json::success(json!({
            "elapsed_secs": tracker.timer().elapsed_secs(),
            "tasks": tasks,
            "writes": output::json::bridge_stats_json(&stats)
        })));
    } else {
        println!("Session ended after {} tracked.", hms(tracker.timer().elapsed_secs() as i64));
        for (c, rate) in &clocks {
            println!(
                "  {} today: operating {} survey {}  time {}%",
                c.task_id(),
                hms(c.today_operating_time()),
                hms(c.today_survey_time()),
                rate
            );
        }
    }
    Ok(())
}

fn report(json_output: bool, reply: &Reply) {
    match reply {
        Reply::Timer(Some(event)) => say(json_output, &describe_event(event)),
        Reply::Timer(None) => {}
        Reply::Activated { task_id, title } => say(json_output, &format!("Tracking: {title} ({task_id})")),
        Reply::Deactivated => say(json_output, "No active task"),
        Reply::TermClosed { task_id } => say(json_output, &format!("Interval closed ({task_id})")),
        Reply::ModeChanged { is_survey_task, .. } => say(
            json_output,
            if *is_survey_task { "Mode: survey" } else { "Mode: operating" },
        ),
        Reply::Quit => {}
    }
}
