use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::{achievement_repo, plan_repo, task_repo};
use crate::error::TasktimeError;
use crate::estimate;
use crate::models::Task;
use crate::timer::{SessionTimer, TimerEvent, TimerSettings, TimerTick};

use super::accumulator::TaskClock;
use super::bridge::{Bridge, BridgeStats, SqliteStore};
use super::session::Session;

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Reset,
    Switch,
    Task(String),
    Stop,
    Lap,
    Survey,
    Operating,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, TasktimeError> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default();
        let arg = parts.next();
        let cmd = match (verb, arg) {
            ("start", None) => Self::Start,
            ("pause", None) => Self::Pause,
            ("reset", None) => Self::Reset,
            ("switch", None) => Self::Switch,
            ("task", Some(reference)) => Self::Task(reference.to_string()),
            ("stop", None) => Self::Stop,
            ("lap", None) => Self::Lap,
            ("survey", None) => Self::Survey,
            ("operating", None) => Self::Operating,
            ("quit", None) | ("exit", None) => Self::Quit,
            _ => {
                return Err(TasktimeError::validation(format!(
                    "unknown command '{}'",
                    line.trim()
                )))
            }
        };
        if parts.next().is_some() {
            return Err(TasktimeError::validation(format!("unexpected arguments in '{}'", line.trim())));
        }
        Ok(cmd)
    }
}

/// What a command did, for the caller to report.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Timer(Option<TimerEvent>),
    Activated { task_id: String, title: String },
    Deactivated,
    TermClosed { task_id: String },
    ModeChanged { task_id: String, is_survey_task: bool },
    Quit,
}

/// A tracking session bound to the project database: timer, task clocks and bridge.
pub struct Tracker<'c> {
    conn: &'c Connection,
    timer: SessionTimer,
    session: Session,
    bridge: Bridge<SqliteStore<'c>>,
}

impl<'c> Tracker<'c> {
    pub fn new(conn: &'c Connection, day: NaiveDate, settings: TimerSettings, now: DateTime<Utc>) -> Self {
        Self {
            conn,
            timer: SessionTimer::new(settings, now),
            session: Session::new(day),
            bridge: Bridge::new(SqliteStore::new(conn)),
        }
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stats(&self) -> BridgeStats {
        self.bridge.stats()
    }

    /// Register `task` with baselines computed from its stored history.
    pub fn load(&mut self, task: &Task) -> Result<(), TasktimeError> {
        if self.session.clock(&task.id).is_some() {
            return Ok(());
        }
        let achievement = achievement_repo::get_achievement_for_task(self.conn, &task.id)?;
        let clock = TaskClock::from_histories(
            &task.id,
            task.is_survey_task,
            &achievement.histories,
            self.session.day(),
        );
        debug!(
            task_id = %task.id,
            past_operating = clock.past_operating_time(),
            past_survey = clock.past_survey_time(),
            "task loaded"
        );
        self.session.register(clock);
        Ok(())
    }

    /// Resolve, load on demand, and hand the active token to a task.
    pub fn activate(&mut self, reference: &str, now: DateTime<Utc>) -> Result<Task, TasktimeError> {
        let task = task_repo::resolve_task(self.conn, reference)?;
        self.load(&task)?;
        let actions = self.session.activate(&task.id, now)?;
        self.bridge.apply_all(&actions);
        Ok(task)
    }

    pub fn handle(&mut self, command: Command, now: DateTime<Utc>) -> Result<Reply, TasktimeError> {
        match command {
            Command::Start => Ok(Reply::Timer(self.timer.start(now))),
            Command::Pause => Ok(Reply::Timer(self.timer.pause(now))),
            Command::Reset => Ok(Reply::Timer(Some(self.timer.reset(now)))),
            Command::Switch => Ok(Reply::Timer(Some(self.timer.switch_mode(now)))),
            Command::Task(reference) => {
                let task = self.activate(&reference, now)?;
                Ok(Reply::Activated { task_id: task.id, title: task.title })
            }
            Command::Stop => {
                let actions = self.session.deactivate(now);
                self.bridge.apply_all(&actions);
                Ok(Reply::Deactivated)
            }
            Command::Lap => {
                let task_id = self
                    .session
                    .active_task_id()
                    .map(str::to_string)
                    .ok_or_else(|| TasktimeError::validation("No active task"))?;
                let actions = self.session.close_term(now);
                self.bridge.apply_all(&actions);
                Ok(Reply::TermClosed { task_id })
            }
            Command::Survey => self.set_mode(true),
            Command::Operating => self.set_mode(false),
            Command::Quit => Ok(Reply::Quit),
        }
    }

    fn set_mode(&mut self, is_survey_task: bool) -> Result<Reply, TasktimeError> {
        let task_id = self
            .session
            .active_task_id()
            .map(str::to_string)
            .ok_or_else(|| TasktimeError::validation("No active task"))?;
        if !is_survey_task {
            let plan = plan_repo::get_plan_for_task(self.conn, &task_id)?;
            if !estimate::has_first_prediction(plan.predicted_required_time_first) {
                return Err(TasktimeError::validation(
                    "Operating mode needs a first-pass prediction",
                ));
            }
        }
        let actions = self.session.set_survey_mode(&task_id, is_survey_task)?;
        self.bridge.apply_all(&actions);
        task_repo::set_survey_mode(self.conn, &task_id, is_survey_task)?;
        Ok(Reply::ModeChanged { task_id, is_survey_task })
    }

    /// One second of wall time. Only running seconds reach the task clocks.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TimerTick {
        let tick = self.timer.tick(now);
        if tick.counted {
            let actions = self.session.on_tick(now);
            self.bridge.apply_all(&actions);
        }
        tick
    }

    /// Close the open interval and write the final counts.
    pub fn finish(&mut self, now: DateTime<Utc>) -> BridgeStats {
        let actions = self.session.finish(now);
        self.bridge.apply_all(&actions);
        let stats = self.bridge.stats();
        info!(
            elapsed_secs = self.timer.elapsed_secs(),
            created = stats.created,
            updated = stats.updated,
            failures = stats.failures,
            "session finished"
        );
        stats
    }
}
