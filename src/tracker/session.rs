use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::TasktimeError;
use crate::models::Term;

use super::accumulator::{FlushRecord, TaskClock};

/// The single task currently accruing time, with the interval it is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveTask {
    pub task_id: String,
    pub term_id: String,
    pub started_at: DateTime<Utc>,
}

impl ActiveTask {
    fn open(task_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            task_id: task_id.to_string(),
            term_id: ulid::Ulid::new().to_string(),
            started_at: now,
        }
    }

    fn term_until(&self, now: DateTime<Utc>) -> Term {
        Term {
            task_id: self.task_id.clone(),
            term_id: self.term_id.clone(),
            started_at: self.started_at,
            ended_at: now,
        }
    }
}

/// Work for the persistence side produced by a session transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionAction {
    Flush(FlushRecord),
    SaveTerm(Term),
}

/// Fires once per elapsed minute, one second past the boundary.
pub fn is_minute_boundary(counter: i64) -> bool {
    counter % 60 == 1
}

/// Session-scoped owner of the task clocks and of the active-task token.
///
/// Exactly one task accrues time per tick. Activating a task hands it the
/// token, closing the previous holder's interval first.
#[derive(Debug, Clone)]
pub struct Session {
    day: NaiveDate,
    clocks: BTreeMap<String, TaskClock>,
    active: Option<ActiveTask>,
}

impl Session {
    /// `day` is the calendar day every flush of this session is recorded under.
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            clocks: BTreeMap::new(),
            active: None,
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// Add a clock. A clock already in the session keeps its in-session counts.
    pub fn register(&mut self, clock: TaskClock) -> bool {
        if self.clocks.contains_key(clock.task_id()) {
            return false;
        }
        self.clocks.insert(clock.task_id().to_string(), clock);
        true
    }

    pub fn clock(&self, task_id: &str) -> Option<&TaskClock> {
        self.clocks.get(task_id)
    }

    pub fn clocks(&self) -> impl Iterator<Item = &TaskClock> {
        self.clocks.values()
    }

    pub fn active(&self) -> Option<&ActiveTask> {
        self.active.as_ref()
    }

    pub fn active_task_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.task_id.as_str())
    }

    pub fn is_active(&self, task_id: &str) -> bool {
        self.active_task_id() == Some(task_id)
    }

    /// Sum of tracked seconds over every clock in the session.
    pub fn total_tracked(&self) -> i64 {
        self.clocks.values().map(TaskClock::total).sum()
    }

    /// Give `task_id` the active token. Activating the holder again is a no-op.
    pub fn activate(&mut self, task_id: &str, now: DateTime<Utc>) -> Result<Vec<SessionAction>, TasktimeError> {
        if !self.clocks.contains_key(task_id) {
            return Err(TasktimeError::task_not_found(task_id));
        }
        if self.is_active(task_id) {
            return Ok(Vec::new());
        }
        let mut actions = self.deactivate(now);
        let active = ActiveTask::open(task_id, now);
        debug!(task_id, term_id = %active.term_id, "task activated");
        actions.push(SessionAction::SaveTerm(active.term_until(now)));
        self.active = Some(active);
        Ok(actions)
    }

    /// Release the token: close the interval and flush the released task if it
    /// earned time in this session.
    pub fn deactivate(&mut self, now: DateTime<Utc>) -> Vec<SessionAction> {
        let Some(active) = self.active.take() else {
            return Vec::new();
        };
        debug!(task_id = %active.task_id, term_id = %active.term_id, "task deactivated");
        let mut actions = vec![SessionAction::SaveTerm(active.term_until(now))];
        if let Some(clock) = self.clocks.get(&active.task_id).filter(|c| c.has_moved()) {
            actions.push(SessionAction::Flush(clock.flush_record(self.day)));
        }
        actions
    }

    /// Close the current interval and open a new one for the same task.
    pub fn close_term(&mut self, now: DateTime<Utc>) -> Vec<SessionAction> {
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };
        let closed = active.term_until(now);
        *active = ActiveTask::open(&closed.task_id, now);
        vec![
            SessionAction::SaveTerm(closed),
            SessionAction::SaveTerm(active.term_until(now)),
        ]
    }

    /// Switch a task between survey and operating accrual. Returns a flush of the
    /// counters as they stood before the switch.
    pub fn set_survey_mode(&mut self, task_id: &str, is_survey_task: bool) -> Result<Vec<SessionAction>, TasktimeError> {
        let day = self.day;
        let clock = self
            .clocks
            .get_mut(task_id)
            .ok_or_else(|| TasktimeError::task_not_found(task_id))?;
        if clock.is_survey_task() == is_survey_task {
            return Ok(Vec::new());
        }
        let flush = clock.flush_record(day);
        clock.set_survey_task(is_survey_task);
        Ok(vec![SessionAction::Flush(flush)])
    }

    /// Advance the active task by one second. On a minute boundary the
    /// counters and the open interval are handed out for persisting.
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> Vec<SessionAction> {
        let Some(active) = self.active.as_ref() else {
            return Vec::new();
        };
        let Some(clock) = self.clocks.get_mut(&active.task_id) else {
            return Vec::new();
        };
        let (kind, value) = clock.advance();
        if !is_minute_boundary(value) {
            return Vec::new();
        }
        debug!(task_id = %active.task_id, kind = kind.as_str(), value, "minute boundary");
        vec![
            SessionAction::Flush(clock.flush_record(self.day)),
            SessionAction::SaveTerm(active.term_until(now)),
        ]
    }

    /// End of session: release the token, persisting whatever is open.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Vec<SessionAction> {
        self.deactivate(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_with(tasks: &[(&str, bool)]) -> Session {
        let mut session = Session::new(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
        for (id, survey) in tasks {
            session.register(TaskClock::new(*id, *survey));
        }
        session
    }

    #[test]
    fn test_minute_boundary_predicate() {
        assert!(!is_minute_boundary(0));
        assert!(is_minute_boundary(1));
        assert!(!is_minute_boundary(60));
        assert!(is_minute_boundary(61));
        assert!(is_minute_boundary(121));
    }

    #[test]
    fn test_activate_unknown_task_fails() {
        let mut session = session_with(&[("a", true)]);
        let err = session.activate("zzz", Utc::now()).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::TaskNotFound);
    }

    #[test]
    fn test_no_active_task_means_no_accrual() {
        let mut session = session_with(&[("a", true)]);
        assert!(session.on_tick(Utc::now()).is_empty());
        assert_eq!(session.total_tracked(), 0);
    }

    #[test]
    fn test_activation_moves_token_and_closes_previous_term() {
        let now = Utc::now();
        let mut session = session_with(&[("a", true), ("b", false)]);
        session.activate("a", now).unwrap();
        session.on_tick(now);
        let first_term = session.active().unwrap().term_id.clone();

        let later = now + Duration::seconds(5);
        let actions = session.activate("b", later).unwrap();
        assert_eq!(session.active_task_id(), Some("b"));
        assert_ne!(session.active().unwrap().term_id, first_term);

        match &actions[0] {
            SessionAction::SaveTerm(term) => {
                assert_eq!(term.task_id, "a");
                assert_eq!(term.term_id, first_term);
                assert_eq!(term.ended_at, later);
            }
            other => panic!("expected closing term, got {other:?}"),
        }
        assert!(matches!(&actions[1], SessionAction::Flush(f) if f.task_id == "a"));
        assert!(matches!(&actions[2], SessionAction::SaveTerm(t) if t.task_id == "b"));
    }

    #[test]
    fn test_reactivating_holder_is_noop() {
        let now = Utc::now();
        let mut session = session_with(&[("a", true)]);
        session.activate("a", now).unwrap();
        let term = session.active().unwrap().term_id.clone();
        assert!(session.activate("a", now).unwrap().is_empty());
        assert_eq!(session.active().unwrap().term_id, term);
    }

    #[test]
    fn test_deactivating_idle_task_skips_flush() {
        let now = Utc::now();
        let mut session = session_with(&[("a", true)]);
        session.activate("a", now).unwrap();
        let actions = session.deactivate(now + Duration::seconds(5));
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], SessionAction::SaveTerm(t) if t.task_id == "a"));
        assert!(session.active().is_none());
    }

    #[test]
    fn test_flush_fires_one_second_past_each_minute() {
        let start = Utc::now();
        let mut session = session_with(&[("a", false)]);
        session.activate("a", start).unwrap();

        let mut flush_values = Vec::new();
        for s in 1..=125 {
            for action in session.on_tick(start + Duration::seconds(s)) {
                if let SessionAction::Flush(f) = action {
                    flush_values.push(f.operating_time);
                }
            }
        }
        assert_eq!(flush_values, vec![1, 61, 121]);
    }

    #[test]
    fn test_close_term_regenerates_correlation_id() {
        let now = Utc::now();
        let mut session = session_with(&[("a", true)]);
        session.activate("a", now).unwrap();
        let before = session.active().unwrap().term_id.clone();

        let actions = session.close_term(now + Duration::seconds(30));
        let after = session.active().unwrap().term_id.clone();
        assert_ne!(before, after);
        assert!(matches!(&actions[0], SessionAction::SaveTerm(t) if t.term_id == before));
        assert!(matches!(&actions[1], SessionAction::SaveTerm(t) if t.term_id == after));
    }

    #[test]
    fn test_set_survey_mode_flushes_previous_counts() {
        let now = Utc::now();
        let mut session = session_with(&[("a", true)]);
        session.activate("a", now).unwrap();
        session.on_tick(now);
        session.on_tick(now);

        let actions = session.set_survey_mode("a", false).unwrap();
        assert!(matches!(&actions[0], SessionAction::Flush(f) if f.survey_time == 2));
        assert!(session.set_survey_mode("a", false).unwrap().is_empty());

        session.on_tick(now);
        assert_eq!(session.clock("a").unwrap().operating_time(), 1);
    }
}
