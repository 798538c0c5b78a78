use chrono::NaiveDate;
use serde::Serialize;

use crate::db::achievement_repo::DailyTimes;
use crate::estimate;
use crate::models::History;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeKind {
    Survey,
    Operating,
}

impl TimeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Survey => "survey",
            Self::Operating => "operating",
        }
    }
}

/// Per-task time counters for one session, in seconds.
///
/// `operating_time`/`survey_time` are cumulative over all history and advance
/// with ticks. The `past_*` baselines cover days strictly before the session
/// day and are fixed when the clock is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskClock {
    task_id: String,
    is_survey_task: bool,
    operating_time: i64,
    survey_time: i64,
    past_operating_time: i64,
    past_survey_time: i64,
    #[serde(skip)]
    loaded_total: i64,
}

impl TaskClock {
    pub fn new(task_id: impl Into<String>, is_survey_task: bool) -> Self {
        Self {
            task_id: task_id.into(),
            is_survey_task,
            operating_time: 0,
            survey_time: 0,
            past_operating_time: 0,
            past_survey_time: 0,
            loaded_total: 0,
        }
    }

    /// Rebuild counters from stored history rows.
    pub fn from_histories(
        task_id: impl Into<String>,
        is_survey_task: bool,
        histories: &[History],
        today: NaiveDate,
    ) -> Self {
        let mut clock = Self::new(task_id, is_survey_task);
        for h in histories {
            clock.operating_time += h.operating_time;
            clock.survey_time += h.survey_time;
            if h.day < today {
                clock.past_operating_time += h.operating_time;
                clock.past_survey_time += h.survey_time;
            }
        }
        clock.loaded_total = clock.total();
        clock
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn is_survey_task(&self) -> bool {
        self.is_survey_task
    }

    pub fn set_survey_task(&mut self, is_survey_task: bool) {
        self.is_survey_task = is_survey_task;
    }

    pub fn kind(&self) -> TimeKind {
        if self.is_survey_task {
            TimeKind::Survey
        } else {
            TimeKind::Operating
        }
    }

    pub fn operating_time(&self) -> i64 {
        self.operating_time
    }

    pub fn survey_time(&self) -> i64 {
        self.survey_time
    }

    pub fn past_operating_time(&self) -> i64 {
        self.past_operating_time
    }

    pub fn past_survey_time(&self) -> i64 {
        self.past_survey_time
    }

    pub fn today_operating_time(&self) -> i64 {
        (self.operating_time - self.past_operating_time).max(0)
    }

    pub fn today_survey_time(&self) -> i64 {
        (self.survey_time - self.past_survey_time).max(0)
    }

    pub fn total(&self) -> i64 {
        self.operating_time + self.survey_time
    }

    /// True once a tick has landed on this clock since it was loaded.
    pub fn has_moved(&self) -> bool {
        self.total() != self.loaded_total
    }

    /// Count one second against the current mode. Returns the counter that moved and its new value.
    pub fn advance(&mut self) -> (TimeKind, i64) {
        let kind = self.kind();
        let counter = match kind {
            TimeKind::Survey => &mut self.survey_time,
            TimeKind::Operating => &mut self.operating_time,
        };
        *counter += 1;
        (kind, *counter)
    }

    pub fn done_time_rate(&self, predicted_first_hours: Option<f64>) -> i64 {
        estimate::done_time_rate(self.operating_time, self.survey_time, predicted_first_hours)
    }

    pub fn flush_record(&self, day: NaiveDate) -> FlushRecord {
        FlushRecord {
            task_id: self.task_id.clone(),
            day,
            operating_time: self.operating_time,
            survey_time: self.survey_time,
            past_operating_time: self.past_operating_time,
            past_survey_time: self.past_survey_time,
        }
    }
}

/// Snapshot of a task's counters handed to the persistence side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlushRecord {
    pub task_id: String,
    pub day: NaiveDate,
    pub operating_time: i64,
    pub survey_time: i64,
    pub past_operating_time: i64,
    pub past_survey_time: i64,
}

impl FlushRecord {
    pub fn daily_times(&self) -> DailyTimes {
        DailyTimes {
            day: self.day,
            cumulative_operating: self.operating_time,
            cumulative_survey: self.survey_time,
            day_operating: (self.operating_time - self.past_operating_time).max(0),
            day_survey: (self.survey_time - self.past_survey_time).max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(day: NaiveDate, operating: i64, survey: i64) -> History {
        History {
            id: format!("h-{day}"),
            achievement_id: "a".into(),
            day,
            operating_time: operating,
            survey_time: survey,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_baselines_exclude_today() {
        let today = day(2026, 10, 17);
        let histories = vec![history(day(2026, 10, 16), 100, 50), history(today, 10, 5)];
        let clock = TaskClock::from_histories("t", true, &histories, today);

        assert_eq!(clock.past_operating_time(), 100);
        assert_eq!(clock.past_survey_time(), 50);
        assert_eq!(clock.operating_time(), 110);
        assert_eq!(clock.survey_time(), 55);
        assert_eq!(clock.today_operating_time(), 10);
        assert_eq!(clock.today_survey_time(), 5);
        assert!(!clock.has_moved());
    }

    #[test]
    fn test_has_moved_after_a_tick() {
        let today = day(2026, 10, 17);
        let mut clock = TaskClock::from_histories("t", false, &[history(today, 30, 0)], today);
        assert!(!clock.has_moved());
        clock.advance();
        assert!(clock.has_moved());
    }

    #[test]
    fn test_advance_follows_mode() {
        let mut clock = TaskClock::new("t", true);
        assert_eq!(clock.advance(), (TimeKind::Survey, 1));
        assert_eq!(clock.advance(), (TimeKind::Survey, 2));
        clock.set_survey_task(false);
        assert_eq!(clock.advance(), (TimeKind::Operating, 1));
        assert_eq!(clock.survey_time(), 2);
        assert_eq!(clock.operating_time(), 1);
    }

    #[test]
    fn test_ticks_leave_baselines_alone() {
        let today = day(2026, 10, 17);
        let histories = vec![history(day(2026, 10, 1), 100, 50)];
        let mut clock = TaskClock::from_histories("t", false, &histories, today);
        for _ in 0..90 {
            clock.advance();
        }
        assert_eq!(clock.past_operating_time(), 100);
        assert_eq!(clock.past_survey_time(), 50);
        assert_eq!(clock.today_operating_time(), 90);
    }

    #[test]
    fn test_flush_record_daily_split() {
        let today = day(2026, 10, 17);
        let histories = vec![history(day(2026, 10, 16), 100, 50), history(today, 10, 5)];
        let mut clock = TaskClock::from_histories("t", false, &histories, today);
        clock.advance();

        let times = clock.flush_record(today).daily_times();
        assert_eq!(times.cumulative_operating, 111);
        assert_eq!(times.cumulative_survey, 55);
        assert_eq!(times.day_operating, 11);
        assert_eq!(times.day_survey, 5);
    }
}
