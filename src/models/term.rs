use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One contiguous interval during which a task was the active task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub task_id: String,
    /// Correlation id shared by every save of the same interval.
    pub term_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl Term {
    pub fn duration_secs(&self) -> i64 {
        (self.ended_at - self.started_at).num_seconds().max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.started_at == self.ended_at
    }

    pub fn local_day(&self) -> NaiveDate {
        self.started_at.with_timezone(&Local).date_naive()
    }
}
