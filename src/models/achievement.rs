use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cumulative time spent on a task, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub task_id: String,
    pub operating_time: i64,
    pub survey_time: i64,
    pub done_at: Option<String>,
    pub histories: Vec<History>,
}

/// Time recorded for one achievement on one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    pub id: String,
    pub achievement_id: String,
    pub day: NaiveDate,
    pub operating_time: i64,
    pub survey_time: i64,
    pub created_at: String,
    pub updated_at: String,
}
