use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    Running,
    Pending,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Running => "running",
            Self::Pending => "pending",
            Self::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "running" => Some(Self::Running),
            "pending" => Some(Self::Pending),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// How the task came to exist relative to its survey phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    FirstPass,
    PostSurvey,
    PostSurveyMissed,
    Unknown,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstPass => "first_pass",
            Self::PostSurvey => "post_survey",
            Self::PostSurveyMissed => "post_survey_missed",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "first_pass" => Some(Self::FirstPass),
            "post_survey" => Some(Self::PostSurvey),
            "post_survey_missed" => Some(Self::PostSurveyMissed),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub ticket_id: String,
    pub parent_id: Option<String>,
    pub title: String,
    pub status: TaskStatus,
    pub task_type: TaskType,
    /// `true` while time spent on the task counts as survey time.
    pub is_survey_task: bool,
    /// Manually reported progress, 0..=100.
    pub progress_rate: u8,
    pub created_at: String,
    pub updated_at: String,
}
