use serde::{Deserialize, Serialize};

/// Review checklist attached to a task. Only the identity is tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Check {
    pub id: String,
    pub task_id: String,
}

/// Retrospective notes attached to a task. Only the identity is tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: String,
    pub task_id: String,
}
