use serde::{Deserialize, Serialize};

/// Time predictions for a task, in hours.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub task_id: String,
    pub predicted_required_time_first: Option<f64>,
    pub predicted_required_time_final: Option<f64>,
    pub predicted_survey_time_first: Option<f64>,
    pub predicted_survey_time_final: Option<f64>,
    pub survey_detail: Option<String>,
}

/// Partial update for a plan; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct PlanChanges {
    pub predicted_required_time_first: Option<f64>,
    pub predicted_required_time_final: Option<f64>,
    pub predicted_survey_time_first: Option<f64>,
    pub predicted_survey_time_final: Option<f64>,
    pub survey_detail: Option<String>,
}

impl PlanChanges {
    pub fn is_empty(&self) -> bool {
        self.predicted_required_time_first.is_none()
            && self.predicted_required_time_final.is_none()
            && self.predicted_survey_time_first.is_none()
            && self.predicted_survey_time_final.is_none()
            && self.survey_detail.is_none()
    }
}
