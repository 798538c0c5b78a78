//! Progress estimation from tracked time.
//!
//! The time-based rate answers "given the time spent and the first-pass
//! prediction, how far along should this task be". It is shown next to the
//! manually reported progress rate so over- and under-estimates stand out.

use serde::Serialize;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Percentage of the first-pass prediction already spent, rounded to the nearest integer.
///
/// A missing or zero prediction yields 0.
pub fn done_time_rate(operating_secs: i64, survey_secs: i64, predicted_first_hours: Option<f64>) -> i64 {
    let predicted = match predicted_first_hours {
        Some(hours) if hours != 0.0 => hours,
        _ => return 0,
    };
    let spent_hours = (operating_secs + survey_secs) as f64 / SECONDS_PER_HOUR;
    (spent_hours / predicted * 100.0).round() as i64
}

/// Whether a first-pass prediction can serve as the denominator of the time-based rate.
pub fn has_first_prediction(predicted_first_hours: Option<f64>) -> bool {
    matches!(predicted_first_hours, Some(h) if h > 0.0)
}

/// Secondary gauge contrasting the time-based rate with the manual rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SecondaryGauge {
    pub value: i64,
    /// Upper bound of the "safe" arc; never reaches 100 so the danger arc stays visible.
    pub safe_limit: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GaugeView {
    pub progress_rate: u8,
    pub done_time_rate: i64,
    /// `Some(0)` hides the danger arc of the primary gauge; `None` keeps the default.
    pub primary_danger_limit: Option<u8>,
    pub secondary: Option<SecondaryGauge>,
}

pub fn gauge_view(progress_rate: u8, done_time_rate: i64) -> GaugeView {
    let primary_danger_limit = (done_time_rate < 1).then_some(0);
    let secondary = (done_time_rate > 1).then(|| SecondaryGauge {
        value: done_time_rate,
        safe_limit: progress_rate.min(99),
    });
    GaugeView {
        progress_rate,
        done_time_rate,
        primary_danger_limit,
        secondary,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    NoPrediction,
    WithinEstimate,
    /// More of the prediction is spent than the reported progress covers.
    OverEstimate,
}

impl Assessment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPrediction => "no_prediction",
            Self::WithinEstimate => "within_estimate",
            Self::OverEstimate => "over_estimate",
        }
    }
}

pub fn assess(progress_rate: u8, done_time_rate: i64, predicted_first_hours: Option<f64>) -> Assessment {
    match predicted_first_hours {
        None => Assessment::NoPrediction,
        Some(h) if h == 0.0 => Assessment::NoPrediction,
        Some(_) if done_time_rate > i64::from(progress_rate) => Assessment::OverEstimate,
        Some(_) => Assessment::WithinEstimate,
    }
}
