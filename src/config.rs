use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::connection;
use crate::error::TasktimeError;
use crate::timer::TimerSettings;

pub const MIN_MINUTES: u32 = 1;
pub const MAX_MINUTES: u32 = 240;

/// Keys accepted by `config set`.
pub const KEYS: &[&str] = &["operating-minutes", "rest-minutes"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerSettings,
}

impl Config {
    /// Project config, or defaults when no file has been written yet.
    pub fn load() -> Result<Self, TasktimeError> {
        Self::load_from(&connection::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, TasktimeError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| TasktimeError::config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| TasktimeError::config(format!("invalid config {}: {e}", path.display())))?;
        config.validate()?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn save(&self) -> Result<(), TasktimeError> {
        self.save_to(&connection::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), TasktimeError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| TasktimeError::config(e.to_string()))?;
        }
        let raw = serde_json::to_string_pretty(self).map_err(|e| TasktimeError::config(e.to_string()))?;
        fs::write(path, raw).map_err(|e| TasktimeError::config(format!("cannot write {}: {e}", path.display())))
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), TasktimeError> {
        let minutes = parse_minutes(key, value)?;
        match key {
            "operating-minutes" => self.timer.operating_minutes = minutes,
            "rest-minutes" => self.timer.rest_minutes = minutes,
            _ => {
                return Err(TasktimeError::config(format!(
                    "unknown key '{key}'. Valid keys: {}",
                    KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), TasktimeError> {
        check_range("operating-minutes", self.timer.operating_minutes)?;
        check_range("rest-minutes", self.timer.rest_minutes)
    }
}

fn parse_minutes(key: &str, value: &str) -> Result<u32, TasktimeError> {
    if !KEYS.contains(&key) {
        return Err(TasktimeError::config(format!(
            "unknown key '{key}'. Valid keys: {}",
            KEYS.join(", ")
        )));
    }
    let minutes: u32 = value
        .trim()
        .parse()
        .map_err(|_| TasktimeError::config(format!("{key} must be a whole number of minutes, got '{value}'")))?;
    check_range(key, minutes)?;
    Ok(minutes)
}

fn check_range(key: &str, minutes: u32) -> Result<(), TasktimeError> {
    if !(MIN_MINUTES..=MAX_MINUTES).contains(&minutes) {
        return Err(TasktimeError::config(format!(
            "{key} must be between {MIN_MINUTES} and {MAX_MINUTES}, got {minutes}"
        )));
    }
    Ok(())
}
