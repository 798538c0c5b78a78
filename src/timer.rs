//! Pomodoro-style session timer.
//!
//! The timer is a wall-clock state machine over an expiry timestamp and a
//! running flag. It owns no thread: the session driver calls `tick()` once per
//! second and only running ticks count towards tracked time.
//!
//! ```text
//! paused --start--> running --pause--> paused
//!    ^                 |
//!    +----expire-------+   (restarts the same mode, paused)
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Operating,
    Rest,
}

impl TimerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operating => "operating",
            Self::Rest => "rest",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Operating => Self::Rest,
            Self::Rest => Self::Operating,
        }
    }

    /// Message shown when an interval of this mode runs out.
    pub fn notification(&self) -> &'static str {
        match self {
            Self::Operating => "Operating interval finished. Time for a break.",
            Self::Rest => "Rest finished. Back to work.",
        }
    }
}

fn default_operating_minutes() -> u32 {
    25
}

fn default_rest_minutes() -> u32 {
    5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_operating_minutes")]
    pub operating_minutes: u32,
    #[serde(default = "default_rest_minutes")]
    pub rest_minutes: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            operating_minutes: default_operating_minutes(),
            rest_minutes: default_rest_minutes(),
        }
    }
}

impl TimerSettings {
    pub fn duration(&self, mode: TimerMode) -> Duration {
        let minutes = match mode {
            TimerMode::Operating => self.operating_minutes,
            TimerMode::Rest => self.rest_minutes,
        };
        Duration::minutes(i64::from(minutes))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimerEvent {
    Started {
        mode: TimerMode,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    Paused {
        mode: TimerMode,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    Restarted {
        mode: TimerMode,
        expiry: DateTime<Utc>,
        running: bool,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    Expired {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
}

/// Result of one clock tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerTick {
    /// The timer was running, so this second counts as tracked time.
    pub counted: bool,
    pub event: Option<TimerEvent>,
}

#[derive(Debug, Clone)]
pub struct SessionTimer {
    settings: TimerSettings,
    mode: TimerMode,
    expiry: DateTime<Utc>,
    running: bool,
    /// Frozen remaining time while paused.
    remaining: Duration,
    /// Running seconds observed since the session began.
    elapsed_secs: u64,
}

impl SessionTimer {
    /// New timer in operating mode, paused, with a full interval ahead.
    pub fn new(settings: TimerSettings, now: DateTime<Utc>) -> Self {
        let remaining = settings.duration(TimerMode::Operating);
        Self {
            settings,
            mode: TimerMode::Operating,
            expiry: now + remaining,
            running: false,
            remaining,
            elapsed_secs: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    pub fn settings(&self) -> TimerSettings {
        self.settings
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        if self.running {
            (self.expiry - now).max(Duration::zero())
        } else {
            self.remaining
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now: DateTime<Utc>) -> Option<TimerEvent> {
        if self.running {
            return None;
        }
        self.expiry = now + self.remaining;
        self.running = true;
        Some(TimerEvent::Started {
            mode: self.mode,
            remaining_secs: self.remaining.num_seconds(),
            at: now,
        })
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        self.remaining = (self.expiry - now).max(Duration::zero());
        self.running = false;
        Some(TimerEvent::Paused {
            mode: self.mode,
            remaining_secs: self.remaining.num_seconds(),
            at: now,
        })
    }

    /// Point the timer at a new expiry. Without `auto_start` it stays paused.
    pub fn restart(&mut self, expiry: DateTime<Utc>, auto_start: bool, now: DateTime<Utc>) -> TimerEvent {
        self.expiry = expiry;
        self.remaining = (expiry - now).max(Duration::zero());
        self.running = auto_start;
        TimerEvent::Restarted {
            mode: self.mode,
            expiry,
            running: auto_start,
            at: now,
        }
    }

    /// Full interval of the current mode, paused.
    pub fn reset(&mut self, now: DateTime<Utc>) -> TimerEvent {
        let expiry = now + self.settings.duration(self.mode);
        self.restart(expiry, false, now)
    }

    /// Toggle operating/rest and restart against the new mode's duration, paused.
    pub fn switch_mode(&mut self, now: DateTime<Utc>) -> TimerEvent {
        self.mode = self.mode.toggled();
        self.reset(now);
        TimerEvent::ModeSwitched { mode: self.mode, at: now }
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> TimerTick {
        if !self.running {
            return TimerTick { counted: false, event: None };
        }
        self.elapsed_secs += 1;
        if now < self.expiry {
            return TimerTick { counted: true, event: None };
        }
        let mode = self.mode;
        self.reset(now);
        TimerTick {
            counted: true,
            event: Some(TimerEvent::Expired { mode, at: now }),
        }
    }
}
