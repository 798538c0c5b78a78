//! One-second tick source.

use std::thread;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Local calendar day of `now`.
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&Local).date_naive()
    }

    /// Block until the next one-second tick is due.
    fn wait_tick(&mut self);
}

/// Wall clock that schedules ticks against a monotonic deadline so sleeps do not drift.
pub struct SystemClock {
    next_tick: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            next_tick: Instant::now() + StdDuration::from_secs(1),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn wait_tick(&mut self) {
        let now = Instant::now();
        if self.next_tick > now {
            thread::sleep(self.next_tick - now);
            self.next_tick += StdDuration::from_secs(1);
        } else {
            // fell behind (suspend, slow flush); resync instead of bursting
            self.next_tick = now + StdDuration::from_secs(1);
        }
    }
}

/// Clock that only moves when told to. Each tick advances it by one second.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: DateTime<Utc>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn wait_tick(&mut self) {
        self.now += Duration::seconds(1);
    }
}
