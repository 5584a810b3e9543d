use crate::model::metrics::percent;
use chrono::{DateTime, Utc};

/// Calls logged since the bot started (or since the last reset). Never stored.
#[derive(Debug, Clone)]
pub struct Session {
    started: DateTime<Utc>,
    calls: u32,
    goal: u32,
}

impl Session {
    pub fn new(now: DateTime<Utc>, goal: u32) -> Session {
        Session {
            started: now,
            calls: 0,
            goal,
        }
    }

    pub fn record_call(&mut self) {
        self.calls += 1;
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.started = now;
        self.calls = 0;
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }

    pub fn goal(&self) -> u32 {
        self.goal
    }

    /// Calls per hour; zero during the first minute.
    pub fn pace(&self, now: DateTime<Utc>) -> u32 {
        let minutes = (now - self.started).num_milliseconds() as f64 / 60_000.0;
        if minutes <= 1.0 {
            return 0;
        }
        (self.calls as f64 / minutes * 60.0).round() as u32
    }

    pub fn progress(&self) -> u32 {
        percent(self.calls as usize, self.goal as usize).min(100)
    }
}
