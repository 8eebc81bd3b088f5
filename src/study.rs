//! Logged study time: session records, the stopwatch behind them and summaries.

use chrono::{Duration as Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use crate::clock::{minutes_for, PausableClock};
use crate::error::{Error, Result};

pub const MAX_SESSION_MINUTES: u32 = 1440;

/// One logged sitting. On the wire the minutes travel as `duration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    pub date: NaiveDate,
    #[serde(rename = "duration", alias = "duration_minutes")]
    pub duration_minutes: u32,
}

impl StudySession {
    pub fn new(date: NaiveDate, duration_minutes: u32) -> Result<Self> {
        if duration_minutes == 0 || duration_minutes > MAX_SESSION_MINUTES {
            return Err(Error::InvalidInput(format!(
                "duration must be between 1 and {MAX_SESSION_MINUTES} minutes, got {duration_minutes}"
            )));
        }
        Ok(Self {
            date,
            duration_minutes,
        })
    }
}

/// Where a session was logged: plain study or word review.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionKind {
    #[default]
    Study,
    Review,
}

/// Stopwatch for a free-form study sitting.
#[derive(Debug, Clone, Default)]
pub struct StudyTimer {
    clock: PausableClock,
    logged_minutes: Option<u32>,
}

impl StudyTimer {
    pub fn start() -> Self {
        Self {
            clock: PausableClock::started(),
            logged_minutes: None,
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.logged_minutes.is_some() {
            return;
        }
        if self.clock.is_paused() {
            self.clock.resume();
        } else {
            self.clock.pause();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn is_ended(&self) -> bool {
        self.logged_minutes.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Stop and return the minutes to log, capped at a full day.
    pub fn end(&mut self) -> u32 {
        *self.logged_minutes.get_or_insert_with(|| {
            self.clock.stop();
            minutes_for(self.clock.elapsed()).min(MAX_SESSION_MINUTES)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub minutes: u32,
}

/// Minutes per day for the `n` days ending today, newest first. Days without
/// sessions are listed with zero.
pub fn aggregate_last_n_days(sessions: &[StudySession], n: usize, today: NaiveDate) -> Vec<DayTotal> {
    let mut by_date: HashMap<NaiveDate, u32> = HashMap::new();
    for s in sessions {
        *by_date.entry(s.date).or_default() += s.duration_minutes;
    }
    (0..n)
        .map(|i| {
            let date = today - Days::days(i as i64);
            DayTotal {
                date,
                minutes: by_date.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

pub fn total_minutes(sessions: &[StudySession]) -> u64 {
    sessions.iter().map(|s| u64::from(s.duration_minutes)).sum()
}

/// Write `date,duration_minutes` rows with a header.
pub fn export_csv<W: Write>(sessions: &[StudySession], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["date", "duration_minutes"])?;
    for s in sessions {
        wtr.write_record([s.date.format("%Y-%m-%d").to_string(), s.duration_minutes.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
