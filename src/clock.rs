use std::time::{Duration, Instant};

/// Wall clock that leaves paused stretches out of the elapsed time.
///
/// Every operation has an `_at` form taking the current instant so sessions
/// can be driven deterministically in tests.
#[derive(Debug, Clone, Default)]
pub struct PausableClock {
    started_at: Option<Instant>,
    paused_at: Option<Instant>,
    stopped_at: Option<Instant>,
    paused_total: Duration,
}

impl PausableClock {
    pub fn started() -> Self {
        let mut clock = Self::default();
        clock.start();
        clock
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now())
    }

    pub fn pause(&mut self) {
        self.pause_at(Instant::now())
    }

    pub fn resume(&mut self) {
        self.resume_at(Instant::now())
    }

    pub fn stop(&mut self) {
        self.stop_at(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn start_at(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn pause_at(&mut self, now: Instant) {
        if self.is_running() {
            self.paused_at = Some(now);
        }
    }

    pub fn resume_at(&mut self, now: Instant) {
        if self.stopped_at.is_some() {
            return;
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += now.saturating_duration_since(paused_at);
        }
    }

    /// Freeze the clock. Stopping while paused keeps the pause excluded.
    pub fn stop_at(&mut self, now: Instant) {
        if self.started_at.is_none() || self.stopped_at.is_some() {
            return;
        }
        self.stopped_at = Some(self.paused_at.take().unwrap_or(now));
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let end = self.stopped_at.or(self.paused_at).unwrap_or(now);
        end.saturating_duration_since(started_at)
            .saturating_sub(self.paused_total)
    }

    pub fn paused_total(&self) -> Duration {
        self.paused_total
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped_at.is_some()
    }

    fn is_running(&self) -> bool {
        self.started_at.is_some() && self.paused_at.is_none() && self.stopped_at.is_none()
    }
}

/// Minutes to log for a session: rounded, never less than one.
pub fn minutes_for(elapsed: Duration) -> u32 {
    let minutes = (elapsed.as_millis() as f64 / 60_000.0).round() as u32;
    minutes.max(1)
}

/// `h:mm:ss` once past the hour, `m:ss` below it.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
