//! Interval timer that walks a flattened schedule one second at a time.

pub mod announcer;

pub use announcer::{Announcer, Cue, CueSettings, RecordingAnnouncer, SilentAnnouncer, SpeechAnnouncer};

use std::collections::HashSet;
use std::time::Duration;

use crate::clock::PausableClock;
use crate::schedule::{flatten_schedule, total_seconds, Phase, PhaseKind, Schedule};

pub const FINISHED_MESSAGE: &str = "Congrats, you finished all exercises";
pub const HALFWAY_MESSAGE: &str = "Half time passed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Finished,
    Ended,
}

/// Runtime state of one pass through a schedule.
///
/// The session owns its announcer and its cue trackers; dropping the session
/// (or calling [`TimerSession::end`]) discards all of it.
pub struct TimerSession<A: Announcer> {
    schedule: Schedule,
    phases: Vec<Phase>,
    total: u64,
    index: usize,
    remaining: u32,
    completed: u64,
    state: TimerState,
    cues: CueSettings,
    announcer: A,
    countdown_spoken: HashSet<u32>,
    halfway_announced: bool,
    clock: PausableClock,
}

impl<A: Announcer> TimerSession<A> {
    pub fn new(schedule: Schedule, announcer: A, cues: CueSettings) -> Self {
        let phases = flatten_schedule(&schedule);
        let total = total_seconds(&phases);
        let remaining = phases.first().map(|p| p.duration_seconds).unwrap_or(0);
        Self {
            schedule,
            phases,
            total,
            index: 0,
            remaining,
            completed: 0,
            state: TimerState::Idle,
            cues,
            announcer,
            countdown_spoken: HashSet::new(),
            halfway_announced: false,
            clock: PausableClock::default(),
        }
    }

    pub fn start(&mut self) {
        if self.state != TimerState::Idle {
            return;
        }
        self.clock.start();
        if self.phases.is_empty() {
            log::info!("schedule {:?} has no timed phases", self.schedule.display_name());
            self.state = TimerState::Finished;
            self.clock.stop();
            return;
        }
        self.state = TimerState::Running;
        log::info!(
            "timer started: {} phases, {}s total",
            self.phases.len(),
            self.total
        );
        self.enter_phase();
    }

    /// One second of progress. Returns whether anything changed.
    pub fn tick(&mut self) -> bool {
        if self.state != TimerState::Running || self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.advance();
        } else {
            self.countdown_cue();
            self.halfway_cue();
        }
        true
    }

    pub fn toggle_pause(&mut self) -> TimerState {
        match self.state {
            TimerState::Running => {
                self.state = TimerState::Paused;
                self.clock.pause();
            }
            TimerState::Paused => {
                self.state = TimerState::Running;
                self.clock.resume();
            }
            _ => {}
        }
        self.state
    }

    /// Stop for good, silencing anything still queued.
    pub fn end(&mut self) {
        if self.state == TimerState::Ended {
            return;
        }
        self.state = TimerState::Ended;
        self.clock.stop();
        self.announcer.cancel();
        self.countdown_spoken.clear();
        self.halfway_announced = false;
        log::info!("timer ended at {}s of {}s", self.elapsed_seconds(), self.total);
    }

    fn advance(&mut self) {
        self.completed += u64::from(self.phases[self.index].duration_seconds);
        self.index += 1;
        self.countdown_spoken.clear();
        self.ring();

        if self.index >= self.phases.len() {
            self.state = TimerState::Finished;
            self.remaining = 0;
            self.clock.stop();
            self.say(FINISHED_MESSAGE);
            log::info!("timer finished: {}s", self.total);
            return;
        }
        self.enter_phase();
    }

    fn enter_phase(&mut self) {
        let current = self.phases[self.index].clone();
        self.remaining = current.duration_seconds;
        log::debug!("phase {}: {} ({}s)", self.index, current.label, current.duration_seconds);

        let previous = self
            .index
            .checked_sub(1)
            .and_then(|i| self.phases.get(i))
            .cloned();

        match current.kind {
            PhaseKind::Break => {
                if let Some(prev) = previous.filter(|p| p.is_hold()) {
                    self.say("Rest");
                    self.exercise_done_cue(&prev);
                }
            }
            PhaseKind::Hold => self.hold_cues(&current, previous.as_ref()),
        }

        self.countdown_cue();
        self.halfway_cue();
    }

    fn exercise_done_cue(&mut self, finished_hold: &Phase) {
        let Some(ex_idx) = finished_hold.meta.exercise_index else {
            return;
        };
        let next_hold_exercise = self.phases[self.index + 1..]
            .iter()
            .find(|p| p.is_hold())
            .map(|p| p.meta.exercise_index);
        let moving_on = match next_hold_exercise {
            None => true,
            Some(next) => next != Some(ex_idx),
        };
        if moving_on {
            if let Some(name) = self.exercise_name(ex_idx) {
                self.say(&format!("{name} is done"));
            }
        }
    }

    fn hold_cues(&mut self, current: &Phase, previous: Option<&Phase>) {
        let meta = current.meta;
        if let Some(ex_idx) = meta.exercise_index {
            if previous.and_then(|p| p.meta.exercise_index) != Some(ex_idx) {
                if let Some(name) = self.exercise_name(ex_idx) {
                    self.say(&name);
                }
            }
        }

        let position = meta.exercise_index.zip(meta.set_index).and_then(|(ex_idx, set_idx)| {
            self.schedule
                .exercises
                .get(ex_idx)
                .map(|ex| (ex.set_count(), ex.reps_in_set(set_idx) as usize, set_idx))
        });

        if let (Some((set_count, _, set_idx)), Some(0)) = (position, meta.rep_index) {
            let sets_left = set_count.saturating_sub(set_idx);
            if sets_left > 0 {
                self.say(&plural(sets_left, "set"));
            }
        }

        self.say("Start");

        if let (Some((_, reps, _)), Some(rep_idx)) = (position, meta.rep_index) {
            let reps_left = reps.saturating_sub(rep_idx);
            if reps_left > 0 {
                self.say(&plural(reps_left, "rep"));
            }
        }
    }

    fn countdown_cue(&mut self) {
        if (1..=3).contains(&self.remaining) && self.countdown_spoken.insert(self.remaining) {
            self.say(&self.remaining.to_string());
        }
    }

    fn halfway_cue(&mut self) {
        if self.halfway_announced || self.total == 0 {
            return;
        }
        if self.elapsed_seconds() * 2 >= self.total {
            self.halfway_announced = true;
            self.say(HALFWAY_MESSAGE);
        }
    }

    fn exercise_name(&self, ex_idx: usize) -> Option<String> {
        self.schedule
            .exercises
            .get(ex_idx)
            .map(|ex| ex.name.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    fn say(&mut self, text: &str) {
        if self.cues.voice {
            self.announcer.announce(text);
        }
    }

    fn ring(&mut self) {
        if self.cues.chime {
            self.announcer.chime();
        }
    }

    pub fn set_voice(&mut self, on: bool) {
        self.cues.voice = on;
        if !on {
            self.announcer.cancel();
        }
    }

    pub fn set_chime(&mut self, on: bool) {
        self.cues.chime = on;
    }

    pub fn cues(&self) -> CueSettings {
        self.cues
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, TimerState::Finished | TimerState::Ended)
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_phase(&self) -> Option<&Phase> {
        self.phases.get(self.index)
    }

    pub fn next_phase(&self) -> Option<&Phase> {
        self.phases.get(self.index + 1)
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining
    }

    pub fn total_seconds(&self) -> u64 {
        self.total
    }

    /// Schedule time consumed so far: finished phases plus the current one's progress.
    pub fn elapsed_seconds(&self) -> u64 {
        match self.phases.get(self.index) {
            Some(phase) => self.completed + u64::from(phase.duration_seconds - self.remaining),
            None => self.completed,
        }
    }

    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.elapsed_seconds() as f64 / self.total as f64).clamp(0.0, 1.0)
    }

    /// Wall-clock time since start with pauses left out.
    pub fn wall_elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn announcer(&self) -> &A {
        &self.announcer
    }

    pub fn announcer_mut(&mut self) -> &mut A {
        &mut self.announcer
    }
}

fn plural(n: usize, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} left")
    } else {
        format!("{n} {unit}s left")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Exercise, SetPlan, SetSpec};
    use crate::timer::announcer::Cue;
    use assert_matches::assert_matches;

    fn exercise(name: &str, sets: &[(u32, u32, u32)], set_break: u32) -> Exercise {
        Exercise {
            id: String::new(),
            name: name.into(),
            break_between_sets_seconds: set_break,
            break_after_exercise_seconds: None,
            plan: SetPlan::Explicit(
                sets.iter()
                    .map(|&(reps, hold, rep_break)| SetSpec {
                        id: String::new(),
                        reps,
                        hold_seconds: hold,
                        break_between_reps_seconds: rep_break,
                    })
                    .collect(),
            ),
        }
    }

    fn schedule(exercises: Vec<Exercise>, ex_break: u32) -> Schedule {
        Schedule {
            id: "t".into(),
            name: "Test".into(),
            break_between_exercises_seconds: ex_break,
            exercises,
        }
    }

    fn session(s: Schedule) -> TimerSession<RecordingAnnouncer> {
        TimerSession::new(s, RecordingAnnouncer::default(), CueSettings::default())
    }

    #[test]
    fn single_hold_finishes_after_its_duration() {
        let mut t = session(schedule(vec![exercise("A", &[(1, 5, 0)], 0)], 0));
        t.start();
        for _ in 0..5 {
            assert!(t.tick());
        }

        assert_matches!(t.state(), TimerState::Finished);
        assert_eq!(t.elapsed_seconds(), 5);
        assert_eq!(t.remaining_seconds(), 0);
        assert_eq!(t.progress(), 1.0);
        assert!(!t.tick());
        assert_eq!(t.announcer().spoken().last(), Some(&FINISHED_MESSAGE));
    }

    #[test]
    fn empty_schedule_finishes_on_start() {
        let mut t = session(schedule(vec![], 30));
        t.start();
        assert_matches!(t.state(), TimerState::Finished);
        assert_eq!(t.progress(), 0.0);
        assert!(t.announcer().cues.is_empty());
    }

    #[test]
    fn ticks_while_paused_do_nothing() {
        let mut t = session(schedule(vec![exercise("A", &[(1, 10, 0)], 0)], 0));
        t.start();
        t.tick();
        assert_eq!(t.toggle_pause(), TimerState::Paused);
        for _ in 0..20 {
            assert!(!t.tick());
        }
        assert_eq!(t.remaining_seconds(), 9);
        assert_eq!(t.toggle_pause(), TimerState::Running);
        t.tick();
        assert_eq!(t.remaining_seconds(), 8);
    }

    #[test]
    fn idle_and_finished_ignore_pause() {
        let mut t = session(schedule(vec![exercise("A", &[(1, 1, 0)], 0)], 0));
        assert_eq!(t.toggle_pause(), TimerState::Idle);
        assert!(!t.tick());
        t.start();
        t.tick();
        assert_eq!(t.toggle_pause(), TimerState::Finished);
    }

    #[test]
    fn entry_cues_for_holds_and_breaks() {
        // A: 2 reps x 10 s with a 3 s rest, then B: one 4 s hold after a 5 s exercise break
        let s = schedule(
            vec![exercise("A", &[(2, 10, 3)], 0), exercise("B", &[(1, 4, 0)], 0)],
            5,
        );
        let mut t = session(s);
        t.start();
        assert_eq!(t.announcer().spoken(), vec!["A", "1 set left", "Start", "2 reps left"]);

        t.announcer_mut().clear();
        for _ in 0..10 {
            t.tick();
        }
        // countdown of the first hold, then the rep break entry which is itself a 3 s phase
        assert_eq!(t.announcer().spoken(), vec!["3", "2", "1", "Rest", "3"]);
        assert_eq!(t.announcer().chimes(), 1);

        t.announcer_mut().clear();
        for _ in 0..3 {
            t.tick();
        }
        assert_eq!(t.announcer().spoken(), vec!["2", "1", "Start", "1 rep left"]);

        t.announcer_mut().clear();
        for _ in 0..10 {
            t.tick();
        }
        // halfway lands at 16 of 32 seconds
        let spoken = t.announcer().spoken();
        assert!(spoken.contains(&HALFWAY_MESSAGE));
        assert_eq!(&spoken[spoken.len() - 2..], ["Rest", "A is done"]);

        t.announcer_mut().clear();
        for _ in 0..5 {
            t.tick();
        }
        assert_eq!(&t.announcer().spoken()[3..], ["B", "1 set left", "Start", "1 rep left"]);
    }

    #[test]
    fn rest_between_sets_does_not_finish_exercise() {
        let s = schedule(vec![exercise("Curl", &[(1, 4, 0), (1, 4, 0)], 5)], 0);
        let mut t = session(s);
        t.start();
        for _ in 0..4 {
            t.tick();
        }
        let spoken = t.announcer().spoken();
        assert_eq!(spoken.last(), Some(&"Rest"));
        assert!(!spoken.iter().any(|s| s.ends_with("is done")));
    }

    #[test]
    fn halfway_is_announced_once() {
        let mut t = session(schedule(vec![exercise("A", &[(2, 10, 0)], 0)], 0));
        t.start();
        while !t.is_done() {
            t.tick();
        }
        let count = t
            .announcer()
            .spoken()
            .iter()
            .filter(|s| **s == HALFWAY_MESSAGE)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn muted_cues_keep_progression() {
        let s = schedule(vec![exercise("A", &[(3, 4, 2)], 0)], 0);
        let mut loud = session(s.clone());
        let mut quiet = TimerSession::new(
            s,
            RecordingAnnouncer::default(),
            CueSettings {
                voice: false,
                chime: false,
            },
        );
        loud.start();
        quiet.start();
        while !loud.is_done() {
            loud.tick();
            quiet.tick();
            assert_eq!(loud.elapsed_seconds(), quiet.elapsed_seconds());
            assert_eq!(loud.current_index(), quiet.current_index());
        }
        assert_matches!(quiet.state(), TimerState::Finished);
        assert!(quiet.announcer().cues.is_empty());
    }

    #[test]
    fn end_cancels_and_stops() {
        let mut t = session(schedule(vec![exercise("A", &[(1, 10, 0)], 0)], 0));
        t.start();
        t.tick();
        t.end();

        assert_matches!(t.state(), TimerState::Ended);
        assert_eq!(t.announcer().cues.last(), Some(&Cue::Cancel));
        assert!(!t.tick());
        assert_eq!(t.elapsed_seconds(), 1);
    }

    #[test]
    fn elapsed_tracks_phase_boundaries() {
        let mut t = session(schedule(vec![exercise("A", &[(2, 10, 3)], 0)], 0));
        t.start();
        assert_eq!(t.total_seconds(), 23);
        for _ in 0..11 {
            t.tick();
        }
        assert_eq!(t.current_index(), 1);
        assert_eq!(t.elapsed_seconds(), 11);
        assert_eq!(t.current_phase().map(|p| p.kind), Some(PhaseKind::Break));
        assert_eq!(t.next_phase().map(|p| p.duration_seconds), Some(10));
    }
}
