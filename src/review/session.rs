use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use super::{choose_prompt, Counts, Outcome, Prompt, ReviewMode, Word};
use crate::clock::{minutes_for, PausableClock};

/// An outcome the caller still has to hand to the word store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOutcome {
    pub word_id: i64,
    pub outcome: Outcome,
}

/// One review sitting over a fixed word list.
///
/// The order is decided once when the sitting starts; recorded outcomes do not
/// re-weight it. Store writes happen outside, so a failed write never undoes
/// local progress.
pub struct ReviewSession {
    words: Vec<Word>,
    mode: ReviewMode,
    order: Vec<usize>,
    position: usize,
    exhausted: bool,
    show_hint: bool,
    prompt: Option<Prompt>,
    reviewed: usize,
    clock: PausableClock,
    logged_minutes: Option<u32>,
    rng: StdRng,
}

impl ReviewSession {
    pub fn new(words: Vec<Word>, mode: ReviewMode) -> Self {
        Self::with_rng(words, mode, StdRng::from_entropy())
    }

    pub fn with_rng(words: Vec<Word>, mode: ReviewMode, mut rng: StdRng) -> Self {
        let order = mode.order(&words, &mut rng);
        let mut session = Self {
            words,
            mode,
            order,
            position: 0,
            exhausted: false,
            show_hint: false,
            prompt: None,
            reviewed: 0,
            clock: PausableClock::started(),
            logged_minutes: None,
            rng,
        };
        session.exhausted = session.order.is_empty();
        session.refresh_prompt();
        log::info!(
            "review started: {} words, {} order",
            session.words.len(),
            session.mode
        );
        session
    }

    pub fn mode(&self) -> ReviewMode {
        self.mode
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn current(&self) -> Option<&Word> {
        if self.exhausted {
            return None;
        }
        self.order.get(self.position).and_then(|&i| self.words.get(i))
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    /// Position within the order and its length, for "3 / 20" style display.
    pub fn progress(&self) -> (usize, usize) {
        (self.position.min(self.order.len()), self.order.len())
    }

    pub fn reviewed(&self) -> usize {
        self.reviewed
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn is_ended(&self) -> bool {
        self.logged_minutes.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    fn accepts_input(&self) -> bool {
        !self.is_ended() && !self.is_paused() && !self.exhausted
    }

    pub fn hint_visible(&self) -> bool {
        self.show_hint
    }

    pub fn show_hint(&mut self) {
        if self.accepts_input() {
            self.show_hint = true;
        }
    }

    pub fn toggle_hint(&mut self) {
        if self.accepts_input() {
            self.show_hint = !self.show_hint;
        }
    }

    /// Record an answer for the current word and move on. Returns what the
    /// store should be told, or `None` when there is no current word.
    pub fn submit(&mut self, outcome: Outcome) -> Option<PendingOutcome> {
        if !self.accepts_input() {
            return None;
        }
        let word_id = self.current()?.id;
        self.reviewed += 1;
        self.advance();
        Some(PendingOutcome { word_id, outcome })
    }

    /// Move on without an answer.
    pub fn skip(&mut self) {
        if self.accepts_input() {
            self.advance();
        }
    }

    /// Adopt the counters the store reports back for a word.
    pub fn apply_counts(&mut self, word_id: i64, counts: Counts) {
        if let Some(word) = self.words.iter_mut().find(|w| w.id == word_id) {
            word.apply_counts(counts);
        }
    }

    fn advance(&mut self) {
        self.show_hint = false;
        self.position += 1;
        if self.position >= self.order.len() {
            if self.mode.wraps() {
                self.position = 0;
            } else {
                self.exhausted = true;
                log::info!("review exhausted after {} words", self.order.len());
            }
        }
        self.refresh_prompt();
    }

    fn refresh_prompt(&mut self) {
        self.prompt = match self.current().cloned() {
            Some(word) => Some(choose_prompt(&word, &mut self.rng)),
            None => None,
        };
    }

    pub fn toggle_pause(&mut self) {
        if self.is_ended() {
            return;
        }
        if self.clock.is_paused() {
            self.clock.resume();
        } else {
            self.clock.pause();
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Stop the clock and return the minutes to log. Later calls return the same value.
    pub fn end(&mut self) -> u32 {
        if let Some(minutes) = self.logged_minutes {
            return minutes;
        }
        self.clock.stop();
        let minutes = minutes_for(self.clock.elapsed());
        self.logged_minutes = Some(minutes);
        log::info!("review ended: {} reviewed, {} min", self.reviewed, minutes);
        minutes
    }
}
