//! Vocabulary review: word records, presentation order, quiz prompts and the
//! per-sitting session state.

pub mod filter;
pub mod mask;
pub mod order;
pub mod session;

pub use filter::{DateRange, WordFilter};
pub use mask::{choose_prompt, mask_sentence, word_forms, Prompt};
pub use order::{shuffle_order, weighted_order, ReviewMode};
pub use session::{PendingOutcome, ReviewSession};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub word: String,
    #[serde(default)]
    pub examples: Vec<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub yes_count: u32,
    /// Absent on words that were never reviewed.
    #[serde(default)]
    pub no_count: Option<u32>,
}

impl Word {
    /// Share of "yes" answers. A word without a recorded `no_count` counts one miss.
    pub fn familiarity(&self) -> f64 {
        let yes = f64::from(self.yes_count);
        let no = f64::from(self.no_count.unwrap_or(1));
        let total = yes + no;
        if total <= 0.0 {
            0.0
        } else {
            yes / total
        }
    }

    pub fn weight(&self) -> f64 {
        (1.0 - self.familiarity()).max(0.0)
    }

    pub fn apply_counts(&mut self, counts: Counts) {
        self.yes_count = counts.yes_count;
        self.no_count = Some(counts.no_count);
    }

    pub fn is_single_token(&self) -> bool {
        self.word.split_whitespace().count() == 1
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
    Yes,
    No,
}

/// Updated counters returned after recording an outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub yes_count: u32,
    pub no_count: u32,
}

impl Counts {
    pub fn record(self, outcome: Outcome) -> Self {
        match outcome {
            Outcome::Yes => Self {
                yes_count: self.yes_count + 1,
                ..self
            },
            Outcome::No => Self {
                no_count: self.no_count + 1,
                ..self
            },
        }
    }
}

/// Split a multi-line text box into trimmed, non-empty example sentences.
pub fn parse_examples(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub(crate) fn word(id: i64, text: &str, yes: u32, no: Option<u32>) -> Word {
    Word {
        id,
        word: text.to_string(),
        examples: vec![],
        date: NaiveDate::from_ymd_opt(2025, 9, 2).unwrap(),
        yes_count: yes,
        no_count: no,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn familiarity_defaults_missing_no_count_to_one() {
        assert_eq!(word(1, "a", 0, None).familiarity(), 0.0);
        assert_eq!(word(1, "a", 1, None).familiarity(), 0.5);
        assert_eq!(word(1, "a", 3, Some(1)).familiarity(), 0.75);
    }

    #[test]
    fn familiarity_guards_zero_total() {
        let w = word(1, "a", 0, Some(0));
        assert_eq!(w.familiarity(), 0.0);
        assert_eq!(w.weight(), 1.0);
    }

    #[test]
    fn fully_known_word_has_zero_weight() {
        assert_eq!(word(1, "a", 4, Some(0)).weight(), 0.0);
    }

    #[test]
    fn word_json_shape() {
        let w: Word = serde_json::from_str(
            r#"{"id": 7, "word": "study", "examples": ["I study."], "date": "2025-09-01", "yes_count": 2}"#,
        )
        .unwrap();
        assert_eq!(w.no_count, None);
        assert_eq!(w.yes_count, 2);
        assert!(w.is_single_token());
    }

    #[test]
    fn counts_record_outcomes() {
        let c = Counts::default().record(Outcome::Yes).record(Outcome::No).record(Outcome::Yes);
        assert_eq!(c, Counts { yes_count: 2, no_count: 1 });
        assert_eq!(Outcome::No.to_string(), "no");
    }

    #[test]
    fn examples_are_split_per_line() {
        assert_eq!(
            parse_examples("  first one \n\n second\n   "),
            vec!["first one".to_string(), "second".to_string()]
        );
    }
}
