use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive date window; an open end is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    /// `start=` / `end=` query pairs for the bounded sides.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = self.start {
            pairs.push(("start", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end {
            pairs.push(("end", end.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WordFilter {
    Day,
    /// The last 7 days, today included.
    Week,
    /// The last 30 days, today included.
    Month,
    Custom,
    #[default]
    All,
}

impl WordFilter {
    /// A custom filter needs both bounds; with either missing it matches everything.
    pub fn range(self, today: NaiveDate, custom: Option<(NaiveDate, NaiveDate)>) -> DateRange {
        match self {
            WordFilter::Day => DateRange::between(today, today),
            WordFilter::Week => DateRange::between(today - Duration::days(6), today),
            WordFilter::Month => DateRange::between(today - Duration::days(29), today),
            WordFilter::Custom => match custom {
                Some((start, end)) => DateRange::between(start, end),
                None => DateRange::all(),
            },
            WordFilter::All => DateRange::all(),
        }
    }
}
