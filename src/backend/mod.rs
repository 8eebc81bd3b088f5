//! Persistence collaborators. Everything the timer and review screens save or
//! load goes through these traits, backed either by a local SQLite file or by
//! the study-tracker HTTP API.

pub mod dictionary;
pub mod http;
pub mod sqlite;
pub mod worker;

pub use dictionary::{Definition, Dictionary, FreeDictionary};
pub use http::HttpStore;
pub use sqlite::SqliteStore;
pub use worker::{BackgroundWorker, Job, Notice};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::review::{Counts, DateRange, Outcome, Word};
use crate::schedule::ScheduleLibrary;
use crate::study::{SessionKind, StudySession};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub name: String,
}

/// Response of the liveness probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub ok: bool,
    #[serde(default)]
    pub time: String,
}

pub trait SessionLog {
    fn log_session(&self, kind: SessionKind, session: &StudySession) -> Result<()>;
    /// Newest first.
    fn list_sessions(&self, kind: SessionKind) -> Result<Vec<StudySession>>;
}

pub trait WordStore {
    /// Words added inside `range`, newest first.
    fn list_words(&self, range: DateRange) -> Result<Vec<Word>>;
    fn add_word(&self, word: &str, examples: &[String]) -> Result<Word>;
    fn record_outcome(&self, word_id: i64, outcome: Outcome) -> Result<Counts>;
}

pub trait TopicStore {
    fn list_topics(&self) -> Result<Vec<Topic>>;
    fn add_topic(&self, name: &str) -> Result<Topic>;
}

/// Everything a backend provides.
pub trait Store: SessionLog + WordStore + TopicStore + ScheduleLibrary {
    fn health(&self) -> Result<Health>;
    /// Human-readable location, e.g. the database path or base URL.
    fn describe(&self) -> String;
}

/// The HTTP API when one is configured, the local database otherwise.
pub fn open_store(config: &Config) -> Result<Box<dyn Store + Send>> {
    match config.api_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Ok(Box::new(HttpStore::new(url)?)),
        _ => Ok(Box::new(SqliteStore::open_default()?)),
    }
}

pub(crate) fn validate_word(word: &str, examples: &[String]) -> Result<(String, Vec<String>)> {
    let word = word.trim();
    let examples: Vec<String> = examples
        .iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect();
    if word.is_empty() || examples.is_empty() {
        return Err(Error::InvalidInput(
            "a word needs text and at least one example".to_string(),
        ));
    }
    Ok((word.to_string(), examples))
}

pub(crate) fn validate_topic(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("topic name is empty".to_string()));
    }
    Ok(name.to_string())
}
