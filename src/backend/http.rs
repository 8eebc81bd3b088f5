use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{validate_topic, validate_word, Health, SessionLog, Store, Topic, TopicStore, WordStore};
use crate::error::{Error, Result};
use crate::review::{Counts, DateRange, Outcome, Word};
use crate::schedule::store::saved_name;
use crate::schedule::{Schedule, ScheduleLibrary, StoredSchedule};
use crate::study::{SessionKind, StudySession};

const TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the study-tracker REST API.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct NewWord<'a> {
    word: &'a str,
    examples: &'a [String],
}

#[derive(Serialize)]
struct OutcomeBody {
    outcome: Outcome,
}

#[derive(Serialize)]
struct NamedBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct ScheduleBody<'a> {
    name: &'a str,
    schedule: &'a Schedule,
}

#[derive(Deserialize)]
struct WordCounts {
    yes_count: u32,
    #[serde(default)]
    no_count: Option<u32>,
}

impl HttpStore {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .user_agent(concat!("engtrack/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        log::warn!("backend responded {status}: {body}");
        Err(Error::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(self.send(self.client.get(self.url(path)))?.json()?)
    }

    fn session_path(kind: SessionKind) -> &'static str {
        match kind {
            SessionKind::Study => "/sessions",
            SessionKind::Review => "/review_sessions",
        }
    }
}

impl SessionLog for HttpStore {
    fn log_session(&self, kind: SessionKind, session: &StudySession) -> Result<()> {
        let session = StudySession::new(session.date, session.duration_minutes)?;
        self.send(
            self.client
                .post(self.url(Self::session_path(kind)))
                .json(&session),
        )?;
        log::info!("logged {kind} session to {}", self.base_url);
        Ok(())
    }

    fn list_sessions(&self, kind: SessionKind) -> Result<Vec<StudySession>> {
        self.get_json(Self::session_path(kind))
    }
}

impl WordStore for HttpStore {
    fn list_words(&self, range: DateRange) -> Result<Vec<Word>> {
        let request = self
            .client
            .get(self.url("/words"))
            .query(&range.query_pairs());
        Ok(self.send(request)?.json()?)
    }

    fn add_word(&self, word: &str, examples: &[String]) -> Result<Word> {
        let (word, examples) = validate_word(word, examples)?;
        let body = NewWord {
            word: &word,
            examples: &examples,
        };
        Ok(self
            .send(self.client.post(self.url("/words")).json(&body))?
            .json()?)
    }

    fn record_outcome(&self, word_id: i64, outcome: Outcome) -> Result<Counts> {
        let request = self
            .client
            .post(self.url(&format!("/words/{word_id}/review")))
            .json(&OutcomeBody { outcome });
        let counts: WordCounts = self.send(request)?.json()?;
        Ok(Counts {
            yes_count: counts.yes_count,
            no_count: counts.no_count.unwrap_or(0),
        })
    }
}

impl TopicStore for HttpStore {
    fn list_topics(&self) -> Result<Vec<Topic>> {
        self.get_json("/topics")
    }

    fn add_topic(&self, name: &str) -> Result<Topic> {
        let name = validate_topic(name)?;
        Ok(self
            .send(
                self.client
                    .post(self.url("/topics"))
                    .json(&NamedBody { name: &name }),
            )?
            .json()?)
    }
}

impl ScheduleLibrary for HttpStore {
    fn list_schedules(&self) -> Result<Vec<StoredSchedule>> {
        self.get_json("/schedules")
    }

    /// Updates the server record holding this schedule if there is one, creates one otherwise.
    fn save_schedule(&self, schedule: &Schedule) -> Result<StoredSchedule> {
        let name = saved_name(schedule);
        let body = ScheduleBody {
            name: &name,
            schedule,
        };
        let existing = if schedule.id.is_empty() {
            None
        } else {
            self.list_schedules()?
                .into_iter()
                .find(|s| s.id == schedule.id || s.schedule.id == schedule.id)
        };
        let request = match existing {
            Some(record) => self
                .client
                .put(self.url(&format!("/schedules/{}", record.id))),
            None => self.client.post(self.url("/schedules")),
        };
        Ok(self.send(request.json(&body))?.json()?)
    }

    fn delete_schedule(&self, id: &str) -> Result<()> {
        self.send(self.client.delete(self.url(&format!("/schedules/{id}"))))?;
        Ok(())
    }
}

impl Store for HttpStore {
    fn health(&self) -> Result<Health> {
        self.get_json("/healthz")
    }

    fn describe(&self) -> String {
        format!("api {}", self.base_url)
    }
}
