use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use super::{validate_topic, validate_word, Health, SessionLog, Store, Topic, TopicStore, WordStore};
use crate::app_dirs::AppDirs;
use crate::error::{Error, Result};
use crate::review::{Counts, DateRange, Outcome, Word};
use crate::schedule::store::saved_name;
use crate::schedule::{create_id, Schedule, ScheduleLibrary, StoredSchedule};
use crate::study::{SessionKind, StudySession};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Local backend: sessions, words, topics and schedules in one SQLite file.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    location: String,
}

impl SqliteStore {
    /// Open the database under `$HOME/.local/state/engtrack`.
    pub fn open_default() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("engtrack.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn, path.display().to_string())
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, ":memory:".to_string())
    }

    fn init(conn: Connection, location: String) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                date TEXT NOT NULL,
                duration INTEGER NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_kind_date ON sessions(kind, date);

            CREATE TABLE IF NOT EXISTS words (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                word TEXT NOT NULL,
                examples TEXT NOT NULL,
                date TEXT NOT NULL,
                yes_count INTEGER NOT NULL DEFAULT 0,
                no_count INTEGER,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_words_date ON words(date);

            CREATE TABLE IF NOT EXISTS topics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS schedules (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;
        log::debug!("opened sqlite store at {location}");
        Ok(Self { conn, location })
    }

    /// Insert a word with an explicit date.
    pub fn insert_word(&self, word: &str, examples: &[String], date: NaiveDate) -> Result<Word> {
        let (word, examples) = validate_word(word, examples)?;
        self.conn.execute(
            "INSERT INTO words (word, examples, date) VALUES (?1, ?2, ?3)",
            params![word, serde_json::to_string(&examples)?, date.format(DATE_FORMAT).to_string()],
        )?;
        Ok(Word {
            id: self.conn.last_insert_rowid(),
            word,
            examples,
            date,
            yes_count: 0,
            no_count: None,
        })
    }
}

fn parse_date(idx: usize, text: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl SessionLog for SqliteStore {
    fn log_session(&self, kind: SessionKind, session: &StudySession) -> Result<()> {
        let session = StudySession::new(session.date, session.duration_minutes)?;
        self.conn.execute(
            "INSERT INTO sessions (kind, date, duration) VALUES (?1, ?2, ?3)",
            params![
                kind.to_string(),
                session.date.format(DATE_FORMAT).to_string(),
                session.duration_minutes
            ],
        )?;
        log::info!("logged {kind} session: {} min on {}", session.duration_minutes, session.date);
        Ok(())
    }

    fn list_sessions(&self, kind: SessionKind) -> Result<Vec<StudySession>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT date, duration
            FROM sessions
            WHERE kind = ?1
            ORDER BY date DESC, id DESC
            "#,
        )?;
        let rows = stmt.query_map([kind.to_string()], |row| {
            let date: String = row.get(0)?;
            Ok(StudySession {
                date: parse_date(0, &date)?,
                duration_minutes: row.get(1)?,
            })
        })?;

        let mut sessions = Vec::new();
        for session in rows {
            sessions.push(session?);
        }
        Ok(sessions)
    }
}

impl WordStore for SqliteStore {
    fn list_words(&self, range: DateRange) -> Result<Vec<Word>> {
        let start = range.start.map(|d| d.format(DATE_FORMAT).to_string());
        let end = range.end.map(|d| d.format(DATE_FORMAT).to_string());
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, word, examples, date, yes_count, no_count
            FROM words
            WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
            ORDER BY date DESC, id DESC
            "#,
        )?;
        let rows = stmt.query_map(params![start, end], |row| {
            let examples: String = row.get(2)?;
            let date: String = row.get(3)?;
            Ok(Word {
                id: row.get(0)?,
                word: row.get(1)?,
                examples: serde_json::from_str(&examples).unwrap_or_default(),
                date: parse_date(3, &date)?,
                yes_count: row.get(4)?,
                no_count: row.get(5)?,
            })
        })?;

        let mut words = Vec::new();
        for word in rows {
            words.push(word?);
        }
        Ok(words)
    }

    fn add_word(&self, word: &str, examples: &[String]) -> Result<Word> {
        self.insert_word(word, examples, Local::now().date_naive())
    }

    fn record_outcome(&self, word_id: i64, outcome: Outcome) -> Result<Counts> {
        let sql = match outcome {
            Outcome::Yes => {
                "UPDATE words SET yes_count = yes_count + 1, no_count = COALESCE(no_count, 0) WHERE id = ?1"
            }
            Outcome::No => "UPDATE words SET no_count = COALESCE(no_count, 0) + 1 WHERE id = ?1",
        };
        if self.conn.execute(sql, [word_id])? == 0 {
            return Err(Error::NotFound(format!("word {word_id}")));
        }
        let counts = self.conn.query_row(
            "SELECT yes_count, COALESCE(no_count, 0) FROM words WHERE id = ?1",
            [word_id],
            |row| {
                Ok(Counts {
                    yes_count: row.get(0)?,
                    no_count: row.get(1)?,
                })
            },
        )?;
        log::debug!("word {word_id}: {outcome} -> {counts:?}");
        Ok(counts)
    }
}

impl TopicStore for SqliteStore {
    fn list_topics(&self) -> Result<Vec<Topic>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM topics ORDER BY id DESC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Topic {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        let mut topics = Vec::new();
        for topic in rows {
            topics.push(topic?);
        }
        Ok(topics)
    }

    fn add_topic(&self, name: &str) -> Result<Topic> {
        let name = validate_topic(name)?;
        self.conn
            .execute("INSERT INTO topics (name) VALUES (?1)", [&name])?;
        Ok(Topic {
            id: self.conn.last_insert_rowid(),
            name,
        })
    }
}

impl ScheduleLibrary for SqliteStore {
    fn list_schedules(&self) -> Result<Vec<StoredSchedule>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, body FROM schedules ORDER BY updated_at DESC, id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut stored = Vec::new();
        for row in rows {
            let (id, name, body) = row?;
            match serde_json::from_str::<Schedule>(&body) {
                Ok(schedule) => stored.push(StoredSchedule { id, name, schedule }),
                Err(e) => log::warn!("skipping unreadable schedule {id}: {e}"),
            }
        }
        Ok(stored)
    }

    fn save_schedule(&self, schedule: &Schedule) -> Result<StoredSchedule> {
        let mut saved = schedule.clone();
        if saved.id.is_empty() {
            saved.id = create_id("sch");
        }
        let name = saved_name(&saved);
        self.conn.execute(
            r#"
            INSERT INTO schedules (id, name, body) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                body = excluded.body,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![saved.id, name, serde_json::to_string(&saved)?],
        )?;
        Ok(StoredSchedule {
            id: saved.id.clone(),
            name,
            schedule: saved,
        })
    }

    fn delete_schedule(&self, id: &str) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM schedules WHERE id = ?1", [id])?;
        if removed == 0 {
            return Err(Error::NotFound(format!("schedule {id}")));
        }
        Ok(())
    }
}

impl Store for SqliteStore {
    fn health(&self) -> Result<Health> {
        let time: String = self
            .conn
            .query_row("SELECT datetime('now')", [], |row| row.get(0))
            .optional()?
            .unwrap_or_default();
        Ok(Health { ok: true, time })
    }

    fn describe(&self) -> String {
        format!("sqlite {}", self.location)
    }
}
