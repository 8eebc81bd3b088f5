use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use super::Store;
use crate::review::{Counts, PendingOutcome, Word};
use crate::study::{SessionKind, StudySession};

/// A store write to run off the UI thread.
#[derive(Debug, Clone)]
pub enum Job {
    RecordOutcome(PendingOutcome),
    LogSession {
        kind: SessionKind,
        session: StudySession,
    },
    AddWord {
        word: String,
        examples: Vec<String>,
    },
}

/// Result of a [`Job`], reported back to the screen that queued it.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Counts { word_id: i64, counts: Counts },
    SessionLogged { kind: SessionKind, minutes: u32 },
    WordAdded(Word),
    Failed { action: String, error: String },
}

impl Notice {
    pub fn is_failure(&self) -> bool {
        matches!(self, Notice::Failed { .. })
    }
}

/// Runs store writes on its own thread so slow networks never stall the tick loop.
pub struct BackgroundWorker {
    tx: Option<Sender<Job>>,
    rx: Receiver<Notice>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundWorker {
    pub fn spawn(store: Box<dyn Store + Send>) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (notice_tx, notice_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            for job in job_rx {
                let notice = run_job(store.as_ref(), job);
                if notice_tx.send(notice).is_err() {
                    break;
                }
            }
        });

        Self {
            tx: Some(job_tx),
            rx: notice_rx,
            handle: Some(handle),
        }
    }

    pub fn submit(&self, job: Job) {
        if let Some(tx) = &self.tx {
            if tx.send(job).is_err() {
                log::error!("background worker is gone; dropping job");
            }
        }
    }

    /// Notices that have arrived so far, without blocking.
    pub fn poll(&self) -> Vec<Notice> {
        self.rx.try_iter().collect()
    }

    /// Wait for every queued job and return the remaining notices.
    pub fn finish(mut self) -> Vec<Notice> {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("background worker panicked");
            }
        }
        self.rx.try_iter().collect()
    }
}

impl Drop for BackgroundWorker {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_job(store: &(dyn Store + Send), job: Job) -> Notice {
    match job {
        Job::RecordOutcome(PendingOutcome { word_id, outcome }) => {
            match store.record_outcome(word_id, outcome) {
                Ok(counts) => Notice::Counts { word_id, counts },
                Err(e) => failed(&format!("save {outcome} for word {word_id}"), e),
            }
        }
        Job::LogSession { kind, session } => match store.log_session(kind, &session) {
            Ok(()) => Notice::SessionLogged {
                kind,
                minutes: session.duration_minutes,
            },
            Err(e) => failed(&format!("save {kind} session"), e),
        },
        Job::AddWord { word, examples } => match store.add_word(&word, &examples) {
            Ok(saved) => Notice::WordAdded(saved),
            Err(e) => failed(&format!("add word {word:?}"), e),
        },
    }
}

fn failed(action: &str, error: crate::error::Error) -> Notice {
    log::warn!("failed to {action}: {error}");
    Notice::Failed {
        action: action.to_string(),
        error: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{SqliteStore, WordStore};
    use crate::review::{DateRange, Outcome};
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    #[test]
    fn jobs_run_in_order_and_report_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("worker.db");
        let local = SqliteStore::open(&path).unwrap();
        let word = local
            .add_word("study", &["I study English every single evening.".to_string()])
            .unwrap();

        let worker = BackgroundWorker::spawn(Box::new(SqliteStore::open(&path).unwrap()));
        worker.submit(Job::RecordOutcome(PendingOutcome {
            word_id: word.id,
            outcome: Outcome::Yes,
        }));
        worker.submit(Job::RecordOutcome(PendingOutcome {
            word_id: 404,
            outcome: Outcome::No,
        }));
        worker.submit(Job::LogSession {
            kind: SessionKind::Review,
            session: StudySession::new(NaiveDate::from_ymd_opt(2025, 9, 2).unwrap(), 3).unwrap(),
        });
        let notices = worker.finish();

        assert_eq!(notices.len(), 3);
        assert_matches!(
            &notices[0],
            Notice::Counts { word_id, counts } if *word_id == word.id && counts.yes_count == 1
        );
        assert!(notices[1].is_failure());
        assert_matches!(notices[2], Notice::SessionLogged { kind: SessionKind::Review, minutes: 3 });

        let reloaded = local.list_words(DateRange::all()).unwrap();
        assert_eq!(reloaded[0].yes_count, 1);
    }
}
