use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use assert_matches::assert_matches;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::TestBackend, Terminal};

use engtrack::backend::{BackgroundWorker, SessionLog, SqliteStore, WordStore};
use engtrack::review::{DateRange, Outcome, ReviewMode, ReviewSession};
use engtrack::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};
use engtrack::schedule::preset;
use engtrack::study::SessionKind;
use engtrack::timer::{
    CueSettings, RecordingAnnouncer, TimerSession, TimerState, FINISHED_MESSAGE, HALFWAY_MESSAGE,
};
use engtrack::ui::{run_screen, ReviewScreen, TimerScreen};

fn key(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Headless run of a whole preset through Runner/TestEventSource, no TTY.
#[test]
fn headless_timer_runs_preset_to_completion() {
    let schedule = preset("minimal_demo").unwrap();
    let mut session = TimerSession::new(schedule, RecordingAnnouncer::default(), CueSettings::default());
    session.start();

    let (_tx, rx) = mpsc::channel();
    let mut runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(1)));

    for _ in 0..200u32 {
        if let AppEvent::Tick = runner.step() {
            session.tick();
        }
        if session.is_done() {
            break;
        }
    }

    assert_eq!(session.state(), TimerState::Finished);
    assert_eq!(session.elapsed_seconds(), 61);
    assert_eq!(session.remaining_seconds(), 0);

    let spoken = session.announcer().spoken();
    assert_eq!(spoken.last().copied(), Some(FINISHED_MESSAGE));
    assert_eq!(spoken.iter().filter(|s| **s == HALFWAY_MESSAGE).count(), 1);
    assert!(spoken.contains(&"Hold 2"));
    // one chime per phase change plus the finish
    assert_eq!(session.announcer().chimes(), session.phases().len());
}

#[test]
fn headless_pause_holds_the_countdown() {
    let schedule = preset("minimal_demo").unwrap();
    let mut session = TimerSession::new(schedule, RecordingAnnouncer::default(), CueSettings::default());
    session.start();

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(1)));

    tx.send(key(' ')).unwrap();
    let mut ticks_while_paused = 0;
    for _ in 0..20u32 {
        match runner.step() {
            AppEvent::Key(_) => {
                session.toggle_pause();
            }
            AppEvent::Tick => {
                session.tick();
                ticks_while_paused += 1;
            }
            AppEvent::Resize => {}
        }
    }

    assert_eq!(session.state(), TimerState::Paused);
    assert!(ticks_while_paused > 0);
    assert_eq!(session.elapsed_seconds(), 0);
    assert_eq!(session.remaining_seconds(), 5);
}

#[test]
fn headless_timer_screen_quits_on_key() {
    let schedule = preset("minimal_demo").unwrap();
    let mut screen = TimerScreen::new(TimerSession::new(
        schedule,
        RecordingAnnouncer::default(),
        CueSettings::default(),
    ));

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));
    let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();

    let sender = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        tx.send(key('q')).unwrap();
    });
    run_screen(&mut terminal, &mut runner, &mut screen).unwrap();
    sender.join().unwrap();

    let session = screen.into_session();
    assert_eq!(session.state(), TimerState::Ended);
    // ended early: nothing left queued to say
    assert_matches!(session.announcer().cues.last(), Some(engtrack::timer::Cue::Cancel));
}

#[test]
fn headless_review_records_answers_and_logs_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.db");
    let store = SqliteStore::open(&path).unwrap();
    for (word, example) in [
        ("study", "She studies every night before bed."),
        ("quip", "He answered with a quip."),
        ("brisk", "We took a brisk walk along the river."),
    ] {
        store.add_word(word, &[example.to_string()]).unwrap();
    }
    let words = store.list_words(DateRange::all()).unwrap();

    let session = ReviewSession::new(words, ReviewMode::Weighted);
    let worker = BackgroundWorker::spawn(Box::new(SqliteStore::open(&path).unwrap()));
    let mut screen = ReviewScreen::new(session, worker);

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    for c in ['y', 'n', 'y', 'q'] {
        tx.send(key(c)).unwrap();
    }
    run_screen(&mut terminal, &mut runner, &mut screen).unwrap();

    assert!(screen.session().is_exhausted());
    assert_eq!(screen.session().reviewed(), 3);
    let notices = screen.finish();
    assert!(notices.iter().all(|n| !n.is_failure()), "{notices:?}");

    let words = store.list_words(DateRange::all()).unwrap();
    let yes: u32 = words.iter().map(|w| w.yes_count).sum();
    assert_eq!(yes, 2);
    assert_eq!(words.iter().filter(|w| w.no_count == Some(1)).count(), 1);

    let logged = store.list_sessions(SessionKind::Review).unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].duration_minutes, 1);
}

#[test]
fn headless_review_outcome_updates_familiarity() {
    let store = SqliteStore::open_in_memory().unwrap();
    let word = store.add_word("brisk", &["A brisk pace.".to_string()]).unwrap();
    assert_eq!(word.familiarity(), 0.0);

    let counts = store.record_outcome(word.id, Outcome::Yes).unwrap();
    assert_eq!((counts.yes_count, counts.no_count), (1, 0));

    let reloaded = &store.list_words(DateRange::all()).unwrap()[0];
    assert_eq!(reloaded.familiarity(), 1.0);
    assert_eq!(reloaded.weight(), 0.0);
}
