use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};

use super::{bold, dim, fit, rows, Screen, ScreenAction};
use crate::backend::{BackgroundWorker, Job, Notice};
use crate::clock::format_elapsed;
use crate::review::Word;
use crate::study::{SessionKind, StudySession, StudyTimer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Word,
    Example,
}

/// A word being typed in: the word first, then one example per Enter. An
/// empty Enter on the example line submits.
#[derive(Debug, Clone)]
struct WordDraft {
    word: String,
    examples: Vec<String>,
    line: String,
    field: Field,
}

impl WordDraft {
    fn new() -> Self {
        Self {
            word: String::new(),
            examples: Vec::new(),
            line: String::new(),
            field: Field::Word,
        }
    }

    fn current(&mut self) -> &mut String {
        match self.field {
            Field::Word => &mut self.word,
            Field::Example => &mut self.line,
        }
    }
}

/// Stopwatch for a study sitting, with words added along the way.
pub struct StudyScreen {
    timer: StudyTimer,
    worker: BackgroundWorker,
    draft: Option<WordDraft>,
    added: Vec<Word>,
    status: Option<String>,
}

impl StudyScreen {
    pub fn new(worker: BackgroundWorker) -> Self {
        Self {
            timer: StudyTimer::start(),
            worker,
            draft: None,
            added: Vec::new(),
            status: None,
        }
    }

    pub fn timer(&self) -> &StudyTimer {
        &self.timer
    }

    /// Words saved during this sitting, newest first.
    pub fn added(&self) -> &[Word] {
        &self.added
    }

    pub fn end(&mut self) {
        if self.timer.is_ended() {
            return;
        }
        self.draft = None;
        let minutes = self.timer.end();
        match StudySession::new(Local::now().date_naive(), minutes) {
            Ok(session) => self.worker.submit(Job::LogSession {
                kind: SessionKind::Study,
                session,
            }),
            Err(e) => self.status = Some(format!("not logged: {e}")),
        }
    }

    pub fn drain_notices(&mut self) -> bool {
        let notices = self.worker.poll();
        let changed = !notices.is_empty();
        for notice in notices {
            match notice {
                Notice::WordAdded(word) => {
                    self.status = Some(format!("added {:?}", word.word));
                    self.added.insert(0, word);
                }
                Notice::SessionLogged { minutes, .. } => {
                    self.status = Some(format!("session logged: {minutes} min"));
                }
                Notice::Failed { action, error } => {
                    self.status = Some(format!("failed to {action}: {error}"));
                }
                Notice::Counts { .. } => {}
            }
        }
        changed
    }

    pub fn finish(mut self) -> (Vec<Word>, Vec<Notice>) {
        self.drain_notices();
        let notices = self.worker.finish();
        let mut added = self.added;
        for notice in &notices {
            if let Notice::WordAdded(word) = notice {
                added.insert(0, word.clone());
            }
        }
        (added, notices)
    }

    fn on_draft_key(&mut self, key: KeyEvent) -> ScreenAction {
        let Some(draft) = self.draft.as_mut() else {
            return ScreenAction::None;
        };
        match key.code {
            KeyCode::Esc => self.draft = None,
            KeyCode::Backspace => {
                draft.current().pop();
            }
            KeyCode::Char(c) => draft.current().push(c),
            KeyCode::Enter => match draft.field {
                Field::Word if !draft.word.trim().is_empty() => draft.field = Field::Example,
                Field::Word => {}
                Field::Example if !draft.line.trim().is_empty() => {
                    let line = std::mem::take(&mut draft.line);
                    draft.examples.push(line.trim().to_string());
                }
                Field::Example if !draft.examples.is_empty() => {
                    if let Some(draft) = self.draft.take() {
                        self.worker.submit(Job::AddWord {
                            word: draft.word,
                            examples: draft.examples,
                        });
                    }
                }
                Field::Example => {
                    self.status = Some("add at least one example".to_string());
                }
            },
            _ => return ScreenAction::None,
        }
        ScreenAction::Redraw
    }
}

impl Screen for StudyScreen {
    fn render(&self, f: &mut Frame) {
        f.render_widget(self, f.area());
    }

    fn on_key(&mut self, key: KeyEvent) -> ScreenAction {
        if self.draft.is_some() {
            return self.on_draft_key(key);
        }
        match key.code {
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                self.timer.toggle_pause();
                if !self.timer.is_paused() {
                    return ScreenAction::Resumed;
                }
            }
            KeyCode::Char('a') if !self.timer.is_ended() => self.draft = Some(WordDraft::new()),
            KeyCode::Char('e') => self.end(),
            KeyCode::Char('q') => {
                self.end();
                return ScreenAction::Quit;
            }
            KeyCode::Esc => return ScreenAction::Quit,
            _ => return ScreenAction::None,
        }
        ScreenAction::Redraw
    }

    fn on_tick(&mut self) -> bool {
        let changed = self.drain_notices();
        changed || !self.timer.is_ended()
    }

    fn on_interrupt(&mut self) {
        self.end();
    }
}

impl Widget for &StudyScreen {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = rows(
            area,
            &[
                Constraint::Length(1), // header
                Constraint::Length(1),
                Constraint::Length(1), // elapsed
                Constraint::Length(1),
                Constraint::Length(4), // word draft
                Constraint::Min(1),    // words added
                Constraint::Length(1), // status
                Constraint::Length(1), // legend
            ],
        );
        let width = chunks[0].width;

        let mut header = vec![Span::styled("Study session", bold())];
        if self.timer.is_paused() {
            header.push(Span::styled("  paused", Style::default().fg(Color::Yellow)));
        }
        if self.timer.is_ended() {
            header.push(Span::styled("  ended", Style::default().fg(Color::Magenta)));
        }
        Paragraph::new(Line::from(header)).render(chunks[0], buf);

        Paragraph::new(Span::styled(
            format_elapsed(self.timer.elapsed()),
            bold().fg(Color::Green),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        if let Some(draft) = &self.draft {
            let cursor = |field: Field| if draft.field == field { "▏" } else { "" };
            let mut lines = vec![Line::from(vec![
                Span::styled("word: ", dim()),
                Span::raw(format!("{}{}", draft.word, cursor(Field::Word))),
            ])];
            for example in &draft.examples {
                lines.push(Line::from(Span::styled(format!("  • {}", fit(example, width.saturating_sub(4))), dim())));
            }
            if draft.field == Field::Example {
                lines.push(Line::from(vec![
                    Span::styled("example: ", dim()),
                    Span::raw(format!("{}{}", draft.line, cursor(Field::Example))),
                ]));
            }
            // keep the line being typed in view
            let skip = lines.len().saturating_sub(chunks[4].height as usize);
            Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>()).render(chunks[4], buf);
        }

        let added: Vec<Line> = self
            .added
            .iter()
            .map(|w| {
                Line::from(vec![
                    Span::styled(w.word.clone(), bold()),
                    Span::styled(
                        format!("  {}", fit(&w.examples.join(" / "), width.saturating_sub(w.word.len() as u16 + 2))),
                        dim(),
                    ),
                ])
            })
            .collect();
        if !added.is_empty() {
            Paragraph::new(added).render(chunks[5], buf);
        }

        if let Some(status) = &self.status {
            Paragraph::new(Span::styled(fit(status, width), dim())).render(chunks[6], buf);
        }

        let legend = if self.draft.is_some() {
            "(enter) next line / save on empty line  (esc) cancel"
        } else {
            "(a) add word  (p) pause  (e) end & log  (q) quit"
        };
        Paragraph::new(Span::styled(legend, Style::default().add_modifier(Modifier::ITALIC)))
            .alignment(Alignment::Center)
            .render(chunks[7], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{SessionLog, SqliteStore, WordStore};
    use crate::review::DateRange;
    use crossterm::event::KeyModifiers;
    use tempfile::tempdir;

    fn press(screen: &mut StudyScreen, code: KeyCode) -> ScreenAction {
        screen.on_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(screen: &mut StudyScreen, text: &str) {
        for c in text.chars() {
            press(screen, KeyCode::Char(c));
        }
    }

    #[test]
    fn add_word_then_end_logs_both() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("study.db");
        let store = SqliteStore::open(&path).unwrap();
        let mut screen = StudyScreen::new(BackgroundWorker::spawn(Box::new(
            SqliteStore::open(&path).unwrap(),
        )));

        press(&mut screen, KeyCode::Char('a'));
        type_text(&mut screen, "quip");
        press(&mut screen, KeyCode::Backspace);
        type_text(&mut screen, "p");
        press(&mut screen, KeyCode::Enter);
        type_text(&mut screen, "He made a quick quip.");
        press(&mut screen, KeyCode::Enter);
        // empty example line submits
        assert_eq!(press(&mut screen, KeyCode::Enter), ScreenAction::Redraw);
        assert_eq!(press(&mut screen, KeyCode::Char('q')), ScreenAction::Quit);

        let (added, notices) = screen.finish();
        assert!(notices.iter().all(|n| !n.is_failure()));
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].word, "quip");

        let words = store.list_words(DateRange::all()).unwrap();
        assert_eq!(words[0].examples, vec!["He made a quick quip.".to_string()]);
        assert_eq!(store.list_sessions(SessionKind::Study).unwrap().len(), 1);
    }

    #[test]
    fn word_needs_an_example() {
        let mut screen =
            StudyScreen::new(BackgroundWorker::spawn(Box::new(SqliteStore::open_in_memory().unwrap())));
        press(&mut screen, KeyCode::Char('a'));
        type_text(&mut screen, "lonely");
        press(&mut screen, KeyCode::Enter);
        press(&mut screen, KeyCode::Enter);
        assert!(screen.draft.is_some());
        assert_eq!(screen.status.as_deref(), Some("add at least one example"));

        press(&mut screen, KeyCode::Esc);
        assert!(screen.draft.is_none());
    }

    #[test]
    fn letters_in_draft_are_text_not_commands() {
        let mut screen =
            StudyScreen::new(BackgroundWorker::spawn(Box::new(SqliteStore::open_in_memory().unwrap())));
        press(&mut screen, KeyCode::Char('a'));
        assert_eq!(press(&mut screen, KeyCode::Char('q')), ScreenAction::Redraw);
        assert!(!screen.timer().is_ended());
    }
}
