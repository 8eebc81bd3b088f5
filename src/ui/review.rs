use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
    Frame,
};

use super::{bold, dim, fit, rows, Screen, ScreenAction};
use crate::backend::{BackgroundWorker, Job, Notice};
use crate::clock::format_elapsed;
use crate::review::{Outcome, Prompt, ReviewSession};
use crate::study::{SessionKind, StudySession};

/// Flash-card style review. Answers are saved in the background; the sitting
/// is logged as a review session when it ends.
pub struct ReviewScreen {
    session: ReviewSession,
    worker: BackgroundWorker,
    status: Option<String>,
}

impl ReviewScreen {
    pub fn new(session: ReviewSession, worker: BackgroundWorker) -> Self {
        Self {
            session,
            worker,
            status: None,
        }
    }

    pub fn session(&self) -> &ReviewSession {
        &self.session
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn answer(&mut self, outcome: Outcome) {
        if let Some(pending) = self.session.submit(outcome) {
            self.worker.submit(Job::RecordOutcome(pending));
        }
    }

    /// Stop the clock and queue the review-session log entry once.
    pub fn end(&mut self) {
        if self.session.is_ended() {
            return;
        }
        let minutes = self.session.end();
        match StudySession::new(Local::now().date_naive(), minutes) {
            Ok(session) => self.worker.submit(Job::LogSession {
                kind: SessionKind::Review,
                session,
            }),
            Err(e) => self.status = Some(format!("not logged: {e}")),
        }
    }

    /// Apply whatever the worker reported since the last call.
    pub fn drain_notices(&mut self) -> bool {
        let notices = self.worker.poll();
        let changed = !notices.is_empty();
        for notice in notices {
            self.apply(notice);
        }
        changed
    }

    fn apply(&mut self, notice: Notice) {
        match notice {
            Notice::Counts { word_id, counts } => self.session.apply_counts(word_id, counts),
            Notice::SessionLogged { minutes, .. } => {
                self.status = Some(format!("review logged: {minutes} min"));
            }
            Notice::Failed { action, error } => {
                self.status = Some(format!("failed to {action}: {error}"));
            }
            Notice::WordAdded(_) => {}
        }
    }

    /// Wait for pending saves and return their notices.
    pub fn finish(self) -> Vec<Notice> {
        self.worker.finish()
    }
}

impl Screen for ReviewScreen {
    fn render(&self, f: &mut Frame) {
        f.render_widget(self, f.area());
    }

    fn on_key(&mut self, key: KeyEvent) -> ScreenAction {
        match key.code {
            KeyCode::Char('y') => self.answer(Outcome::Yes),
            KeyCode::Char('n') => self.answer(Outcome::No),
            KeyCode::Char('s') | KeyCode::Right => self.session.skip(),
            KeyCode::Char('h') => self.session.toggle_hint(),
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                self.session.toggle_pause();
                if !self.session.is_paused() {
                    return ScreenAction::Resumed;
                }
            }
            KeyCode::Char('e') => self.end(),
            KeyCode::Char('q') => {
                self.end();
                return ScreenAction::Quit;
            }
            // leave without logging
            KeyCode::Esc => return ScreenAction::Quit,
            _ => return ScreenAction::None,
        }
        ScreenAction::Redraw
    }

    fn on_tick(&mut self) -> bool {
        self.drain_notices();
        // the elapsed clock changes every second
        (!self.session.is_ended() && !self.session.is_paused()) || self.status.is_some()
    }

    fn on_interrupt(&mut self) {
        self.end();
    }
}

impl Widget for &ReviewScreen {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;
        let chunks = rows(
            area,
            &[
                Constraint::Length(1), // header
                Constraint::Min(1),
                Constraint::Length(3), // prompt
                Constraint::Length(1),
                Constraint::Min(3), // hint examples
                Constraint::Length(1), // status
                Constraint::Length(1), // legend
            ],
        );
        let width = chunks[0].width;

        let (position, total) = session.progress();
        let mut header = vec![
            Span::styled(format!("Word review ({})", session.mode()), bold()),
            Span::raw("  "),
            Span::styled(format!("{}/{}", (position + 1).min(total), total), dim()),
            Span::raw("  "),
            Span::raw(format_elapsed(session.elapsed())),
        ];
        if session.is_paused() {
            header.push(Span::styled("  paused", Style::default().fg(Color::Yellow)));
        }
        if session.is_ended() {
            header.push(Span::styled("  session ended", Style::default().fg(Color::Magenta)));
        }
        Paragraph::new(Line::from(header)).render(chunks[0], buf);

        let body: Line = match (session.current(), session.prompt()) {
            _ if session.is_paused() => Line::from(Span::styled("paused", dim())),
            (Some(_), Some(Prompt::Word(word))) => {
                Line::from(Span::styled(word.clone(), bold().fg(Color::Green)))
            }
            (Some(_), Some(Prompt::Masked { sentence, .. })) => {
                Line::from(Span::styled(sentence.clone(), bold().fg(Color::Cyan)))
            }
            _ if total == 0 => Line::from("No words available."),
            _ => Line::from(format!("All {} words reviewed. (q) to finish", session.reviewed())),
        };
        Paragraph::new(body)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);

        if session.hint_visible() && !session.is_paused() {
            if let Some(word) = session.current() {
                let mut lines = vec![Line::from(Span::styled(
                    format!("{}  ({:.0}% familiar)", word.word, word.familiarity() * 100.0),
                    dim(),
                ))];
                lines.extend(
                    word.examples
                        .iter()
                        .map(|ex| Line::from(format!("• {}", fit(ex, width.saturating_sub(2))))),
                );
                Paragraph::new(lines).render(chunks[4], buf);
            }
        }

        if let Some(status) = &self.status {
            Paragraph::new(Span::styled(fit(status, width), dim())).render(chunks[5], buf);
        }

        Paragraph::new(Span::styled(
            "(y) knew it  (n) didn't  (s) skip  (h) hint  (p) pause  (e) end  (q) quit",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
    }
}
