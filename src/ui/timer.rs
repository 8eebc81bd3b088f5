use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget},
    Frame,
};

use super::{bold, dim, fit, on_off, rows, Screen, ScreenAction};
use crate::schedule::{format_duration, PhaseKind};
use crate::timer::{Announcer, TimerSession, TimerState};

/// Full-screen countdown for one schedule run.
pub struct TimerScreen<A: Announcer> {
    session: TimerSession<A>,
}

impl<A: Announcer> TimerScreen<A> {
    /// Starts the session right away.
    pub fn new(mut session: TimerSession<A>) -> Self {
        session.start();
        Self { session }
    }

    pub fn session(&self) -> &TimerSession<A> {
        &self.session
    }

    pub fn into_session(self) -> TimerSession<A> {
        self.session
    }
}

impl<A: Announcer> Screen for TimerScreen<A> {
    fn render(&self, f: &mut Frame) {
        f.render_widget(self, f.area());
    }

    fn on_key(&mut self, key: KeyEvent) -> ScreenAction {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Char('p') => match self.session.toggle_pause() {
                TimerState::Running => ScreenAction::Resumed,
                _ => ScreenAction::Redraw,
            },
            KeyCode::Char('v') => {
                let on = !self.session.cues().voice;
                self.session.set_voice(on);
                ScreenAction::Redraw
            }
            KeyCode::Char('b') => {
                let on = !self.session.cues().chime;
                self.session.set_chime(on);
                ScreenAction::Redraw
            }
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.session.state() != TimerState::Finished {
                    self.session.end();
                }
                ScreenAction::Quit
            }
            _ => ScreenAction::None,
        }
    }

    fn on_tick(&mut self) -> bool {
        self.session.tick()
    }

    fn on_interrupt(&mut self) {
        self.session.end();
    }
}

impl<A: Announcer> Widget for &TimerScreen<A> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;
        let chunks = rows(
            area,
            &[
                Constraint::Length(1), // schedule name + state
                Constraint::Min(1),    // padding
                Constraint::Length(1), // phase label
                Constraint::Length(1), // remaining
                Constraint::Length(1), // next phase
                Constraint::Min(1),    // padding
                Constraint::Length(1), // progress gauge
                Constraint::Length(1), // cue toggles
                Constraint::Length(1), // legend
            ],
        );
        let width = chunks[0].width;

        let state = match session.state() {
            TimerState::Running => Span::styled("running", Style::default().fg(Color::Green)),
            TimerState::Paused => Span::styled("paused", Style::default().fg(Color::Yellow)),
            other => Span::styled(other.to_string().to_lowercase(), dim()),
        };
        Paragraph::new(Line::from(vec![
            Span::styled(fit(session.schedule().display_name(), width.saturating_sub(12)), bold()),
            Span::raw("  "),
            state,
        ]))
        .render(chunks[0], buf);

        let (label, label_style, remaining) = match session.current_phase() {
            Some(phase) if !session.is_done() => {
                let color = match phase.kind {
                    PhaseKind::Hold => Color::Green,
                    PhaseKind::Break => Color::Cyan,
                };
                (
                    phase.label.clone(),
                    bold().fg(color),
                    format_duration(u64::from(session.remaining_seconds())),
                )
            }
            _ if session.state() == TimerState::Ended => {
                ("Session ended".to_string(), bold(), String::new())
            }
            _ => (
                crate::timer::FINISHED_MESSAGE.to_string(),
                bold().fg(Color::Magenta),
                String::new(),
            ),
        };
        Paragraph::new(Span::styled(fit(&label, width), label_style))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
        Paragraph::new(Span::styled(remaining, bold()))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        if let Some(next) = session.next_phase().filter(|_| !session.is_done()) {
            let text = format!(
                "next: {} ({})",
                next.label,
                format_duration(u64::from(next.duration_seconds))
            );
            Paragraph::new(Span::styled(fit(&text, width), dim()))
                .alignment(Alignment::Center)
                .render(chunks[4], buf);
        }

        Gauge::default()
            .gauge_style(Style::default().fg(Color::Magenta))
            .ratio(session.progress())
            .label(format!(
                "{} / {}",
                format_duration(session.elapsed_seconds()),
                format_duration(session.total_seconds())
            ))
            .render(chunks[6], buf);

        let cues = session.cues();
        Paragraph::new(Span::styled(
            format!("(v) voice {}   (b) beep {}", on_off(cues.voice), on_off(cues.chime)),
            dim(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[7], buf);

        let legend = if session.is_done() {
            "(q)uit"
        } else {
            "(space) pause/resume   (q) end session"
        };
        Paragraph::new(Span::styled(legend, Style::default().add_modifier(ratatui::style::Modifier::ITALIC)))
            .alignment(Alignment::Center)
            .render(chunks[8], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::preset;
    use crate::timer::{CueSettings, RecordingAnnouncer};
    use crate::ui::buffer_text;
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen() -> TimerScreen<RecordingAnnouncer> {
        let schedule = preset("minimal_demo").unwrap();
        TimerScreen::new(TimerSession::new(
            schedule,
            RecordingAnnouncer::default(),
            CueSettings::default(),
        ))
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn renders_current_phase_and_progress() {
        let screen = screen();
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| Screen::render(&screen, f)).unwrap();

        let text = buffer_text(&terminal);
        let first = &screen.session().phases()[0];
        assert!(text.contains(&first.label));
        assert!(text.contains("running"));
        assert!(text.contains("0:00 / 1:01"));
    }

    #[test]
    fn pause_key_reports_resume() {
        let mut screen = screen();
        assert_eq!(screen.on_key(key(' ')), ScreenAction::Redraw);
        assert_eq!(screen.session().state(), TimerState::Paused);
        assert!(!screen.on_tick());
        assert_eq!(screen.on_key(key('p')), ScreenAction::Resumed);
    }

    #[test]
    fn toggles_and_quit() {
        let mut screen = screen();
        screen.on_key(key('v'));
        screen.on_key(key('b'));
        assert_eq!(
            screen.session().cues(),
            CueSettings {
                voice: false,
                chime: false
            }
        );
        assert_eq!(screen.on_key(key('q')), ScreenAction::Quit);
        assert_eq!(screen.session().state(), TimerState::Ended);
    }

    #[test]
    fn finished_screen_shows_message() {
        let mut screen = screen();
        while screen.on_tick() {}
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| Screen::render(&screen, f)).unwrap();
        assert!(buffer_text(&terminal).contains("Congrats"));
        assert_eq!(screen.on_key(key('q')), ScreenAction::Quit);
        assert_eq!(screen.session().state(), TimerState::Finished);
    }
}
