use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::Backend, Frame, Terminal};
use std::io;

use crate::runtime::{AppEvent, EventSource, Runner, Ticker};

/// What the loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAction {
    None,
    Redraw,
    /// Un-paused: restart the tick interval, then redraw.
    Resumed,
    Quit,
}

/// A UI Screen boundary: responsible for rendering, ticks and key handling
pub trait Screen {
    fn render(&self, f: &mut Frame);
    fn on_key(&mut self, key: KeyEvent) -> ScreenAction;
    /// One second passed. Returns true when the screen needs a redraw.
    fn on_tick(&mut self) -> bool;
    /// Called once when the user force-quits (Ctrl+C).
    fn on_interrupt(&mut self) {}
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

/// Drive `screen` with events from `runner` until it asks to quit.
pub fn run_screen<B, E, T, S>(
    terminal: &mut Terminal<B>,
    runner: &mut Runner<E, T>,
    screen: &mut S,
) -> io::Result<()>
where
    B: Backend,
    E: EventSource,
    T: Ticker,
    S: Screen + ?Sized,
{
    terminal.draw(|f| screen.render(f))?;

    loop {
        let redraw = match runner.step() {
            AppEvent::Tick => screen.on_tick(),
            AppEvent::Resize => true,
            AppEvent::Key(key) if is_interrupt(&key) => {
                screen.on_interrupt();
                break;
            }
            AppEvent::Key(key) => match screen.on_key(key) {
                ScreenAction::Quit => break,
                ScreenAction::Resumed => {
                    runner.reset_deadline();
                    true
                }
                ScreenAction::Redraw => true,
                ScreenAction::None => false,
            },
        };

        if redraw {
            terminal.draw(|f| screen.render(f))?;
        }
    }

    Ok(())
}
