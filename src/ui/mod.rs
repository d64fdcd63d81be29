//! Terminal user interface
//!
//! - `markup_view` - proposal markup to styled terminal lines
//! - `view` - dialog state, drawing and key mapping
//!
//! `TerminalSink` owns the terminal for the lifetime of a session: raw mode
//! and the alternate screen are entered on creation and restored on drop.

mod markup_view;
mod view;

pub use markup_view::{LinkTarget, RenderedDocument, render as render_markup};
pub use view::{Popup, ProposalView, Selectable};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stdout, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::sink::{
    Confirmation, DialogLayout, MenuItem, NextLabel, Progress, RenderSink, UserAction, Widget,
};

/// Render sink drawing the proposal dialog on the terminal
pub struct TerminalSink {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    view: ProposalView,
}

impl TerminalSink {
    pub fn new() -> std::io::Result<Self> {
        debug!("Initializing terminal for the proposal dialog");
        enable_raw_mode()?;
        if let Err(e) = crossterm::execute!(stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let terminal = match Terminal::new(CrosstermBackend::new(stdout())) {
            Ok(terminal) => terminal,
            Err(e) => {
                restore_terminal();
                return Err(e);
            }
        };
        Ok(Self {
            terminal,
            view: ProposalView::default(),
        })
    }

    fn draw(&mut self) {
        let view = &self.view;
        if let Err(e) = self.terminal.draw(|f| view.draw(f)) {
            warn!("Failed to draw proposal dialog: {}", e);
        }
    }

    /// Next key press; read failures count as Esc
    fn read_key(&mut self) -> KeyEvent {
        loop {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => return key,
                Ok(Event::Resize(_, _)) => self.draw(),
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to read terminal event: {}", e);
                    return KeyEvent::from(KeyCode::Esc);
                }
            }
        }
    }

    fn with_popup<T>(&mut self, popup: Popup, mut answer: impl FnMut(&mut Self, KeyEvent) -> Option<T>) -> T {
        self.view.popup = Some(popup);
        let result = loop {
            self.draw();
            let key = self.read_key();
            if let Some(result) = answer(self, key) {
                break result;
            }
        };
        self.view.popup = None;
        self.draw();
        result
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(stdout(), LeaveAlternateScreen);
}

impl Drop for TerminalSink {
    fn drop(&mut self) {
        restore_terminal();
        let _ = self.terminal.show_cursor();
    }
}

impl RenderSink for TerminalSink {
    fn set_dialog(&mut self, dialog: &DialogLayout) {
        self.view.set_dialog(dialog);
        self.draw();
    }

    fn widget_exists(&self, widget: Widget) -> bool {
        match widget {
            Widget::Skip => self.view.dialog.enable_skip,
            Widget::Tabs => !self.view.dialog.tab_labels.is_empty(),
            _ => true,
        }
    }

    fn set_content(&mut self, markup: &str) {
        self.view.set_content(markup);
        self.draw();
    }

    fn set_enabled(&mut self, widget: Widget, enabled: bool) {
        if enabled {
            self.view.disabled.remove(&widget);
        } else {
            self.view.disabled.insert(widget);
        }
        self.draw();
    }

    fn set_busy(&mut self, busy: bool) {
        self.view.busy = busy;
        self.draw();
    }

    fn set_progress(&mut self, progress: Option<Progress>) {
        self.view.progress = progress;
        self.draw();
    }

    fn set_menu(&mut self, items: &[MenuItem]) {
        self.view.menu = items.to_vec();
        self.draw();
    }

    fn set_current_tab(&mut self, tab: usize) {
        self.view.dialog.current_tab = tab;
        self.draw();
    }

    fn set_help(&mut self, help: &str) {
        self.view.help = render_markup(help);
    }

    fn set_next_label(&mut self, label: NextLabel) {
        self.view.next_label = Some(label);
        self.draw();
    }

    fn skip_selected(&self) -> bool {
        self.view.skip
    }

    fn close_leftover_layers(&mut self) -> usize {
        match self.view.popup.take() {
            Some(_) => {
                self.draw();
                1
            }
            None => 0,
        }
    }

    fn user_input(&mut self) -> UserAction {
        loop {
            self.draw();
            let key = self.read_key();
            if let Some(action) = self.view.handle_key(key) {
                return action;
            }
        }
    }

    fn confirm(&mut self, confirmation: Confirmation) -> bool {
        self.with_popup(Popup::Confirm(confirmation.question().to_string()), |_, key| {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(false),
                _ => None,
            }
        })
    }

    fn ask_save_path(&mut self) -> Option<PathBuf> {
        self.with_popup(Popup::SavePath(String::new()), |sink, key| {
            let Some(Popup::SavePath(input)) = sink.view.popup.as_mut() else {
                return Some(None);
            };
            match key.code {
                KeyCode::Enter if !input.trim().is_empty() => {
                    Some(Some(PathBuf::from(input.trim())))
                }
                KeyCode::Esc => Some(None),
                KeyCode::Backspace => {
                    input.pop();
                    None
                }
                KeyCode::Char(c) => {
                    input.push(c);
                    None
                }
                _ => None,
            }
        })
    }

    fn show_error(&mut self, message: &str) {
        self.with_popup(Popup::Error(message.to_string()), |_, key| {
            matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')).then_some(())
        });
    }

    fn show_timed_message(&mut self, message: &str, seconds: u64) {
        self.view.popup = Some(Popup::Message(message.to_string()));
        self.draw();

        let deadline = Instant::now() + Duration::from_secs(seconds);
        while let Some(left) = deadline.checked_duration_since(Instant::now()) {
            match event::poll(left) {
                Ok(true) => {
                    if let Ok(Event::Key(_)) = event::read() {
                        break;
                    }
                }
                Ok(false) => break,
                Err(e) => {
                    warn!("Failed to poll terminal events: {}", e);
                    break;
                }
            }
        }

        self.view.popup = None;
        self.draw();
    }
}
