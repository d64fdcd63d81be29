//! Proposal dialog view state and drawing
//!
//! `ProposalView` holds everything the terminal shows. It is independent of
//! the real terminal so drawing and key handling work on a test backend.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use std::collections::HashSet;

use super::markup_view::{self, RenderedDocument};
use crate::sink::{DialogLayout, MenuItem, NextLabel, Progress, UserAction, Widget};
use crate::theme::{Colors, Styles, UiConstants};

/// Modal popup on top of the dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    Confirm(String),
    Error(String),
    Message(String),
    SavePath(String),
}

/// One entry of the selector next to the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectable {
    pub label: String,
    pub action: UserAction,
}

#[derive(Debug, Default)]
pub struct ProposalView {
    pub dialog: DialogLayout,
    pub document: RenderedDocument,
    pub help: RenderedDocument,
    pub menu: Vec<MenuItem>,
    pub selected: usize,
    pub scroll: u16,
    pub progress: Option<Progress>,
    pub busy: bool,
    pub next_label: Option<NextLabel>,
    pub skip: bool,
    pub disabled: HashSet<Widget>,
    pub show_help: bool,
    pub popup: Option<Popup>,
}

impl ProposalView {
    pub fn set_dialog(&mut self, dialog: &DialogLayout) {
        self.dialog = dialog.clone();
        self.document = markup_view::render(&dialog.initial_content);
        self.help = markup_view::render(&dialog.help);
        self.skip = false;
        self.selected = 0;
        self.scroll = 0;
    }

    pub fn set_content(&mut self, markup: &str) {
        self.document = markup_view::render(markup);
        let count = self.selectables().len();
        if self.selected >= count {
            self.selected = count.saturating_sub(1);
        }
    }

    pub fn is_enabled(&self, widget: Widget) -> bool {
        !self.disabled.contains(&widget)
    }

    /// Document links first, then the change menu
    pub fn selectables(&self) -> Vec<Selectable> {
        let mut entries: Vec<Selectable> = self
            .document
            .links
            .iter()
            .map(|link| Selectable {
                label: if link.text.is_empty() {
                    link.id.clone()
                } else {
                    link.text.clone()
                },
                action: UserAction::Link(link.id.clone()),
            })
            .collect();

        if self.is_enabled(Widget::Menu) {
            entries.extend(self.menu.iter().map(|item| Selectable {
                label: item.label.clone(),
                action: item.action.clone(),
            }));
        }
        entries
    }

    fn next_text(&self) -> &'static str {
        match self.next_label {
            Some(NextLabel::Install) => "Install",
            Some(NextLabel::Update) => "Update",
            _ => "Next",
        }
    }

    /// Translate a key press into a user action; view-only keys return `None`
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<UserAction> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(UserAction::Cancel);
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::F(1)) {
                self.show_help = false;
            }
            return None;
        }

        let proposal_enabled = self.is_enabled(Widget::Proposal);

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let count = self.selectables().len();
                if self.selected + 1 < count {
                    self.selected += 1;
                }
                None
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(UiConstants::PAGE_SCROLL_SIZE);
                None
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_add(UiConstants::PAGE_SCROLL_SIZE);
                None
            }
            KeyCode::Enter if proposal_enabled => self
                .selectables()
                .get(self.selected)
                .map(|entry| entry.action.clone()),
            KeyCode::Tab if !self.dialog.tab_labels.is_empty() => {
                let tab = (self.dialog.current_tab + 1) % self.dialog.tab_labels.len();
                self.dialog.current_tab = tab;
                Some(UserAction::Tab(tab))
            }
            KeyCode::BackTab if !self.dialog.tab_labels.is_empty() => {
                let count = self.dialog.tab_labels.len();
                let tab = (self.dialog.current_tab + count - 1) % count;
                self.dialog.current_tab = tab;
                Some(UserAction::Tab(tab))
            }
            KeyCode::Char('n') | KeyCode::F(10) if self.is_enabled(Widget::Next) => {
                Some(UserAction::Next)
            }
            KeyCode::Char('b') | KeyCode::F(8) if self.dialog.enable_back => Some(UserAction::Back),
            KeyCode::Char('a') | KeyCode::F(9) | KeyCode::Esc
                if self.is_enabled(Widget::Abort) =>
            {
                Some(UserAction::Abort)
            }
            KeyCode::Char('s') if self.dialog.enable_skip => {
                self.skip = !self.skip;
                Some(if self.skip {
                    UserAction::Skip
                } else {
                    UserAction::DontSkip
                })
            }
            KeyCode::Char('r') if self.is_enabled(Widget::Menu) => {
                Some(UserAction::ResetToDefaults)
            }
            KeyCode::Char('e') if self.is_enabled(Widget::Menu) => Some(UserAction::ExportConfig),
            KeyCode::Char('h') | KeyCode::F(1) => {
                self.show_help = true;
                None
            }
            _ => None,
        }
    }

    pub fn draw(&self, f: &mut Frame) {
        let area = f.area();
        f.render_widget(Block::default().style(Styles::text().bg(Colors::BG_PRIMARY)), area);

        let has_tabs = !self.dialog.tab_labels.is_empty();
        let constraints = [
            Constraint::Length(3),
            Constraint::Length(if has_tabs { 3 } else { 0 }),
            Constraint::Min(5),
            Constraint::Length(if self.progress.is_some() { 1 } else { 0 }),
            Constraint::Length(1),
        ];
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        self.draw_title(f, chunks[0]);
        if has_tabs {
            self.draw_tabs(f, chunks[1]);
        }
        self.draw_body(f, chunks[2]);
        if let Some(progress) = self.progress {
            draw_progress(f, chunks[3], progress);
        }
        self.draw_nav(f, chunks[4]);

        if self.show_help {
            self.draw_help(f, area);
        }
        if let Some(popup) = &self.popup {
            draw_popup(f, area, popup);
        }
    }

    fn draw_title(&self, f: &mut Frame, area: Rect) {
        let mut title = self.dialog.headline.clone();
        if self.busy {
            title.push_str("  [busy]");
        }
        let widget = Paragraph::new(title)
            .style(Styles::title())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(Styles::border_active()));
        f.render_widget(widget, area);
    }

    fn draw_tabs(&self, f: &mut Frame, area: Rect) {
        let tabs = Tabs::new(self.dialog.tab_labels.clone())
            .select(self.dialog.current_tab)
            .style(Styles::text_muted())
            .highlight_style(Styles::selected())
            .block(Block::default().borders(Borders::ALL).border_style(Styles::border_inactive()));
        f.render_widget(tabs, area);
    }

    fn draw_body(&self, f: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(100 - UiConstants::MENU_WIDTH_PCT),
                Constraint::Percentage(UiConstants::MENU_WIDTH_PCT),
            ])
            .split(area);

        let border = if self.is_enabled(Widget::Proposal) {
            Styles::border_active()
        } else {
            Styles::border_inactive()
        };
        let document = Paragraph::new(self.document.lines.clone())
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .block(Block::default().borders(Borders::ALL).border_style(border));
        f.render_widget(document, columns[0]);

        let items: Vec<ListItem> = self
            .selectables()
            .into_iter()
            .map(|entry| ListItem::new(entry.label))
            .collect();
        let mut state = ListState::default();
        if !items.is_empty() {
            state.select(Some(self.selected));
        }
        let list = List::new(items)
            .highlight_style(Styles::selected())
            .block(
                Block::default()
                    .title(" Change... ")
                    .borders(Borders::ALL)
                    .border_style(border),
            );
        f.render_stateful_widget(list, columns[1], &mut state);
    }

    fn draw_nav(&self, f: &mut Frame, area: Rect) {
        let mut hints = vec![format!("[n] {}", self.next_text())];
        if self.dialog.enable_back {
            hints.push("[b] Back".to_string());
        }
        hints.push("[a] Abort".to_string());
        if self.dialog.enable_skip {
            let state = if self.skip { "on" } else { "off" };
            hints.push(format!("[s] Skip configuration: {}", state));
        }
        hints.push("[h] Help".to_string());
        let line = Line::from(Span::styled(hints.join("  "), Styles::nav_hint()));
        f.render_widget(Paragraph::new(line), area);
    }

    fn draw_help(&self, f: &mut Frame, area: Rect) {
        let rect = centered_rect(area, 80, area.height.saturating_sub(4));
        f.render_widget(Clear, rect);
        let help = Paragraph::new(self.help.lines.clone())
            .wrap(Wrap { trim: false })
            .style(Styles::popup())
            .block(Block::default().title(" Help ").borders(Borders::ALL));
        f.render_widget(help, rect);
    }
}

fn draw_progress(f: &mut Frame, area: Rect, progress: Progress) {
    let ratio = if progress.max == 0 {
        0.0
    } else {
        (progress.value as f64 / progress.max as f64).clamp(0.0, 1.0)
    };
    let gauge = Gauge::default()
        .gauge_style(Styles::progress())
        .ratio(ratio)
        .label(format!("{}/{}", progress.value, progress.max));
    f.render_widget(gauge, area);
}

fn draw_popup(f: &mut Frame, area: Rect, popup: &Popup) {
    let (title, body, hint, style) = match popup {
        Popup::Confirm(question) => (" Confirm ", question.clone(), "[y] Yes  [n] No", Styles::popup()),
        Popup::Error(message) => (" Error ", message.clone(), "[Enter] OK", Styles::popup_danger()),
        Popup::Message(message) => (" Information ", message.clone(), "", Styles::popup()),
        Popup::SavePath(input) => (
            " Export Configuration ",
            format!("File name: {}_", input),
            "[Enter] Save  [Esc] Cancel",
            Styles::popup(),
        ),
    };

    let scaled = u32::from(area.width) * u32::from(UiConstants::POPUP_WIDTH_PCT) / 100;
    let width = u16::try_from(scaled)
        .unwrap_or(u16::MAX)
        .min(UiConstants::POPUP_MAX_WIDTH);
    let rect = centered_rect(area, width, UiConstants::POPUP_HEIGHT);
    f.render_widget(Clear, rect);

    let mut lines: Vec<Line> = body.lines().map(|l| Line::from(l.to_string())).collect();
    if !hint.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(hint, Styles::nav_hint())));
    }
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .style(style)
        .block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(widget, rect);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn view() -> ProposalView {
        let mut view = ProposalView::default();
        view.set_dialog(&DialogLayout {
            headline: "Installation Settings".to_string(),
            enable_back: true,
            enable_skip: true,
            tab_labels: vec!["Overview".to_string(), "Expert".to_string()],
            ..Default::default()
        });
        view.set_content("<h3><a href=\"keyboard\">Keyboard</a></h3><ul><li>English</li></ul>");
        view.menu = vec![MenuItem {
            label: "Reset to defaults".to_string(),
            action: UserAction::ResetToDefaults,
        }];
        view
    }

    #[test]
    fn test_selector_lists_links_then_menu() {
        let mut view = view();
        assert_eq!(view.handle_key(key(KeyCode::Enter)), Some(UserAction::Link("keyboard".to_string())));
        view.handle_key(key(KeyCode::Down));
        assert_eq!(view.handle_key(key(KeyCode::Enter)), Some(UserAction::ResetToDefaults));

        view.disabled.insert(Widget::Menu);
        assert_eq!(view.selectables().len(), 1);
    }

    #[test]
    fn test_navigation_keys() {
        let mut view = view();
        assert_eq!(view.handle_key(key(KeyCode::Tab)), Some(UserAction::Tab(1)));
        assert_eq!(view.handle_key(key(KeyCode::Tab)), Some(UserAction::Tab(0)));
        assert_eq!(view.handle_key(key(KeyCode::Char('n'))), Some(UserAction::Next));
        assert_eq!(view.handle_key(key(KeyCode::Char('b'))), Some(UserAction::Back));
        assert_eq!(view.handle_key(key(KeyCode::Char('s'))), Some(UserAction::Skip));
        assert_eq!(view.handle_key(key(KeyCode::Char('s'))), Some(UserAction::DontSkip));
        assert_eq!(
            view.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(UserAction::Cancel)
        );

        view.disabled.insert(Widget::Next);
        assert_eq!(view.handle_key(key(KeyCode::Char('n'))), None);
    }

    #[test]
    fn test_help_overlay_swallows_keys() {
        let mut view = view();
        assert_eq!(view.handle_key(key(KeyCode::Char('h'))), None);
        assert!(view.show_help);
        assert_eq!(view.handle_key(key(KeyCode::Char('n'))), None);
        view.handle_key(key(KeyCode::Esc));
        assert!(!view.show_help);
    }

    #[test]
    fn test_draw_on_test_backend() {
        let mut view = view();
        view.next_label = Some(NextLabel::Install);
        view.progress = Some(Progress { value: 1, max: 4 });
        view.popup = Some(Popup::Confirm("Start installation?".to_string()));

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| view.draw(f)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Installation Settings"));
        assert!(text.contains("[n] Install"));
        assert!(text.contains("Start installation?"));
    }
}
