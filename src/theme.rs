//! Colors and styles of the terminal proposal dialog
//!
//! All colors live here rather than in the widgets.

use ratatui::style::{Color, Modifier, Style};

pub struct Colors;

impl Colors {
    pub const BG_PRIMARY: Color = Color::Rgb(20, 20, 30);
    pub const BG_POPUP: Color = Color::Rgb(30, 30, 40);
    pub const BG_DANGER: Color = Color::Rgb(30, 20, 20);
    pub const BG_GAUGE: Color = Color::Rgb(40, 40, 50);

    pub const FG_PRIMARY: Color = Color::White;
    pub const FG_SECONDARY: Color = Color::Gray;
    pub const FG_MUTED: Color = Color::DarkGray;

    /// Borders, headings, active tab
    pub const PRIMARY: Color = Color::Cyan;
    /// Selected entries
    pub const SECONDARY: Color = Color::Yellow;

    pub const SUCCESS: Color = Color::Green;
    pub const ERROR: Color = Color::Red;
    pub const INFO: Color = Color::Blue;

    pub const LINK: Color = Color::LightCyan;
    pub const PROGRESS: Color = Color::Green;
}

pub struct Styles;

impl Styles {
    pub fn text() -> Style {
        Style::default().fg(Colors::FG_PRIMARY)
    }

    pub fn text_muted() -> Style {
        Style::default().fg(Colors::FG_MUTED)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Colors::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn heading() -> Style {
        Style::default()
            .fg(Colors::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn link() -> Style {
        Style::default()
            .fg(Colors::LINK)
            .add_modifier(Modifier::UNDERLINED)
    }

    pub fn border_active() -> Style {
        Style::default().fg(Colors::PRIMARY)
    }

    pub fn border_inactive() -> Style {
        Style::default().fg(Colors::FG_MUTED)
    }

    pub fn selected() -> Style {
        Style::default()
            .bg(Colors::SECONDARY)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default().fg(Colors::ERROR)
    }

    pub fn progress() -> Style {
        Style::default().fg(Colors::PROGRESS).bg(Colors::BG_GAUGE)
    }

    pub fn nav_hint() -> Style {
        Style::default().fg(Colors::FG_SECONDARY)
    }

    pub fn popup() -> Style {
        Style::default().bg(Colors::BG_POPUP).fg(Colors::FG_PRIMARY)
    }

    pub fn popup_danger() -> Style {
        Style::default().bg(Colors::BG_DANGER).fg(Colors::FG_PRIMARY)
    }
}

/// Map a markup color name to a terminal color
pub fn markup_color(name: &str) -> Color {
    match name.to_ascii_lowercase().as_str() {
        "red" => Colors::ERROR,
        "green" => Colors::SUCCESS,
        "blue" => Colors::INFO,
        "yellow" => Colors::SECONDARY,
        "gray" | "grey" => Colors::FG_SECONDARY,
        _ => Colors::FG_PRIMARY,
    }
}

pub struct UiConstants;

impl UiConstants {
    pub const POPUP_WIDTH_PCT: u16 = 60;
    pub const POPUP_MAX_WIDTH: u16 = 80;
    pub const POPUP_HEIGHT: u16 = 9;
    pub const MENU_WIDTH_PCT: u16 = 30;
    pub const PAGE_SCROLL_SIZE: u16 = 10;
}
