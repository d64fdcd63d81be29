//! Render Sink contract
//!
//! The display technology is external to the proposal engine. The session
//! only pushes finished markup and widget state into a `RenderSink` and
//! blocks on `user_input()` for the next discrete action.
//!
//! Implementations:
//! - `ui::TerminalSink`: interactive ratatui screen
//! - `headless::ScriptedSink`: replays actions, records everything

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use strum::Display;
use tracing::error;

use crate::error::ProposalError;

/// Widgets of the proposal dialog the core refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Widget {
    /// Rich text area holding the proposal document
    Proposal,
    /// Change menu with submodule entries
    Menu,
    /// Skip / use-configuration radio buttons
    Skip,
    Tabs,
    Next,
    Abort,
    Progress,
}

/// One discrete user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Accept,
    Cancel,
    /// Tab switch to the given index
    Tab(usize),
    /// Hyperlink or menu item id
    Link(String),
    Finish,
    Abort,
    ResetToDefaults,
    ExportConfig,
    Skip,
    DontSkip,
    Next,
    Back,
    /// Anything the session does not handle
    Other(String),
}

impl FromStr for UserAction {
    type Err = std::convert::Infallible;

    /// Textual form used by action scripts: keywords, `tab:N` (or a bare
    /// number) and `link:ID`. Unknown words become `Other`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(tab) = s.parse::<usize>() {
            return Ok(Self::Tab(tab));
        }
        if let Some(tab) = s.strip_prefix("tab:").and_then(|t| t.parse().ok()) {
            return Ok(Self::Tab(tab));
        }
        if let Some(id) = s.strip_prefix("link:") {
            return Ok(Self::Link(id.to_string()));
        }
        Ok(match s {
            "accept" => Self::Accept,
            "cancel" => Self::Cancel,
            "finish" => Self::Finish,
            "abort" => Self::Abort,
            "reset" | "reset_to_defaults" => Self::ResetToDefaults,
            "export" | "export_config" => Self::ExportConfig,
            "skip" => Self::Skip,
            "dontskip" => Self::DontSkip,
            "next" => Self::Next,
            "back" => Self::Back,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Cancel => write!(f, "cancel"),
            Self::Tab(tab) => write!(f, "tab:{}", tab),
            Self::Link(id) => write!(f, "link:{}", id),
            Self::Finish => write!(f, "finish"),
            Self::Abort => write!(f, "abort"),
            Self::ResetToDefaults => write!(f, "reset_to_defaults"),
            Self::ExportConfig => write!(f, "export_config"),
            Self::Skip => write!(f, "skip"),
            Self::DontSkip => write!(f, "dontskip"),
            Self::Next => write!(f, "next"),
            Self::Back => write!(f, "back"),
            Self::Other(other) => write!(f, "{}", other),
        }
    }
}

/// Entry of the change menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    /// Action reported when the entry is chosen
    pub action: UserAction,
}

/// Progress counter shown while proposing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub value: usize,
    pub max: usize,
}

/// Questions the session needs a yes/no answer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Confirmation {
    /// Abort before anything was changed on disk
    AbortPainless,
    /// Abort leaving the system partially configured
    AbortIncomplete,
    ResetToDefaults,
    /// Final "start installation" step of the first stage
    StartInstallation,
    /// Update of the running system
    StartUpdate,
}

impl Confirmation {
    pub fn question(self) -> &'static str {
        match self {
            Self::AbortPainless => {
                "Really abort the installation?\nNothing has been changed on your system yet."
            }
            Self::AbortIncomplete => {
                "Really abort?\nThe system may be left in an incomplete configuration."
            }
            Self::ResetToDefaults => {
                "Really reset everything to default values?\nYou will lose all changes."
            }
            Self::StartInstallation => "Start the installation with the settings displayed?",
            Self::StartUpdate => "Start the update of the running system?",
        }
    }
}

/// Label of the next button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum NextLabel {
    Next,
    Install,
    Update,
}

/// Static layout of the proposal dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogLayout {
    pub headline: String,
    pub icon: String,
    pub help: String,
    /// Offer the skip / use-configuration choice
    pub enable_skip: bool,
    /// Tab labels; empty for an untabbed proposal
    pub tab_labels: Vec<String>,
    pub current_tab: usize,
    pub enable_back: bool,
    /// Content of the proposal area until the first document arrives
    pub initial_content: String,
}

/// Display technology driven by the proposal session
pub trait RenderSink {
    /// Replace the whole dialog
    fn set_dialog(&mut self, dialog: &DialogLayout);

    fn widget_exists(&self, widget: Widget) -> bool;

    /// Replace the proposal document
    fn set_content(&mut self, markup: &str);

    fn set_enabled(&mut self, widget: Widget, enabled: bool);

    /// Busy cursor while a submodule works
    fn set_busy(&mut self, busy: bool);

    /// Show, update or (with `None`) remove the progress counter
    fn set_progress(&mut self, progress: Option<Progress>);

    fn set_menu(&mut self, items: &[MenuItem]);

    fn set_current_tab(&mut self, tab: usize);

    fn set_help(&mut self, help: &str);

    fn set_next_label(&mut self, label: NextLabel);

    fn focus_next(&mut self) {}

    /// Current value of the skip radio button
    fn skip_selected(&self) -> bool;

    /// Close modal layers a submodule left open, returning how many
    fn close_leftover_layers(&mut self) -> usize {
        0
    }

    /// Block until the user does something
    fn user_input(&mut self) -> UserAction;

    fn confirm(&mut self, confirmation: Confirmation) -> bool;

    /// Ask for the destination of an exported configuration
    fn ask_save_path(&mut self) -> Option<PathBuf>;

    fn show_error(&mut self, message: &str);

    fn show_timed_message(&mut self, message: &str, seconds: u64);
}

/// Push a document into the proposal widget, degrading to a logged no-op
/// when the widget is gone
pub fn display_proposal(sink: &mut dyn RenderSink, markup: &str) {
    if sink.widget_exists(Widget::Proposal) {
        sink.set_content(markup);
    } else {
        error!("{}", ProposalError::RenderTargetMissing(Widget::Proposal.to_string()));
    }
}
