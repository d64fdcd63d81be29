//! Headless Render Sink
//!
//! `ScriptedSink` drives a proposal session without a terminal: user actions
//! come from a queue (an action script on the command line, or a test) and
//! everything the session pushes is recorded for inspection.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::sink::{
    Confirmation, DialogLayout, MenuItem, NextLabel, Progress, RenderSink, UserAction, Widget,
};

/// Render sink replaying a fixed sequence of user actions
#[derive(Debug, Default)]
pub struct ScriptedSink {
    actions: VecDeque<UserAction>,
    answers: VecDeque<bool>,
    save_paths: VecDeque<Option<PathBuf>>,
    missing_widgets: HashSet<Widget>,
    disabled_widgets: HashSet<Widget>,
    layers: usize,
    busy: bool,
    busy_transitions: usize,
    skip: bool,

    /// Every dialog layout pushed
    pub dialogs: Vec<DialogLayout>,
    /// Every document pushed, in order
    pub documents: Vec<String>,
    /// Every progress update, `None` for removal
    pub progress: Vec<Option<Progress>>,
    pub menu: Vec<MenuItem>,
    pub help: String,
    pub current_tab: usize,
    pub next_label: Option<NextLabel>,
    pub errors: Vec<String>,
    pub messages: Vec<String>,
    pub confirmations: Vec<Confirmation>,
    /// Actions handed to the session
    pub consumed: Vec<UserAction>,
}

impl ScriptedSink {
    /// Build from textual actions (see `UserAction::from_str`)
    pub fn new<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_actions(
            actions
                .into_iter()
                .filter_map(|a| a.as_ref().parse::<UserAction>().ok()),
        )
    }

    pub fn from_actions(actions: impl IntoIterator<Item = UserAction>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Parse an action script: one action per line, `#` starts a comment
    pub fn from_script(script: &str) -> Self {
        Self::new(
            script
                .lines()
                .map(|line| line.split('#').next().unwrap_or("").trim())
                .filter(|line| !line.is_empty()),
        )
    }

    /// Queue answers for confirmation popups; unanswered ones are "yes"
    pub fn with_answers(mut self, answers: impl IntoIterator<Item = bool>) -> Self {
        self.answers.extend(answers);
        self
    }

    /// Queue answers for the save-path prompt; unanswered ones cancel
    pub fn with_save_paths(mut self, paths: impl IntoIterator<Item = Option<PathBuf>>) -> Self {
        self.save_paths.extend(paths);
        self
    }

    /// Make a widget disappear, as a misbehaving submodule might
    pub fn remove_widget(&mut self, widget: Widget) {
        self.missing_widgets.insert(widget);
    }

    /// Simulate a submodule leaving a popup open
    pub fn open_layer(&mut self) {
        self.layers += 1;
    }

    pub fn open_layers(&self) -> usize {
        self.layers
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn busy_transitions(&self) -> usize {
        self.busy_transitions
    }

    pub fn is_enabled(&self, widget: Widget) -> bool {
        !self.disabled_widgets.contains(&widget)
    }

    /// Last document pushed
    pub fn content(&self) -> &str {
        self.documents.last().map(String::as_str).unwrap_or("")
    }
}

impl RenderSink for ScriptedSink {
    fn set_dialog(&mut self, dialog: &DialogLayout) {
        self.skip = false;
        self.current_tab = dialog.current_tab;
        self.help = dialog.help.clone();
        self.documents.push(dialog.initial_content.clone());
        self.dialogs.push(dialog.clone());
    }

    fn widget_exists(&self, widget: Widget) -> bool {
        if self.missing_widgets.contains(&widget) {
            return false;
        }
        let dialog = self.dialogs.last();
        match widget {
            Widget::Skip => dialog.is_some_and(|d| d.enable_skip),
            Widget::Tabs => dialog.is_some_and(|d| !d.tab_labels.is_empty()),
            _ => true,
        }
    }

    fn set_content(&mut self, markup: &str) {
        self.documents.push(markup.to_string());
    }

    fn set_enabled(&mut self, widget: Widget, enabled: bool) {
        if enabled {
            self.disabled_widgets.remove(&widget);
        } else {
            self.disabled_widgets.insert(widget);
        }
    }

    fn set_busy(&mut self, busy: bool) {
        if self.busy != busy {
            self.busy_transitions += 1;
        }
        self.busy = busy;
    }

    fn set_progress(&mut self, progress: Option<Progress>) {
        self.progress.push(progress);
    }

    fn set_menu(&mut self, items: &[MenuItem]) {
        self.menu = items.to_vec();
    }

    fn set_current_tab(&mut self, tab: usize) {
        self.current_tab = tab;
    }

    fn set_help(&mut self, help: &str) {
        self.help = help.to_string();
    }

    fn set_next_label(&mut self, label: NextLabel) {
        self.next_label = Some(label);
    }

    fn skip_selected(&self) -> bool {
        self.skip
    }

    fn close_leftover_layers(&mut self) -> usize {
        std::mem::take(&mut self.layers)
    }

    fn user_input(&mut self) -> UserAction {
        let action = self.actions.pop_front().unwrap_or_else(|| {
            debug!("Action script exhausted, cancelling");
            UserAction::Cancel
        });
        match action {
            UserAction::Skip => self.skip = true,
            UserAction::DontSkip => self.skip = false,
            _ => {}
        }
        self.consumed.push(action.clone());
        action
    }

    fn confirm(&mut self, confirmation: Confirmation) -> bool {
        self.confirmations.push(confirmation);
        let answer = self.answers.pop_front().unwrap_or(true);
        info!(%confirmation, answer, "Confirmation answered");
        answer
    }

    fn ask_save_path(&mut self) -> Option<PathBuf> {
        self.save_paths.pop_front().flatten()
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn show_timed_message(&mut self, message: &str, _seconds: u64) {
        self.messages.push(message.to_string());
    }
}
