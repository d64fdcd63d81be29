//! Session Controller
//!
//! Owns every piece of mutable proposal state and runs the interactive
//! loop: one blocking `user_input()` per iteration, everything else
//! (submodule calls, registry reloads, re-rendering) runs to completion
//! before the next read.
//!
//! # Outcomes
//!
//! ```text
//! accept / next (committed)  -> next
//! cancel / abort (confirmed) -> abort
//! back                       -> back
//! finish (also from AskUser) -> finish
//! unattended or disabled     -> auto
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::aggregator::AggregateDocument;
use crate::context::InstallContext;
use crate::control::{ControlSource, ProposalProperties};
use crate::dialog;
use crate::error::{ProposalError, Result};
use crate::gateway::{Gateway, close_leftover_layers};
use crate::help;
use crate::markup;
use crate::registry::{self, RegistryQuery, SubmoduleLayout};
use crate::sink::{
    Confirmation, MenuItem, NextLabel, RenderSink, UserAction, Widget, display_proposal,
};
use crate::submodule::{AskUserRequest, Description, SubmoduleSet, WriteRequest};
use crate::types::{Stage, WorkflowSequence};

const SKIPPING: &str = "Skipping configuration upon user request";
const WRITE_ERRORS: &str = "Configuration saved.\nThere were errors.";

/// Interactive state accumulated across the loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub current_tab: usize,
    /// The user chose to skip the whole configuration
    pub skip_active: bool,
    /// Some proposed submodule reported a blocker or fatal severity
    pub blocker_present: bool,
    pub has_tabs: bool,
    /// Hyperlink id -> submodule, rebuilt on every aggregation pass
    pub link_to_submodule: BTreeMap<String, String>,
    /// Submodule -> stable id used for its heading link and menu entry
    pub submodule_ids: BTreeMap<String, String>,
    pub id_to_submodule: BTreeMap<String, String>,
    /// Submodules proposed at least once in this session
    pub already_proposed: BTreeSet<String>,
    /// Help texts returned by submodules visible in the current tab
    pub submodule_helps: BTreeMap<String, String>,
}

/// One run of the proposal dialog
pub struct ProposalSession<S: RenderSink> {
    pub(crate) context: InstallContext,
    pub(crate) control: Box<dyn ControlSource>,
    pub(crate) submodules: SubmoduleSet,
    pub(crate) sink: S,
    pub(crate) properties: ProposalProperties,
    pub(crate) layout: SubmoduleLayout,
    pub(crate) descriptions: BTreeMap<String, Description>,
    /// Submodules that described themselves as not applicable
    pub(crate) unavailable: HashSet<String>,
    pub(crate) document: AggregateDocument,
    pub(crate) state: SessionState,
}

impl<S: RenderSink> ProposalSession<S> {
    pub fn new(
        context: InstallContext,
        control: Box<dyn ControlSource>,
        submodules: SubmoduleSet,
        sink: S,
    ) -> Self {
        Self {
            context,
            control,
            submodules,
            sink,
            properties: ProposalProperties::default(),
            layout: SubmoduleLayout::default(),
            descriptions: BTreeMap::new(),
            unavailable: HashSet::new(),
            document: AggregateDocument::default(),
            state: SessionState::default(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn layout(&self) -> &SubmoduleLayout {
        &self.layout
    }

    pub fn document(&self) -> &AggregateDocument {
        &self.document
    }

    pub fn context(&self) -> &InstallContext {
        &self.context
    }

    /// Run the dialog until it reaches a terminal outcome
    pub fn run(&mut self) -> WorkflowSequence {
        if self.context.skips_interaction() {
            info!("Unattended mode without confirmation, skipping proposal");
            return WorkflowSequence::Auto;
        }

        if self
            .control
            .disabled_proposals()
            .contains(&self.context.proposal_type)
        {
            info!(proposal = %self.context.proposal_type, "Proposal disabled");
            return WorkflowSequence::Auto;
        }

        self.properties = self.control.properties(&self.context.key());
        self.build_dialog();

        if let Err(e) = self.reload_submodules() {
            error!("{}", e);
            return WorkflowSequence::Abort;
        }

        self.sink.set_enabled(Widget::Proposal, false);
        self.sink.set_enabled(Widget::Next, true);
        self.sink.set_enabled(Widget::Abort, true);

        if !self.describe_submodules_and_build_menu() {
            info!("No submodule available, skipping proposal");
            return WorkflowSequence::Auto;
        }

        if let Err(e) = self.make_proposal(false, false) {
            error!("{}", e);
            return WorkflowSequence::Abort;
        }

        self.sink.focus_next();

        loop {
            self.sink.set_enabled(Widget::Proposal, true);
            // A submodule may have relabelled it while it was called
            self.update_next_button();

            let action = self.sink.user_input();
            info!(%action, "Proposal - UserInput");
            self.sink.set_enabled(Widget::Proposal, false);

            match self.handle_action(action) {
                Ok(Some(sequence)) => {
                    info!(%sequence, "Leaving proposal");
                    return sequence;
                }
                Ok(None) => {}
                Err(e) if e.is_fatal() => {
                    error!("{}", e);
                    return WorkflowSequence::Abort;
                }
                Err(e) => {
                    error!("{}", e);
                    self.sink.show_error(&e.to_string());
                }
            }
        }
    }

    /// Dispatch one user action; `Some` ends the session
    pub fn handle_action(&mut self, action: UserAction) -> Result<Option<WorkflowSequence>> {
        match action {
            UserAction::Accept => Ok(Some(WorkflowSequence::Next)),
            UserAction::Cancel => Ok(Some(WorkflowSequence::Abort)),
            UserAction::Tab(tab) => {
                if self.state.has_tabs {
                    self.switch_tab(tab)?;
                } else {
                    debug!(tab, "Proposal has no tabs, ignoring tab switch");
                }
                Ok(None)
            }
            UserAction::Link(id) => self.activate_link(&id),
            UserAction::Finish => Ok(Some(WorkflowSequence::Finish)),
            UserAction::Abort => {
                let question = if self.context.stage == Stage::Initial {
                    Confirmation::AbortPainless
                } else {
                    Confirmation::AbortIncomplete
                };
                Ok(self
                    .sink
                    .confirm(question)
                    .then_some(WorkflowSequence::Abort))
            }
            UserAction::ResetToDefaults => {
                if self.sink.confirm(Confirmation::ResetToDefaults) {
                    self.make_proposal(true, false)?;
                }
                Ok(None)
            }
            UserAction::ExportConfig => {
                if let Some(path) = self.sink.ask_save_path() {
                    self.export_config(path)?;
                }
                Ok(None)
            }
            UserAction::Skip | UserAction::DontSkip => {
                self.toggle_skip()?;
                Ok(None)
            }
            UserAction::Next => self.commit(),
            UserAction::Back => {
                if self.context.stage == Stage::Initial {
                    self.sink.set_next_label(NextLabel::Next);
                }
                Ok(Some(WorkflowSequence::Back))
            }
            UserAction::Other(other) => {
                debug!(action = %other, "Ignoring unrecognized action");
                Ok(None)
            }
        }
    }

    pub(crate) fn gateway(&mut self) -> Gateway<'_> {
        Gateway::new(&mut self.submodules, &mut self.sink)
    }

    /// Submodules the user may open: neither locked nor display-only
    pub fn is_interactive(&self, submodule: &str) -> bool {
        !self.layout.is_locked(submodule) && !self.layout.is_display_only(submodule)
    }

    pub(crate) fn help_text(&self) -> String {
        let helps = self
            .layout
            .presentation
            .iter()
            .filter_map(|m| self.state.submodule_helps.get(m).map(String::as_str));
        help::help_text(
            &self.context.proposal_type,
            self.context.mode,
            &self.properties,
            !self.control.locked_proposals(&self.context.key()).is_empty(),
            helps,
        )
    }

    pub(crate) fn build_dialog(&mut self) {
        let layout = dialog::build_layout(
            &self.context,
            &self.properties,
            self.help_text(),
            self.state.current_tab,
        );
        self.state.has_tabs = self.properties.proposal_tabs.is_some();
        info!(headline = %layout.headline, "Building proposal dialog");
        self.sink.set_dialog(&layout);
    }

    /// Rebuild the dialog after a language change
    pub(crate) fn retranslate_dialog(&mut self) {
        debug!("Retranslating proposal dialog");
        self.build_dialog();
        self.describe_submodules_and_build_menu();
    }

    /// Reload orders and sets from the control source for the current tab
    pub(crate) fn reload_submodules(&mut self) -> Result<()> {
        let key = self.context.key();
        let mut layout = registry::load(
            self.control.as_ref(),
            &RegistryQuery {
                key: &key,
                current_tab: self.state.current_tab,
                allow_list: &self.context.unattended.proposal_list,
            },
        )?;
        layout.remove_unavailable(&self.unavailable);
        self.properties = self.control.properties(&key);
        self.state.has_tabs = layout.has_tabs;
        self.layout = layout;
        Ok(())
    }

    /// Describe every submodule, drop the inapplicable ones for good and
    /// rebuild the change menu. Returns whether any submodule is left.
    pub(crate) fn describe_submodules_and_build_menu(&mut self) -> bool {
        let mut available = Vec::new();
        let mut descriptions = BTreeMap::new();
        let mut submodule_ids = BTreeMap::new();
        let mut id_to_submodule = BTreeMap::new();

        for submodule in self.layout.execution.clone() {
            match self.gateway().describe(&submodule) {
                Some(description) => {
                    let id = description
                        .id
                        .clone()
                        .unwrap_or_else(|| format!("module_{}", available.len() + 1));
                    submodule_ids.insert(submodule.clone(), id.clone());
                    id_to_submodule.insert(id, submodule.clone());
                    descriptions.insert(submodule.clone(), description);
                    available.push(submodule);
                }
                None => {
                    self.unavailable.insert(submodule);
                }
            }
        }

        self.layout.remove_unavailable(&self.unavailable);
        self.layout.execution = available;
        info!("Execution order after rewrite: {:?}", self.layout.execution);

        self.descriptions = descriptions;
        self.state.submodule_ids = submodule_ids;
        self.state.id_to_submodule = id_to_submodule;

        let menu = self.menu_items();
        self.sink.set_menu(&menu);

        !self.layout.execution.is_empty()
    }

    fn menu_items(&self) -> Vec<MenuItem> {
        let mut items = Vec::new();

        for submodule in &self.layout.presentation {
            let Some(description) = self.descriptions.get(submodule) else {
                continue;
            };
            if !self.is_interactive(submodule) {
                continue;
            }

            match &description.menu_titles {
                Some(titles) => {
                    for entry in titles {
                        match (&entry.id, &entry.title) {
                            (Some(id), Some(title)) => items.push(MenuItem {
                                label: format!("{}...", title),
                                action: UserAction::Link(id.clone()),
                            }),
                            _ => info!("Invalid menu item: {:?}", entry),
                        }
                    }
                }
                None => {
                    let title = description
                        .menu_title
                        .as_deref()
                        .or(description.rich_text_title.as_deref())
                        .unwrap_or(submodule);
                    let id = self
                        .state
                        .submodule_ids
                        .get(submodule)
                        .cloned()
                        .unwrap_or_default();
                    items.push(MenuItem {
                        label: format!("{}...", title),
                        action: UserAction::Link(id),
                    });
                }
            }
        }

        items.push(MenuItem {
            label: "Reset to defaults".to_string(),
            action: UserAction::ResetToDefaults,
        });
        items.push(MenuItem {
            label: "Export Configuration".to_string(),
            action: UserAction::ExportConfig,
        });
        items
    }

    /// Make `tab` the visible tab and redisplay its part of the document
    pub(crate) fn switch_tab(&mut self, tab: usize) -> Result<()> {
        self.state.current_tab = tab;
        self.reload_submodules()?;

        let proposal = if self.state.skip_active {
            skipped_message()
        } else {
            self.document.render(&self.layout.presentation)
        };
        display_proposal(&mut self.sink, &proposal);
        self.describe_submodules_and_build_menu();
        if self.state.skip_active {
            self.sink.set_enabled(Widget::Menu, false);
        }

        if self.sink.widget_exists(Widget::Tabs) {
            self.sink.set_current_tab(tab);
        } else {
            warn!("Widget `tabs` does not exist");
        }
        Ok(())
    }

    fn update_next_button(&mut self) {
        if self.context.is_initial_proposal() {
            let label = if self.context.mode.is_update() {
                NextLabel::Update
            } else {
                NextLabel::Install
            };
            self.sink.set_next_label(label);
        }
    }

    /// Resolve a hyperlink or menu id and run that submodule's dialog
    fn activate_link(&mut self, input: &str) -> Result<Option<WorkflowSequence>> {
        let submodule = self
            .state
            .id_to_submodule
            .get(input)
            .or_else(|| self.state.link_to_submodule.get(input))
            .cloned();

        if self.state.skip_active {
            debug!(link = input, "Configuration skipped, ignoring link");
            return Ok(None);
        }

        let Some(submodule) = submodule else {
            debug!(link = input, "No submodule for link");
            return Ok(None);
        };

        if !self.is_interactive(&submodule) {
            warn!(%submodule, "Submodule is locked or display-only, not opening it");
            return Ok(None);
        }

        let request = AskUserRequest {
            has_next: false,
            chosen_id: (submodule != input).then(|| input.to_string()),
        };

        let result = self.gateway().ask_user(&submodule, &request);

        if !result.workflow_sequence.leaves_dialog() {
            if result.language_changed {
                info!(%submodule, "Installation language changed");
                self.retranslate_dialog();
            }

            if result.mode_changed {
                if let Some(mode) = result.mode {
                    info!(%submodule, from = %self.context.mode, to = %mode, "Installation mode changed");
                    self.context.mode = mode;
                } else {
                    info!(%submodule, "Installation mode changed");
                }
                self.reload_submodules()?;
                self.build_dialog();
                if !self.describe_submodules_and_build_menu() {
                    error!("No submodule available after mode change");
                }
            }

            if result.rootpart_changed {
                debug!(%submodule, "Root partition changed");
            }

            self.make_proposal(false, result.language_changed)?;
        }

        close_leftover_layers(&mut self.sink, &submodule);

        if result.workflow_sequence == WorkflowSequence::Finish {
            return Ok(Some(WorkflowSequence::Finish));
        }
        Ok(None)
    }

    fn toggle_skip(&mut self) -> Result<()> {
        if self.sink.skip_selected() {
            info!("User skips the configuration");
            self.state.skip_active = true;
            display_proposal(&mut self.sink, &skipped_message());
            self.sink.set_enabled(Widget::Menu, false);
        } else {
            info!("User wants the configuration back");
            self.state.skip_active = false;
            self.make_proposal(false, false)?;
            self.sink.set_enabled(Widget::Menu, true);
        }
        Ok(())
    }

    /// Export the configuration through the export submodule
    fn export_config(&mut self, path: PathBuf) -> Result<()> {
        let module = self.context.export_module.clone();
        let request = WriteRequest {
            force: true,
            target_path: Some(path.clone()),
        };
        self.gateway().write(&module, &request);

        if !path.exists() {
            return Err(ProposalError::Export { path });
        }
        info!("Configuration exported to {}", path.display());
        Ok(())
    }

    /// Handle `next`: refuse on blockers, confirm, write, leave
    fn commit(&mut self) -> Result<Option<WorkflowSequence>> {
        let skip =
            self.sink.widget_exists(Widget::Skip) && self.sink.skip_selected();

        if self.state.blocker_present && !skip {
            return Err(ProposalError::BlockingProposal);
        }

        if self.context.stage == Stage::Initial {
            if !self.sink.confirm(Confirmation::StartInstallation) {
                info!("Installation not confirmed, staying in proposal");
                return Ok(None);
            }
        } else if self.context.stage == Stage::Normal
            && self.context.mode.is_update()
            && !self.sink.confirm(Confirmation::StartUpdate)
        {
            info!("Update not confirmed, returning back...");
            return Ok(None);
        }

        if !skip {
            self.write_settings();
        }
        Ok(Some(WorkflowSequence::Next))
    }

    /// Call `Write` on every submodule; failures are reported once
    pub fn write_settings(&mut self) -> bool {
        let mut success = true;

        for submodule in self.layout.execution.clone() {
            let written = self.gateway().write(&submodule, &WriteRequest::default());
            if !written {
                error!("Write() failed for submodule {}", submodule);
            }
            success &= written;
        }

        if !success {
            error!("Write() failed for one or more submodules");
            self.sink.show_timed_message(WRITE_ERRORS, 3);
        }
        success
    }
}

fn skipped_message() -> String {
    markup::newlines(3) + &markup::para(SKIPPING)
}
