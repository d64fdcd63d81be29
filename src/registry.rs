//! Proposal Registry
//!
//! Turns the control source's module list into the two orders the session
//! works with:
//!
//! - **execution order**: the sequence submodules are proposed in
//! - **presentation order**: the sequence their summaries are displayed in
//!
//! With tabs, presentation order is the active tab's module list and every
//! module remembers the lowest-indexed tab that shows it. Without tabs,
//! presentation order is the module list stable-sorted by priority.

use std::collections::{BTreeMap, HashSet};
use tracing::{error, info};

use crate::control::{ControlSource, ProposalEntry, ProposalKey, normalize_module_name};
use crate::error::{ProposalError, Result};

/// Submodule that switches between installation and update
pub const MODE_PROPOSAL: &str = "mode_proposal";

/// Parameters of one registry load
#[derive(Debug, Clone, Copy)]
pub struct RegistryQuery<'a> {
    pub key: &'a ProposalKey,
    /// Active tab, ignored when the proposal has no tabs
    pub current_tab: usize,
    /// Allow-list from an unattended profile; empty disables filtering
    pub allow_list: &'a [String],
}

/// Submodule orders and sets computed for one tab configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmoduleLayout {
    pub execution: Vec<String>,
    pub presentation: Vec<String>,
    pub locked: Vec<String>,
    /// Modules shown in a tab without being part of the proposal's module list
    pub display_only: Vec<String>,
    /// Module -> lowest tab index showing it
    pub tab_assignment: BTreeMap<String, usize>,
    /// Modules shown in any tab, after the allow-list
    pub displayed: Vec<String>,
    pub has_tabs: bool,
}

impl SubmoduleLayout {
    pub fn is_locked(&self, submodule: &str) -> bool {
        self.locked.iter().any(|m| m == submodule)
    }

    pub fn is_display_only(&self, submodule: &str) -> bool {
        self.display_only.iter().any(|m| m == submodule)
    }

    pub fn is_displayed(&self, submodule: &str) -> bool {
        self.displayed.iter().any(|m| m == submodule)
    }

    pub fn tab_of(&self, submodule: &str) -> Option<usize> {
        self.tab_assignment.get(submodule).copied()
    }

    /// Drop submodules that reported themselves as not applicable
    pub fn remove_unavailable(&mut self, unavailable: &HashSet<String>) {
        if unavailable.is_empty() {
            return;
        }
        self.execution.retain(|m| !unavailable.contains(m));
        self.presentation.retain(|m| !unavailable.contains(m));
        self.display_only.retain(|m| !unavailable.contains(m));
        self.displayed.retain(|m| !unavailable.contains(m));
    }
}

/// Load the submodule layout for the given stage, mode, proposal type and tab.
///
/// # Failure Modes
///
/// - The control source errors: `ConfigLoad`
/// - The control source has no modules: `NoProposalsAvailable`
pub fn load(source: &dyn ControlSource, query: &RegistryQuery<'_>) -> Result<SubmoduleLayout> {
    let key = query.key;
    let mut entries = source.proposals(key).map_err(|e| {
        error!("Error loading proposals: {}", e);
        e
    })?;

    info!(
        stage = %key.stage,
        mode = %key.mode,
        proposal = %key.proposal,
        "Getting proposals"
    );

    if entries.is_empty() {
        error!("No proposals available");
        return Err(ProposalError::NoProposalsAvailable {
            stage: key.stage.to_string(),
            mode: key.mode.to_string(),
            proposal: key.proposal.clone(),
        });
    }

    // In normal mode there is no switching between installation and update
    let normal_mode = key.mode.is_normal();
    if normal_mode {
        entries.retain(|e| e.name != MODE_PROPOSAL);
    }

    let mut layout = SubmoduleLayout {
        execution: entries.iter().map(|e| e.name.clone()).collect(),
        locked: source.locked_proposals(key),
        ..Default::default()
    };

    let properties = source.properties(key);
    match properties.proposal_tabs {
        Some(tabs) => {
            info!("Proposal uses tabs");
            layout.has_tabs = true;

            let tab_modules: Vec<Vec<String>> = tabs
                .iter()
                .map(|tab| {
                    tab.proposal_modules
                        .iter()
                        .map(|m| normalize_module_name(m))
                        .filter(|m| !(normal_mode && m == MODE_PROPOSAL))
                        .collect()
                })
                .collect();

            for (index, modules) in tab_modules.iter().enumerate() {
                for module in modules {
                    layout.tab_assignment.entry(module.clone()).or_insert(index);
                }
            }

            for module in tab_modules.iter().flatten() {
                if !layout.execution.contains(module) && !layout.display_only.contains(module) {
                    layout.display_only.push(module.clone());
                }
            }
            layout.execution.extend(layout.display_only.iter().cloned());

            let mut shown: Vec<String> = Vec::new();
            for module in tab_modules.iter().flatten() {
                if !shown.contains(module) {
                    shown.push(module.clone());
                }
            }
            layout.displayed = filter_allowed(shown, query.allow_list);

            let active = tab_modules.get(query.current_tab).cloned().unwrap_or_default();
            layout.presentation = filter_allowed(active, query.allow_list);
        }
        None => {
            info!("Proposal doesn't use tabs");
            layout.presentation = filter_allowed(presentation_order(&entries), query.allow_list);
            layout.displayed = layout.presentation.clone();
        }
    }

    info!("Presentation order: {:?}", layout.presentation);
    info!("Execution order: {:?}", layout.execution);

    Ok(layout)
}

/// Module names stable-sorted by ascending priority
pub fn presentation_order(entries: &[ProposalEntry]) -> Vec<String> {
    let mut sorted: Vec<&ProposalEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.effective_priority());
    sorted.into_iter().map(|e| e.name.clone()).collect()
}

/// Intersect with the allow-list, keeping the given order; an empty
/// allow-list keeps everything
pub fn filter_allowed(modules: Vec<String>, allow_list: &[String]) -> Vec<String> {
    if allow_list.is_empty() {
        return modules;
    }
    modules
        .into_iter()
        .filter(|m| allow_list.contains(m))
        .collect()
}
