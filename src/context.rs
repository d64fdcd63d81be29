//! Installer context the proposal session runs in

use crate::control::ProposalKey;
use crate::types::{Mode, Stage};

/// Name of the submodule that stores the configuration as a profile
pub const DEFAULT_EXPORT_MODULE: &str = "clone_proposal";

/// Settings coming from an unattended installation profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnattendedSettings {
    /// Show the proposal even in unattended modes
    pub confirm: bool,
    /// Submodules the profile wants displayed; empty shows all
    pub proposal_list: Vec<String>,
}

/// Where and how the proposal is shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
    pub stage: Stage,
    pub mode: Mode,
    /// Proposal type, e.g. `initial` or `network`
    pub proposal_type: String,
    /// Whether the dialog offers a back button
    pub enable_back: bool,
    pub unattended: UnattendedSettings,
    /// Submodule invoked by the export action
    pub export_module: String,
}

impl Default for InstallContext {
    fn default() -> Self {
        Self {
            stage: Stage::Initial,
            mode: Mode::Installation,
            proposal_type: "initial".to_string(),
            enable_back: true,
            unattended: UnattendedSettings::default(),
            export_module: DEFAULT_EXPORT_MODULE.to_string(),
        }
    }
}

impl InstallContext {
    pub fn new(stage: Stage, mode: Mode, proposal_type: impl Into<String>) -> Self {
        Self {
            stage,
            mode,
            proposal_type: proposal_type.into(),
            ..Default::default()
        }
    }

    /// Key used to query the control source
    pub fn key(&self) -> ProposalKey {
        ProposalKey {
            stage: self.stage,
            mode: self.mode,
            proposal: self.proposal_type.clone(),
        }
    }

    /// Unattended runs bypass the dialog unless the profile asks to confirm
    pub fn skips_interaction(&self) -> bool {
        !self.unattended.confirm && self.mode.is_unattended()
    }

    /// The very first proposal of a fresh installation or update
    pub fn is_initial_proposal(&self) -> bool {
        self.stage == Stage::Initial && self.proposal_type == "initial"
    }
}
