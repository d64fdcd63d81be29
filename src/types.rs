//! Type-safe values shared by the proposal engine
//!
//! Installer stage and mode, warning severities reported by submodules and
//! the workflow sequences passed between dialogs.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Installer stage the proposal runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    /// First stage, running from the installation media
    #[default]
    Initial,
    /// Second stage, running in the freshly installed system
    Continue,
    Firstboot,
    /// Running system
    Normal,
}

/// Installer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    #[default]
    Installation,
    Update,
    Normal,
    Autoinstallation,
    Autoupgrade,
    Repair,
}

impl Mode {
    /// New installation, interactive or automated
    pub fn is_installation(self) -> bool {
        matches!(self, Self::Installation | Self::Autoinstallation)
    }

    /// Update of an installed system, interactive or automated
    pub fn is_update(self) -> bool {
        matches!(self, Self::Update | Self::Autoupgrade)
    }

    /// Configuration of an already running system
    pub fn is_normal(self) -> bool {
        matches!(self, Self::Normal)
    }

    /// Unattended modes driven by a profile
    pub fn is_unattended(self) -> bool {
        matches!(self, Self::Autoinstallation | Self::Autoupgrade)
    }
}

/// Warning level attached to a submodule proposal.
///
/// Variants are declared in increasing order of seriousness so `Ord`
/// compares them by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    #[default]
    Ok,
    Notice,
    Warning,
    Error,
    Blocker,
    Fatal,
}

impl Severity {
    /// Severities that pull the affected submodule's tab into view
    pub fn forces_tab_switch(self) -> bool {
        matches!(self, Self::Error | Self::Blocker | Self::Fatal)
    }

    /// Severities that refuse committing the proposal
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Blocker | Self::Fatal)
    }

    /// Severities after which no further submodule is proposed in a pass
    pub fn stops_proposal(self) -> bool {
        matches!(self, Self::Fatal)
    }
}

/// Workflow result returned by dialogs and by the proposal session itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WorkflowSequence {
    #[default]
    Next,
    Back,
    Abort,
    Cancel,
    Finish,
    /// Dialog was skipped without user interaction
    Auto,
}

impl WorkflowSequence {
    /// Sequences that leave the calling dialog instead of continuing in it
    pub fn leaves_dialog(self) -> bool {
        matches!(self, Self::Cancel | Self::Back | Self::Abort | Self::Finish)
    }
}
