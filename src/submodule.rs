//! Submodule proposal protocol
//!
//! Every configuration unit taking part in a proposal (partitioning,
//! network, software...) implements `ProposalClient`. Clients are
//! registered by name in a `SubmoduleSet`; the session addresses them only
//! through that name.
//!
//! # Contract
//!
//! - `describe()`: titles and ids; `Ok(None)` means not applicable here
//! - `make_proposal()`: compute and summarise the current settings
//! - `ask_user()`: run the submodule's own dialog
//! - `write()`: make the settings effective
//!
//! `Err` from any operation is a broken response. The gateway logs it and
//! substitutes an empty result so one broken submodule cannot take down the
//! proposal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{ProposalError, Result};
use crate::types::{Mode, Severity, WorkflowSequence};

/// Extra menu entry offered by a submodule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuTitle {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Result of `Description`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub rich_text_title: Option<String>,
    #[serde(default)]
    pub rich_text_raw_title: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub menu_title: Option<String>,
    #[serde(default)]
    pub menu_titles: Option<Vec<MenuTitle>>,
    #[serde(default)]
    pub help: Option<String>,
}

impl Description {
    /// A description without any field counts as "not applicable"
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Proposal heading, falling back to the submodule name
    pub fn title<'a>(&'a self, submodule: &'a str) -> &'a str {
        self.rich_text_title
            .as_deref()
            .or(self.rich_text_raw_title.as_deref())
            .unwrap_or(submodule)
    }
}

/// Request of `MakeProposal`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRequest {
    /// Discard any cached proposal and start from defaults
    pub force_reset: bool,
    /// Installation language changed since the last call
    pub language_changed: bool,
}

/// Result of `MakeProposal`. Replaced wholesale on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResult {
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub warning_level: Option<Severity>,
    #[serde(default)]
    pub preformatted_proposal: Option<String>,
    #[serde(default)]
    pub raw_proposal: Option<Vec<String>>,
    /// Hyperlink ids used inside the summary
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub language_changed: bool,
    #[serde(default)]
    pub mode_changed: bool,
    #[serde(default)]
    pub rootpart_changed: bool,
    #[serde(default)]
    pub help: Option<String>,
}

impl ProposalResult {
    /// Severity with `ok` for results that report none
    pub fn severity(&self) -> Severity {
        self.warning_level.unwrap_or_default()
    }
}

/// Request of `AskUser`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskUserRequest {
    /// Force a "next" button even if the submodule would otherwise rename it
    pub has_next: bool,
    /// Link or menu id the user picked, when different from the submodule id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_id: Option<String>,
}

/// Result of `AskUser`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskUserResult {
    #[serde(default)]
    pub workflow_sequence: WorkflowSequence,
    #[serde(default)]
    pub language_changed: bool,
    #[serde(default)]
    pub mode_changed: bool,
    /// Mode the user switched to, read when `mode_changed` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub rootpart_changed: bool,
}

/// Request of `Write`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequest {
    /// Write even if the submodule would normally skip it
    #[serde(default)]
    pub force: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<PathBuf>,
}

/// Result of `Write`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    #[serde(default = "default_success")]
    pub success: bool,
}

fn default_success() -> bool {
    true
}

impl Default for WriteResult {
    fn default() -> Self {
        Self { success: true }
    }
}

/// One participant in the proposal protocol
pub trait ProposalClient {
    fn describe(&mut self) -> Result<Option<Description>>;

    fn make_proposal(&mut self, request: &ProposalRequest) -> Result<ProposalResult>;

    fn ask_user(&mut self, request: &AskUserRequest) -> Result<AskUserResult>;

    fn write(&mut self, request: &WriteRequest) -> Result<WriteResult>;
}

/// Name -> client registry
#[derive(Default)]
pub struct SubmoduleSet {
    clients: BTreeMap<String, Box<dyn ProposalClient>>,
}

impl SubmoduleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, client: Box<dyn ProposalClient>) {
        self.clients.insert(name.into(), client);
    }

    /// Builder form of `register`
    pub fn with(mut self, name: impl Into<String>, client: Box<dyn ProposalClient>) -> Self {
        self.register(name, client);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clients.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Look up a client by name
    pub fn resolve(&mut self, name: &str) -> Result<&mut (dyn ProposalClient + 'static)> {
        match self.clients.get_mut(name) {
            Some(client) => Ok(client.as_mut()),
            None => Err(ProposalError::UnknownSubmodule(name.to_string())),
        }
    }
}

impl std::fmt::Debug for SubmoduleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmoduleSet")
            .field("clients", &self.clients.keys().collect::<Vec<_>>())
            .finish()
    }
}
