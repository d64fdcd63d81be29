//! Product control data source
//!
//! The proposal registry asks a `ControlSource` which submodules make up a
//! proposal and how the proposal dialog is presented. `ProductControl` is the
//! file-backed implementation, loaded from a JSON control file.

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ProposalError, Result};
use crate::types::{Mode, Stage};

/// Every proposal submodule name ends with this suffix
pub const PROPOSAL_SUFFIX: &str = "_proposal";

/// Priority used for presentation ordering when a module declares none
pub const DEFAULT_PRIORITY: u32 = 50;

/// Append the `_proposal` suffix unless the name already carries it
pub fn normalize_module_name(name: &str) -> String {
    if name.contains(PROPOSAL_SUFFIX) {
        name.to_string()
    } else {
        format!("{}{}", name, PROPOSAL_SUFFIX)
    }
}

/// Identifies one proposal dialog: where it runs and which kind it is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalKey {
    pub stage: Stage,
    pub mode: Mode,
    /// Proposal type, e.g. `initial`, `network`, `hardware`
    pub proposal: String,
}

/// One submodule of a proposal with its presentation priority
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalEntry {
    pub name: String,
    pub priority: Option<u32>,
}

impl ProposalEntry {
    pub fn new(name: impl Into<String>, priority: Option<u32>) -> Self {
        Self {
            name: name.into(),
            priority,
        }
    }

    /// Priority with the default applied
    pub fn effective_priority(&self) -> u32 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }
}

/// A named group of submodules shown together
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalTab {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub proposal_modules: Vec<String>,
}

/// Presentation properties of a proposal dialog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalProperties {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
    /// `"yes"` or `"no"`; absent means the proposal type decides
    #[serde(default)]
    pub enable_skip: Option<String>,
    #[serde(default)]
    pub proposal_tabs: Option<Vec<ProposalTab>>,
}

/// Source of proposal configuration for the current stage and mode
pub trait ControlSource {
    /// Ordered submodules of the proposal. An empty list means the product
    /// defines no proposal here; `Err` means the configuration is unusable.
    fn proposals(&self, key: &ProposalKey) -> Result<Vec<ProposalEntry>>;

    /// Dialog properties of the proposal (label, help, tabs...)
    fn properties(&self, key: &ProposalKey) -> ProposalProperties;

    /// Submodules the administrator locked against changes
    fn locked_proposals(&self, key: &ProposalKey) -> Vec<String>;

    /// Proposal types that must not be shown at all
    fn disabled_proposals(&self) -> Vec<String>;
}

/// A module reference in the control file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleSpec {
    Name(String),
    Entry {
        name: String,
        #[serde(default)]
        presentation_order: Option<u32>,
    },
}

impl ModuleSpec {
    fn to_entry(&self) -> ProposalEntry {
        match self {
            Self::Name(name) => ProposalEntry::new(normalize_module_name(name), None),
            Self::Entry {
                name,
                presentation_order,
            } => ProposalEntry::new(normalize_module_name(name), *presentation_order),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Entry { name, .. } => name,
        }
    }
}

/// One proposal definition of the control file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDefinition {
    /// Proposal type this definition provides
    pub name: String,
    /// Comma separated list of stages
    pub stage: String,
    /// Comma separated list of modes
    pub mode: String,
    #[serde(default)]
    pub proposal_modules: Vec<ModuleSpec>,
    #[serde(default)]
    pub locked_modules: Vec<String>,
    #[serde(flatten)]
    pub properties: ProposalProperties,
}

impl ProposalDefinition {
    fn matches(&self, key: &ProposalKey) -> bool {
        let stage = key.stage.to_string();
        let mode = key.mode.to_string();
        self.name == key.proposal
            && self.stage.split(',').any(|s| s.trim() == stage)
            && self.mode.split(',').any(|m| m.trim() == mode)
    }
}

/// File-backed product control
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductControl {
    #[serde(default)]
    pub disabled_proposals: Vec<String>,
    #[serde(default)]
    pub proposals: Vec<ProposalDefinition>,
}

impl ProductControl {
    /// Load the control file from JSON
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read control file {:?}", path.as_ref()))?;

        let control: Self =
            serde_json::from_str(&content).context("Failed to parse control file JSON")?;

        Ok(control)
    }

    /// Check the control file for definitions the registry cannot use
    pub fn validate(&self) -> anyhow::Result<()> {
        for definition in &self.proposals {
            if definition.name.trim().is_empty() {
                bail!("Proposal definition without a name");
            }
            for stage in definition.stage.split(',') {
                stage
                    .trim()
                    .parse::<Stage>()
                    .with_context(|| format!("Proposal '{}': unknown stage '{}'", definition.name, stage))?;
            }
            for mode in definition.mode.split(',') {
                mode.trim()
                    .parse::<Mode>()
                    .with_context(|| format!("Proposal '{}': unknown mode '{}'", definition.name, mode))?;
            }
            if definition.proposal_modules.iter().any(|m| m.name().trim().is_empty()) {
                bail!("Proposal '{}': module with an empty name", definition.name);
            }
            if let Some(tabs) = &definition.properties.proposal_tabs {
                if tabs.is_empty() {
                    bail!("Proposal '{}': proposal_tabs is present but empty", definition.name);
                }
            }
            if let Some(skip) = &definition.properties.enable_skip {
                if skip != "yes" && skip != "no" {
                    bail!(
                        "Proposal '{}': enable_skip must be \"yes\" or \"no\", got \"{}\"",
                        definition.name,
                        skip
                    );
                }
            }
        }
        Ok(())
    }

    fn definition(&self, key: &ProposalKey) -> Result<Option<&ProposalDefinition>> {
        let mut matching = self.proposals.iter().filter(|d| d.matches(key));
        let first = matching.next();
        if matching.next().is_some() {
            return Err(ProposalError::config_load(format!(
                "ambiguous proposal definition '{}' for stage {} mode {}",
                key.proposal, key.stage, key.mode
            )));
        }
        Ok(first)
    }
}

impl ControlSource for ProductControl {
    fn proposals(&self, key: &ProposalKey) -> Result<Vec<ProposalEntry>> {
        Ok(self
            .definition(key)?
            .map(|d| d.proposal_modules.iter().map(ModuleSpec::to_entry).collect())
            .unwrap_or_default())
    }

    fn properties(&self, key: &ProposalKey) -> ProposalProperties {
        self.definition(key)
            .ok()
            .flatten()
            .map(|d| d.properties.clone())
            .unwrap_or_default()
    }

    fn locked_proposals(&self, key: &ProposalKey) -> Vec<String> {
        self.definition(key)
            .ok()
            .flatten()
            .map(|d| d.locked_modules.iter().map(|m| normalize_module_name(m)).collect())
            .unwrap_or_default()
    }

    fn disabled_proposals(&self) -> Vec<String> {
        self.disabled_proposals.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTROL: &str = r#"{
        "disabled_proposals": ["hardware"],
        "proposals": [
            {
                "name": "initial",
                "stage": "initial",
                "mode": "installation,autoinstallation",
                "label": "Installation Settings",
                "enable_skip": "no",
                "locked_modules": ["bootloader"],
                "proposal_modules": [
                    {"name": "partitions", "presentation_order": 10},
                    "software_proposal",
                    {"name": "bootloader", "presentation_order": 5}
                ]
            },
            {
                "name": "network",
                "stage": "continue,normal",
                "mode": "installation,normal",
                "proposal_modules": ["lan"]
            }
        ]
    }"#;

    fn key(stage: Stage, mode: Mode, proposal: &str) -> ProposalKey {
        ProposalKey {
            stage,
            mode,
            proposal: proposal.to_string(),
        }
    }

    #[test]
    fn test_normalize_module_name() {
        assert_eq!(normalize_module_name("lan"), "lan_proposal");
        assert_eq!(normalize_module_name("lan_proposal"), "lan_proposal");
    }

    #[test]
    fn test_proposals_match_stage_and_mode() {
        let control: ProductControl = serde_json::from_str(CONTROL).unwrap();
        let entries = control
            .proposals(&key(Stage::Initial, Mode::Autoinstallation, "initial"))
            .unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            ["partitions_proposal", "software_proposal", "bootloader_proposal"]
        );
        assert_eq!(entries[0].priority, Some(10));
        assert_eq!(entries[1].effective_priority(), DEFAULT_PRIORITY);

        let network = control
            .proposals(&key(Stage::Normal, Mode::Normal, "network"))
            .unwrap();
        assert_eq!(network, vec![ProposalEntry::new("lan_proposal", None)]);
    }

    #[test]
    fn test_unknown_proposal_is_empty() {
        let control: ProductControl = serde_json::from_str(CONTROL).unwrap();
        let entries = control
            .proposals(&key(Stage::Initial, Mode::Update, "initial"))
            .unwrap();
        assert!(entries.is_empty());
        assert_eq!(
            control.properties(&key(Stage::Initial, Mode::Update, "initial")),
            ProposalProperties::default()
        );
    }

    #[test]
    fn test_properties_and_locks() {
        let control: ProductControl = serde_json::from_str(CONTROL).unwrap();
        let k = key(Stage::Initial, Mode::Installation, "initial");
        let props = control.properties(&k);
        assert_eq!(props.label.as_deref(), Some("Installation Settings"));
        assert_eq!(props.enable_skip.as_deref(), Some("no"));
        assert!(props.proposal_tabs.is_none());
        assert_eq!(control.locked_proposals(&k), vec!["bootloader_proposal"]);
        assert_eq!(control.disabled_proposals(), vec!["hardware"]);
    }

    #[test]
    fn test_ambiguous_definition_is_load_error() {
        let mut control: ProductControl = serde_json::from_str(CONTROL).unwrap();
        let duplicate = control.proposals[0].clone();
        control.proposals.push(duplicate);
        let err = control
            .proposals(&key(Stage::Initial, Mode::Installation, "initial"))
            .unwrap_err();
        assert!(matches!(err, ProposalError::ConfigLoad(_)));
    }

    #[test]
    fn test_validate() {
        let control: ProductControl = serde_json::from_str(CONTROL).unwrap();
        assert!(control.validate().is_ok());

        let mut broken = control.clone();
        broken.proposals[1].stage = "initial,bogus".to_string();
        assert!(broken.validate().is_err());

        let mut broken = control;
        broken.proposals[0].properties.enable_skip = Some("maybe".to_string());
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control.json");
        fs::write(&path, CONTROL).unwrap();
        let control = ProductControl::load_from_file(&path).unwrap();
        assert_eq!(control.proposals.len(), 2);

        assert!(ProductControl::load_from_file(dir.path().join("missing.json")).is_err());
    }
}
