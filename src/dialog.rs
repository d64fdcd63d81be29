//! Proposal dialog layout
//!
//! Derives the static part of the dialog (headline, icon, skip buttons,
//! tab bar) from the proposal type and the control file properties.

use crate::context::InstallContext;
use crate::control::ProposalProperties;
use crate::markup;
use crate::sink::DialogLayout;

/// Busy message shown before a submodule was ever proposed
pub const ANALYZING: &str = "Analyzing your system...";

/// Busy message shown when a submodule is proposed again
pub const ADAPTING: &str = "Adapting the proposal to the current settings...";

const DEFAULT_HEADLINE: &str = "Installation Overview";
const DEFAULT_ICON: &str = "yast-software";
const DEFAULT_TAB_LABEL: &str = "Tab";

pub fn headline(properties: &ProposalProperties) -> String {
    match properties.label.as_deref() {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => DEFAULT_HEADLINE.to_string(),
    }
}

pub fn icon(proposal_type: &str, properties: &ProposalProperties) -> String {
    match proposal_type {
        "network" => "yast-network".to_string(),
        "hardware" => "yast-controller".to_string(),
        _ => properties
            .icon
            .clone()
            .unwrap_or_else(|| DEFAULT_ICON.to_string()),
    }
}

/// Explicit `enable_skip` wins; otherwise only the installation proposals
/// go without the skip choice
pub fn skip_enabled(proposal_type: &str, properties: &ProposalProperties) -> bool {
    match properties.enable_skip.as_deref() {
        Some(value) => value == "yes",
        None => !matches!(proposal_type, "initial" | "uml"),
    }
}

pub fn tab_labels(properties: &ProposalProperties) -> Vec<String> {
    properties
        .proposal_tabs
        .iter()
        .flatten()
        .map(|tab| {
            tab.label
                .clone()
                .unwrap_or_else(|| DEFAULT_TAB_LABEL.to_string())
        })
        .collect()
}

/// Placeholder content while the first proposal is computed
pub fn initial_content() -> String {
    markup::newlines(3) + &markup::para(ANALYZING)
}

/// Complete layout of the proposal dialog
pub fn build_layout(
    context: &InstallContext,
    properties: &ProposalProperties,
    help: String,
    current_tab: usize,
) -> DialogLayout {
    DialogLayout {
        headline: headline(properties),
        icon: icon(&context.proposal_type, properties),
        help,
        enable_skip: skip_enabled(&context.proposal_type, properties),
        tab_labels: tab_labels(properties),
        current_tab,
        enable_back: context.enable_back,
        initial_content: initial_content(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ProposalTab;

    #[test]
    fn test_headline_and_icon_defaults() {
        let props = ProposalProperties::default();
        assert_eq!(headline(&props), "Installation Overview");
        assert_eq!(icon("initial", &props), "yast-software");
        assert_eq!(icon("network", &props), "yast-network");
        assert_eq!(icon("hardware", &props), "yast-controller");

        let props = ProposalProperties {
            label: Some("Installation Settings".to_string()),
            icon: Some("yast-update".to_string()),
            ..Default::default()
        };
        assert_eq!(headline(&props), "Installation Settings");
        assert_eq!(icon("initial", &props), "yast-update");
        assert_eq!(icon("network", &props), "yast-network");
    }

    #[test]
    fn test_skip_enabled() {
        let mut props = ProposalProperties::default();
        assert!(!skip_enabled("initial", &props));
        assert!(!skip_enabled("uml", &props));
        assert!(skip_enabled("network", &props));

        props.enable_skip = Some("yes".to_string());
        assert!(skip_enabled("initial", &props));
        props.enable_skip = Some("no".to_string());
        assert!(!skip_enabled("network", &props));
    }

    #[test]
    fn test_layout_with_tabs() {
        let props = ProposalProperties {
            proposal_tabs: Some(vec![
                ProposalTab {
                    label: Some("Overview".to_string()),
                    proposal_modules: vec!["software".to_string()],
                },
                ProposalTab::default(),
            ]),
            ..Default::default()
        };
        let layout = build_layout(&InstallContext::default(), &props, "help".to_string(), 1);
        assert_eq!(layout.tab_labels, ["Overview", "Tab"]);
        assert_eq!(layout.current_tab, 1);
        assert_eq!(layout.initial_content, "<br><br><br><p>Analyzing your system...</p>");
        assert!(layout.enable_back);
    }
}
