//! Proposal Aggregator
//!
//! Walks the execution order, asks every submodule for its proposal and
//! assembles the summaries into one markup document shown in presentation
//! order. The document is redisplayed after every submodule so the user
//! sees the proposal fill in.
//!
//! A submodule that reports a language change restarts the walk. The
//! number of restarts is bounded; the last pass ignores further language
//! changes so a misbehaving submodule cannot loop forever.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::dialog::{ADAPTING, ANALYZING};
use crate::error::Result;
use crate::markup;
use crate::session::ProposalSession;
use crate::sink::{Progress, RenderSink, Widget, display_proposal};
use crate::submodule::{ProposalRequest, ProposalResult};
use crate::types::Severity;

/// Passes restarted because of a language change, after the first one
pub const MAX_LANGUAGE_RESTARTS: usize = 3;

const MISSING_TITLE: &str = "ERROR: Missing Title";
const NO_PROPOSAL: &str = "ERROR: No proposal";

/// Markup sections keyed by submodule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateDocument {
    sections: Vec<(String, String)>,
}

impl AggregateDocument {
    /// Insert or replace the section of `submodule`
    pub fn insert(&mut self, submodule: &str, markup: String) {
        match self.sections.iter_mut().find(|(name, _)| name == submodule) {
            Some((_, section)) => *section = markup,
            None => self.sections.push((submodule.to_string(), markup)),
        }
    }

    pub fn get(&self, submodule: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|(name, _)| name == submodule)
            .map(|(_, section)| section.as_str())
    }

    pub fn submodules(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Concatenate the sections of `order`; unknown submodules contribute nothing
    pub fn render(&self, order: &[String]) -> String {
        order
            .iter()
            .filter_map(|submodule| self.get(submodule))
            .collect()
    }
}

/// Render a submodule's summary without its heading.
///
/// Returns the markup and whether the result blocks the installation.
pub fn format_sub_proposal(result: &ProposalResult) -> (String, bool) {
    let mut html = String::new();
    let severity = result.severity();

    if let Some(warning) = result.warning.as_deref().filter(|w| !w.is_empty()) {
        let text = match result.warning_level.unwrap_or(Severity::Warning) {
            Severity::Ok => warning.to_string(),
            Severity::Notice => markup::bold(warning),
            Severity::Warning | Severity::Error | Severity::Blocker | Severity::Fatal => {
                markup::colorize(warning, "red")
            }
        };
        html.push_str(&markup::para(&text));
    }

    match (&result.preformatted_proposal, &result.raw_proposal) {
        (Some(preformatted), _) if !preformatted.is_empty() => html.push_str(preformatted),
        (_, Some(raw)) if !raw.is_empty() => html.push_str(&markup::list(raw.as_slice())),
        _ => html.push_str(&markup::list(&[NO_PROPOSAL])),
    }

    (html, severity.is_blocking())
}

enum PassOutcome {
    Complete,
    LanguageChanged,
}

impl<S: RenderSink> ProposalSession<S> {
    /// Recompute every submodule's proposal and refresh the document
    pub fn make_proposal(&mut self, force_reset: bool, language_changed: bool) -> Result<()> {
        let mut language_changed = language_changed;

        for attempt in 0..=MAX_LANGUAGE_RESTARTS {
            let last = attempt == MAX_LANGUAGE_RESTARTS;
            match self.proposal_pass(force_reset, language_changed, !last)? {
                PassOutcome::Complete => return Ok(()),
                PassOutcome::LanguageChanged => {
                    info!(attempt, "Language changed during proposal, restarting");
                    language_changed = true;
                    self.retranslate_dialog();
                }
            }
        }
        Ok(())
    }

    /// Heading of a submodule's section, linked when the user may open it
    pub(crate) fn heading(&self, submodule: &str) -> String {
        let title = self
            .descriptions
            .get(submodule)
            .map(|d| d.title(submodule))
            .unwrap_or(MISSING_TITLE);

        if !self.is_interactive(submodule) || markup::contains_link(title) {
            return markup::heading(title);
        }

        let id = self
            .state
            .submodule_ids
            .get(submodule)
            .map(String::as_str)
            .unwrap_or_default();
        markup::heading(&markup::link(title, id))
    }

    fn proposal_pass(
        &mut self,
        force_reset: bool,
        language_changed: bool,
        honor_language_change: bool,
    ) -> Result<PassOutcome> {
        let execution = self.layout.execution.clone();
        let max = 2 * execution.len();
        let mut tick = 0;

        let mut document = AggregateDocument::default();
        let mut links = BTreeMap::new();
        let mut helps = BTreeMap::new();
        let mut blocker = false;
        let mut forced_tab: Option<usize> = None;
        let mut current_tab_affected = false;
        let mut stopped = false;

        self.sink.set_progress(Some(Progress { value: 0, max }));

        for submodule in &execution {
            let message = if self.state.already_proposed.contains(submodule) {
                ADAPTING
            } else {
                ANALYZING
            };
            document.insert(
                submodule,
                self.heading(submodule) + &markup::para(message),
            );
        }

        self.sink.set_enabled(Widget::Next, false);

        for submodule in &execution {
            tick += 1;
            self.sink.set_progress(Some(Progress { value: tick, max }));

            if !stopped {
                let request = ProposalRequest {
                    force_reset: force_reset && !self.layout.is_locked(submodule),
                    language_changed,
                };
                let result = self.gateway().propose(submodule, request);
                self.state.already_proposed.insert(submodule.clone());

                if let Some(help) = result.help.as_deref().filter(|h| !h.is_empty()) {
                    let visible = self
                        .layout
                        .tab_of(submodule)
                        .is_none_or(|tab| tab == self.state.current_tab);
                    if visible {
                        helps.insert(submodule.clone(), help.to_string());
                    }
                }

                if honor_language_change && result.language_changed {
                    self.sink.set_progress(None);
                    self.sink.set_enabled(Widget::Next, true);
                    return Ok(PassOutcome::LanguageChanged);
                }

                let severity = result.severity();
                if severity.forces_tab_switch() {
                    if let Some(tab) = self.layout.tab_of(submodule) {
                        forced_tab = Some(forced_tab.map_or(tab, |forced| forced.max(tab)));
                        if tab == self.state.current_tab {
                            current_tab_affected = true;
                        }
                    }
                }

                for link in &result.links {
                    links.insert(link.clone(), submodule.clone());
                }

                let (body, blocks) = format_sub_proposal(&result);
                // Hidden modules still run but never block
                blocker |= blocks && self.layout.is_displayed(submodule);
                document.insert(submodule, self.heading(submodule) + &body);
                display_proposal(&mut self.sink, &document.render(&self.layout.presentation));

                if severity.stops_proposal() {
                    warn!(%submodule, "Fatal proposal, skipping the remaining submodules");
                    stopped = true;
                }
            }

            tick += 1;
            self.sink.set_progress(Some(Progress { value: tick, max }));
        }

        self.document = document;
        self.state.link_to_submodule = links;
        self.state.blocker_present = blocker;
        let has_helps = !helps.is_empty();
        self.state.submodule_helps = helps;

        if has_helps {
            let help = self.help_text();
            self.sink.set_help(&help);
        }

        if self.state.has_tabs {
            if let Some(tab) = forced_tab.filter(|_| !current_tab_affected) {
                info!(tab, "Proposal error in another tab, switching to it");
                self.switch_tab(tab)?;
            }
        }

        debug!(blocker, "Proposal pass complete");
        self.sink.set_progress(None);
        self.sink.set_enabled(Widget::Next, true);
        Ok(PassOutcome::Complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_keeps_insertion_and_replaces() {
        let mut doc = AggregateDocument::default();
        doc.insert("a", "1".to_string());
        doc.insert("b", "2".to_string());
        doc.insert("a", "3".to_string());
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get("a"), Some("3"));
        assert_eq!(doc.submodules().collect::<Vec<_>>(), ["a", "b"]);
        let order = vec!["b".to_string(), "ghost".to_string(), "a".to_string()];
        assert_eq!(doc.render(&order), "23");
    }

    #[test]
    fn test_format_prefers_preformatted() {
        let result = ProposalResult {
            preformatted_proposal: Some("<ul><li>ext4</li></ul>".to_string()),
            raw_proposal: Some(vec!["ignored".to_string()]),
            ..Default::default()
        };
        let (html, blocks) = format_sub_proposal(&result);
        assert_eq!(html, "<ul><li>ext4</li></ul>");
        assert!(!blocks);
    }

    #[test]
    fn test_format_raw_and_missing() {
        let result = ProposalResult {
            raw_proposal: Some(vec!["Keyboard: English".to_string()]),
            ..Default::default()
        };
        assert_eq!(format_sub_proposal(&result).0, "<ul><li>Keyboard: English</li></ul>");
        assert_eq!(
            format_sub_proposal(&ProposalResult::default()).0,
            "<ul><li>ERROR: No proposal</li></ul>"
        );
    }

    #[test]
    fn test_format_warning_levels() {
        let with_level = |level| ProposalResult {
            warning: Some("Disk too small".to_string()),
            warning_level: level,
            raw_proposal: Some(vec!["x".to_string()]),
            ..Default::default()
        };

        let (html, blocks) = format_sub_proposal(&with_level(Some(Severity::Notice)));
        assert!(html.starts_with("<p><b>Disk too small</b></p>"));
        assert!(!blocks);

        let (html, blocks) = format_sub_proposal(&with_level(None));
        assert!(html.starts_with("<p><font color=\"red\">Disk too small</font></p>"));
        assert!(!blocks);

        let (_, blocks) = format_sub_proposal(&with_level(Some(Severity::Blocker)));
        assert!(blocks);
        let (_, blocks) = format_sub_proposal(&with_level(Some(Severity::Fatal)));
        assert!(blocks);
        let (_, blocks) = format_sub_proposal(&with_level(Some(Severity::Error)));
        assert!(!blocks);
    }
}
