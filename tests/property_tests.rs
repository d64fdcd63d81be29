//! Property-Based Tests for the proposal engine
//!
//! Uses proptest for the ordering and aggregation invariants:
//! - Presentation order is a stable sort by priority
//! - The allow-list only ever removes modules
//! - Tab assignment picks the lowest tab listing a module
//! - The aggregate document is idempotent under re-insertion

use proptest::prelude::*;
use std::collections::HashSet;

use instproposal::control::{DEFAULT_PRIORITY, normalize_module_name};
use instproposal::registry::{self, RegistryQuery, filter_allowed, presentation_order};
use instproposal::ui::render_markup;
use instproposal::{
    AggregateDocument, InstallContext, ProductControl, ProposalEntry, Severity, markup,
};
use strum::IntoEnumIterator;

/// Distinct module names with optional priorities
fn entries_strategy() -> impl Strategy<Value = Vec<ProposalEntry>> {
    prop::collection::vec(
        ("[a-z]{1,8}", prop::option::of(0u32..100)),
        0..12,
    )
    .prop_map(|raw| {
        let mut seen = HashSet::new();
        raw.into_iter()
            .filter(|(name, _)| seen.insert(name.clone()))
            .map(|(name, priority)| ProposalEntry::new(normalize_module_name(&name), priority))
            .collect()
    })
}

fn names(entries: &[ProposalEntry]) -> Vec<String> {
    entries.iter().map(|e| e.name.clone()).collect()
}

// =============================================================================
// Ordering Property Tests
// =============================================================================

proptest! {
    /// Presentation order sorts by priority and keeps control order on ties
    #[test]
    fn presentation_is_stable_priority_sort(entries in entries_strategy()) {
        let order = presentation_order(&entries);
        prop_assert_eq!(order.len(), entries.len());

        let position = |name: &str| entries.iter().position(|e| e.name == name).unwrap();
        let priority = |name: &str| entries[position(name)].priority.unwrap_or(DEFAULT_PRIORITY);
        for pair in order.windows(2) {
            let (a, b) = (pair[0].as_str(), pair[1].as_str());
            prop_assert!(priority(a) <= priority(b));
            if priority(a) == priority(b) {
                prop_assert!(position(a) < position(b));
            }
        }
    }

    /// The allow-list keeps order and never adds a module
    #[test]
    fn allow_list_only_removes(
        entries in entries_strategy(),
        allowed in prop::collection::vec("[a-z]{1,8}", 0..6),
    ) {
        let allow_list: Vec<String> = allowed.iter().map(|n| normalize_module_name(n)).collect();
        let modules = presentation_order(&entries);
        let filtered = filter_allowed(modules.clone(), &allow_list);

        if allow_list.is_empty() {
            prop_assert_eq!(&filtered, &modules);
        }
        for module in &filtered {
            prop_assert!(modules.contains(module));
            prop_assert!(allow_list.is_empty() || allow_list.contains(module));
        }
        let kept: Vec<&String> = modules.iter().filter(|m| filtered.contains(m)).collect();
        prop_assert_eq!(kept, filtered.iter().collect::<Vec<_>>());
    }

    /// Normalising a module name twice changes nothing
    #[test]
    fn normalize_is_idempotent(name in "[a-z_]{1,16}") {
        let once = normalize_module_name(&name);
        prop_assert!(once.contains("_proposal"));
        prop_assert_eq!(normalize_module_name(&once), once);
    }
}

// =============================================================================
// Registry Property Tests
// =============================================================================

fn control_with_tabs(modules: &[String], tabs: &[Vec<String>]) -> ProductControl {
    let tabs: Vec<serde_json::Value> = tabs
        .iter()
        .map(|modules| serde_json::json!({ "proposal_modules": modules }))
        .collect();
    serde_json::from_value(serde_json::json!({
        "proposals": [{
            "name": "initial",
            "stage": "initial",
            "mode": "installation",
            "proposal_modules": modules,
            "proposal_tabs": tabs,
        }]
    }))
    .unwrap()
}

proptest! {
    /// Every tab module gets the lowest tab index listing it, and modules
    /// only found in tabs run after the proposal's own modules
    #[test]
    fn tab_assignment_and_display_only(
        entries in entries_strategy().prop_filter("needs modules", |e| !e.is_empty()),
        picks in prop::collection::vec(prop::collection::vec(0usize..16, 0..5), 1..4),
        current_tab in 0usize..4,
    ) {
        let modules = names(&entries);
        let mut pool = modules.clone();
        pool.push("summary_proposal".to_string());
        let tabs: Vec<Vec<String>> = picks
            .iter()
            .map(|tab| tab.iter().map(|i| pool[i % pool.len()].clone()).collect())
            .collect();

        let control = control_with_tabs(&modules, &tabs);
        let key = InstallContext::default().key();
        let layout = registry::load(
            &control,
            &RegistryQuery { key: &key, current_tab, allow_list: &[] },
        ).unwrap();

        prop_assert!(layout.has_tabs);
        prop_assert_eq!(&layout.execution[..modules.len()], &modules[..]);
        for (module, tab) in &layout.tab_assignment {
            let lowest = tabs.iter().position(|t| t.contains(module)).unwrap();
            prop_assert_eq!(*tab, lowest);
        }
        for module in &layout.display_only {
            prop_assert!(!modules.contains(module));
            prop_assert!(layout.execution.contains(module));
        }
        let expected = tabs.get(current_tab).cloned().unwrap_or_default();
        prop_assert_eq!(layout.presentation, expected);
    }
}

// =============================================================================
// Aggregation Property Tests
// =============================================================================

proptest! {
    /// Re-inserting the same sections leaves the document unchanged
    #[test]
    fn document_reinsertion_is_idempotent(
        sections in prop::collection::vec(("[a-z]{1,6}", "[A-Za-z ]{0,20}"), 0..10),
    ) {
        let mut doc = AggregateDocument::default();
        for (module, text) in &sections {
            doc.insert(module, markup::para(text));
        }
        let once = doc.clone();
        for (module, _) in &sections {
            let section = doc.get(module).unwrap().to_string();
            doc.insert(module, section);
        }
        prop_assert_eq!(&doc, &once);

        let order: Vec<String> = doc.submodules().map(str::to_string).collect();
        prop_assert_eq!(doc.render(&order), once.render(&order));
    }

    /// Each linked heading becomes exactly one selectable link
    #[test]
    fn rendered_links_match_headings(titles in prop::collection::vec("[A-Za-z]{1,10}", 1..6)) {
        let document: String = titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                markup::heading(&markup::link(title, &format!("module_{}", i + 1)))
                    + &markup::list(&[format!("{} summary", title)])
            })
            .collect();

        let rendered = render_markup(&document);
        prop_assert_eq!(rendered.links.len(), titles.len());
        for (i, link) in rendered.links.iter().enumerate() {
            prop_assert_eq!(&link.id, &format!("module_{}", i + 1));
            prop_assert_eq!(&link.text, &titles[i]);
        }
    }
}

// =============================================================================
// Severity Property Tests
// =============================================================================

fn severity_strategy() -> impl Strategy<Value = Severity> {
    prop::sample::select(Severity::iter().collect::<Vec<_>>())
}

proptest! {
    /// Consequences only grow with severity
    #[test]
    fn severity_consequences_are_monotonic(a in severity_strategy(), b in severity_strategy()) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(!low.forces_tab_switch() || high.forces_tab_switch());
        prop_assert!(!low.is_blocking() || high.is_blocking());
        prop_assert!(!low.stops_proposal() || high.stops_proposal());
        prop_assert_eq!(high.is_blocking(), high >= Severity::Blocker);
    }
}
