//! The subscenario registry validator.
//!
//! Checks that every selector of a scenario resolves to a registered fragment and that the
//! selected fragments agree with each other, according to the cross-references declared in
//! [`dependency`]. All violations are collected; the store is never modified.
use crate::category::{SelectorRef, SubscenarioCategory};
use crate::graph::{build_category_graph, check_order};
use crate::scenario::Scenario;
use crate::store::{ProjectSubcategory, SubscenarioStore};
use crate::violation::{Violation, ViolationKind, ViolationReport};
use dependency::{CROSS_REFERENCES, CategoryNode, CrossReference, Dependency};
use itertools::Itertools;

pub mod dependency;

/// Check that a selector refers to a registered fragment
pub fn check_selector_resolves(
    store: &SubscenarioStore,
    selector: SelectorRef,
) -> Option<Violation> {
    if store.fragment(selector).is_some() {
        return None;
    }

    Some(
        Violation::error(
            ViolationKind::DanglingReference,
            format!(
                "No {} subscenario with ID {} exists",
                selector.category, selector.id
            ),
        )
        .for_selector(selector.category, Some(selector.id)),
    )
}

/// Validate a scenario's selectors against the store.
///
/// Selectors are checked first, then cross-references between the selected fragments, starting
/// with those categories which don't depend on others. A cross-reference is only checked if both
/// of its ends are selected and resolve, so one broken fragment doesn't cause a cascade of
/// violations further up the graph.
pub fn validate_registry(store: &SubscenarioStore, scenario: &Scenario) -> ViolationReport {
    let mut report: ViolationReport = scenario
        .subscenarios
        .iter()
        .filter_map(|selector| check_selector_resolves(store, selector))
        .collect();

    for xref in cross_references_in_check_order() {
        let Some(dependent) = resolved_selector(store, scenario, xref.dependent) else {
            continue;
        };
        let dependency = match xref.dependency.node() {
            CategoryNode::Scenario(category) => {
                match resolved_selector(store, scenario, category) {
                    Some(selector) => Some(selector),
                    None => continue,
                }
            }
            CategoryNode::Project(_) => None,
        };

        report.extend(check_cross_reference(store, xref, dependent, dependency));
    }

    report
}

/// The selector for a category, if set and resolving to a registered fragment
fn resolved_selector(
    store: &SubscenarioStore,
    scenario: &Scenario,
    category: SubscenarioCategory,
) -> Option<SelectorRef> {
    let id = scenario.subscenarios.get(category)?;
    let selector = SelectorRef { category, id };
    store.fragment(selector).map(|_| selector)
}

/// The declared cross-references, ordered so that dependencies are checked before dependents
fn cross_references_in_check_order() -> Vec<&'static CrossReference> {
    let order = check_order(&build_category_graph(CROSS_REFERENCES));
    CROSS_REFERENCES
        .iter()
        .sorted_by_key(|xref| {
            let node = CategoryNode::Scenario(xref.dependent);
            order.iter().position(|n| *n == node)
        })
        .collect()
}

fn check_cross_reference(
    store: &SubscenarioStore,
    xref: &CrossReference,
    dependent: SelectorRef,
    dependency: Option<SelectorRef>,
) -> Vec<Violation> {
    let violation = |message: String| {
        Violation::error(ViolationKind::DanglingReference, message)
            .for_selector(dependent.category, Some(dependent.id))
    };

    match (xref.dependency, dependency) {
        (Dependency::SubFragment(subcategory), _) => {
            check_sub_fragments(store, dependent, subcategory)
                .map(violation)
                .collect()
        }
        (Dependency::CoversEntities(_), Some(dependency)) => {
            let entities = store.entities(dependent);
            store
                .entities(dependency)
                .into_iter()
                .filter(|entity| !entities.contains(entity))
                .map(|entity| {
                    violation(format!(
                        "{entity} is in {dependency} but has no entry in this fragment"
                    ))
                })
                .collect()
        }
        (Dependency::EntitiesWithin(_), Some(dependency)) => {
            let allowed = store.entities(dependency);
            store
                .entities(dependent)
                .into_iter()
                .filter(|entity| !allowed.contains(entity))
                .map(|entity| violation(format!("{entity} is not in {dependency}")))
                .collect()
        }
        (Dependency::ZonesWithin(_), Some(dependency)) => {
            let zones = store.entities(dependency);
            store
                .zone_map(dependent)
                .into_iter()
                .flatten()
                .flat_map(|(entity, entity_zones)| {
                    entity_zones.iter().map(move |zone| (entity, zone))
                })
                .filter(|(_, zone)| !zones.contains(zone))
                .map(|(entity, zone)| {
                    violation(format!(
                        "{entity} is assigned to zone {zone}, which is not in {dependency}"
                    ))
                })
                .collect()
        }
        (_, None) => Vec::new(),
    }
}

/// Messages for each operational characteristics row naming an unregistered sub-fragment
fn check_sub_fragments(
    store: &SubscenarioStore,
    dependent: SelectorRef,
    subcategory: ProjectSubcategory,
) -> impl Iterator<Item = String> + '_ {
    store
        .operational_chars(dependent.id)
        .into_iter()
        .flat_map(|chars| chars.values())
        .filter_map(move |row| {
            let id = row.sub_fragment(subcategory)?;
            store
                .project_fragment(subcategory, &row.project, id)
                .is_none()
                .then(|| {
                    format!(
                        "{} refers to {subcategory} subscenario {id}, which does not exist for \
                         that project",
                        row.project
                    )
                })
        })
}
