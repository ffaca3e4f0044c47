//! The scenario assembler: the single entry point which turns a scenario definition into a
//! resolved configuration for the optimiser.
//!
//! Assembly is all-or-nothing. Selectors are validated first (registry and feature checks, which
//! report every problem they find); the temporal hierarchy is only resolved if those pass. The
//! store is read but never modified, so assembling the same scenario twice gives the same result
//! and several scenarios can be assembled concurrently from one store.
use crate::category::{SubscenarioCategory, SubscenarioID};
use crate::feature::{Feature, FeatureFlags, FeatureRequirements};
use crate::registry::validate_registry;
use crate::scenario::{Scenario, ScenarioName};
use crate::store::{
    EntityID, Fragment, HeatRateCurvePoint, OperationalChars, SubscenarioStore,
};
use crate::temporal::{Stage, TemporalHierarchy, TemporalTables, resolve_temporal_hierarchy};
use crate::violation::{Violation, ViolationKind, ViolationReport};
use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

/// The reason a scenario could not be assembled
#[derive(Debug, Error)]
#[error("Scenario {scenario} could not be assembled:\n{report}")]
pub struct AssemblyError {
    /// The scenario
    pub scenario: ScenarioName,
    /// Every violation found, including warnings
    pub report: ViolationReport,
}

/// A fragment selected by the scenario
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFragment {
    /// The fragment's category
    pub category: SubscenarioCategory,
    /// The fragment itself
    pub fragment: Fragment,
}

/// A portfolio project with the rows which apply to it in this scenario
#[derive(Clone, Debug, PartialEq)]
pub struct ScopedProject {
    /// The project
    pub project: EntityID,
    /// The load zones the project is assigned to
    pub load_zones: Vec<EntityID>,
    /// The project's operational characteristics, if described
    pub operational_chars: Option<OperationalChars>,
    /// Heat rate curve points for periods in the temporal hierarchy
    pub heat_rate_curve: Vec<HeatRateCurvePoint>,
}

/// A grid of timepoints for one (subproblem, stage) of a scenario
#[derive(Clone, Copy, Debug)]
pub struct StageGrid<'a> {
    /// The scenario
    pub scenario: &'a ScenarioName,
    /// The subproblem ID
    pub subproblem: u32,
    /// The stage, including its timepoints and their neighbours
    pub stage: &'a Stage,
}

/// A scenario whose selectors have been validated and whose temporal hierarchy has been resolved
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedScenario {
    /// The scenario's name
    pub name: ScenarioName,
    /// The scenario's description
    pub description: String,
    /// Enabled features
    pub features: FeatureFlags,
    /// The selected fragments, in category order
    pub fragments: Vec<SelectedFragment>,
    /// The resolved temporal hierarchy
    pub temporal: TemporalHierarchy,
    /// The load zones of the selected zone set
    pub load_zones: Vec<EntityID>,
    /// The projects of the selected portfolio
    pub projects: IndexMap<EntityID, ScopedProject>,
    /// Violations which didn't block assembly
    pub warnings: ViolationReport,
}

impl ResolvedScenario {
    /// Iterate over the timepoint grid of every (subproblem, stage), in order
    pub fn iter_stage_grids(&self) -> impl Iterator<Item = StageGrid<'_>> {
        self.temporal
            .iter_stages()
            .map(|(subproblem, stage)| StageGrid {
                scenario: &self.name,
                subproblem: subproblem.id,
                stage,
            })
    }

    /// The selected fragment of a category, if any
    pub fn fragment(&self, category: SubscenarioCategory) -> Option<&Fragment> {
        self.fragments
            .iter()
            .find(|selected| selected.category == category)
            .map(|selected| &selected.fragment)
    }
}

/// Assemble a scenario from the fragments in the store.
///
/// # Returns
///
/// The resolved scenario, or an [`AssemblyError`] holding every violation found if any of them
/// blocks assembly.
pub fn assemble_scenario(
    store: &SubscenarioStore,
    scenario: &Scenario,
    requirements: &FeatureRequirements,
) -> Result<ResolvedScenario, AssemblyError> {
    let fail = |report| {
        Err(AssemblyError {
            scenario: scenario.name.clone(),
            report,
        })
    };

    let mut report = validate_registry(store, scenario);
    report.extend(requirements.check(scenario));
    if report.has_errors() {
        return fail(report);
    }

    let Some(temporal_id) = scenario.subscenarios.temporal else {
        report.push(
            Violation::error(
                ViolationKind::FeatureSelectorIncoherence,
                "A temporal subscenario must be selected to resolve the temporal hierarchy",
            )
            .for_selector(SubscenarioCategory::Temporal, None),
        );
        return fail(report);
    };

    // A registered temporal fragment without detail rows fails on its (missing) periods
    let no_tables = TemporalTables::default();
    let tables = store.temporal_tables(temporal_id).unwrap_or(&no_tables);
    let temporal = match resolve_temporal_hierarchy(temporal_id, tables) {
        Ok(temporal) => temporal,
        Err(err) => {
            report.push(err.into());
            return fail(report);
        }
    };

    if let Some(violation) = check_stage_count(&temporal, &scenario.features, temporal_id) {
        report.push(violation);
        return fail(report);
    }

    debug!(
        "Assembled scenario {} ({} subproblems)",
        scenario.name,
        temporal.subproblems.len()
    );

    Ok(ResolvedScenario {
        name: scenario.name.clone(),
        description: scenario.description.clone(),
        features: scenario.features.clone(),
        fragments: selected_fragments(store, scenario),
        load_zones: scoped_load_zones(store, scenario),
        projects: scoped_projects(store, scenario, &temporal),
        temporal,
        warnings: report,
    })
}

/// More than one stage per subproblem requires the multi-stage feature
fn check_stage_count(
    temporal: &TemporalHierarchy,
    features: &FeatureFlags,
    temporal_id: SubscenarioID,
) -> Option<Violation> {
    let stage_count = temporal.max_stage_count();
    if stage_count <= 1 || features.is_enabled(Feature::MultiStage) {
        return None;
    }

    Some(
        Violation::error(
            ViolationKind::FeatureSelectorIncoherence,
            format!(
                "Temporal hierarchy has {stage_count} stages in a subproblem, but feature {} is \
                 disabled",
                Feature::MultiStage
            ),
        )
        .for_selector(SubscenarioCategory::Temporal, Some(temporal_id)),
    )
}

fn selected_fragments(store: &SubscenarioStore, scenario: &Scenario) -> Vec<SelectedFragment> {
    scenario
        .subscenarios
        .iter()
        .filter_map(|selector| {
            store.fragment(selector).map(|fragment| SelectedFragment {
                category: selector.category,
                fragment: fragment.clone(),
            })
        })
        .collect()
}

fn scoped_load_zones(store: &SubscenarioStore, scenario: &Scenario) -> Vec<EntityID> {
    scenario
        .subscenarios
        .iter()
        .find(|selector| selector.category == SubscenarioCategory::LoadZones)
        .map(|selector| store.entities(selector).into_iter().cloned().collect())
        .unwrap_or_default()
}

fn scoped_projects(
    store: &SubscenarioStore,
    scenario: &Scenario,
    temporal: &TemporalHierarchy,
) -> IndexMap<EntityID, ScopedProject> {
    let selectors: IndexMap<_, _> = scenario
        .subscenarios
        .iter()
        .map(|selector| (selector.category, selector))
        .collect();
    let Some(&portfolio) = selectors.get(&SubscenarioCategory::ProjectPortfolio) else {
        return IndexMap::new();
    };
    let zone_map = selectors
        .get(&SubscenarioCategory::ProjectLoadZones)
        .and_then(|&selector| store.zone_map(selector));
    let chars = scenario
        .subscenarios
        .project_operational_chars
        .and_then(|id| store.operational_chars(id));

    store
        .entities(portfolio)
        .into_iter()
        .map(|project| {
            let operational_chars = chars.and_then(|chars| chars.get(project)).cloned();
            let heat_rate_curve = operational_chars
                .as_ref()
                .and_then(|chars| chars.heat_rate_curves_id)
                .map(|id| {
                    store
                        .heat_rate_curve(project, id)
                        .iter()
                        .filter(|point| temporal.periods.contains_key(&point.period))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            let load_zones = zone_map
                .and_then(|zone_map| zone_map.get(project))
                .map(|zones| zones.iter().cloned().collect())
                .unwrap_or_default();

            let scoped = ScopedProject {
                project: project.clone(),
                load_zones,
                operational_chars,
                heat_rate_curve,
            };
            (project.clone(), scoped)
        })
        .collect()
}
