//! The denormalised scenario view.
//!
//! One row per subscenario category, giving the selected ID and the name of the fragment it
//! refers to. This is a pure projection: it is built whether or not the scenario is valid, so a
//! dangling selector shows up with no fragment name.
use crate::category::{SelectorRef, SubscenarioCategory, SubscenarioID};
use crate::feature::Feature;
use crate::scenario::{RunStatus, Scenario, ScenarioName, ValidationStatus};
use crate::store::SubscenarioStore;
use itertools::Itertools;
use serde::Serialize;
use std::fmt::{self, Display};
use strum::IntoEnumIterator;

/// One category of the scenario view
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewRow {
    /// The category
    pub category: SubscenarioCategory,
    /// The name of the selector column (e.g. `load_scenario_id`)
    pub selector_column: String,
    /// The selected ID, if any
    pub subscenario_id: Option<SubscenarioID>,
    /// The name of the selected fragment, if the selector resolves
    pub name: Option<String>,
}

/// A scenario with every selector resolved to its fragment name
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioView {
    /// The scenario's name
    pub scenario: ScenarioName,
    /// The scenario's description
    pub description: String,
    /// The enabled features
    pub features: Vec<Feature>,
    /// Validation status
    pub validation_status: ValidationStatus,
    /// Run status
    pub run_status: RunStatus,
    /// One row per category, in category order
    pub rows: Vec<ViewRow>,
}

impl ScenarioView {
    /// The rows whose selector is set
    pub fn selected_rows(&self) -> impl Iterator<Item = &ViewRow> {
        self.rows.iter().filter(|row| row.subscenario_id.is_some())
    }
}

/// Build the denormalised view of a scenario
pub fn scenario_view(store: &SubscenarioStore, scenario: &Scenario) -> ScenarioView {
    let rows = SubscenarioCategory::iter()
        .map(|category| {
            let subscenario_id = scenario.subscenarios.get(category);
            let name = subscenario_id
                .and_then(|id| store.fragment(SelectorRef { category, id }))
                .map(|fragment| fragment.name.clone());
            ViewRow {
                category,
                selector_column: category.selector_column(),
                subscenario_id,
                name,
            }
        })
        .collect();

    ScenarioView {
        scenario: scenario.name.clone(),
        description: scenario.description.clone(),
        features: scenario.features.iter_enabled().collect(),
        validation_status: scenario.validation_status,
        run_status: scenario.run_status,
        rows,
    }
}

impl Display for ScenarioView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scenario: {}", self.scenario)?;
        if !self.description.is_empty() {
            writeln!(f, "Description: {}", self.description)?;
        }
        let features = if self.features.is_empty() {
            "none".to_string()
        } else {
            self.features.iter().join(", ")
        };
        writeln!(f, "Features: {features}")?;
        writeln!(
            f,
            "Status: {} / {}",
            self.validation_status, self.run_status
        )?;

        for row in self.selected_rows() {
            let name = row.name.as_deref().unwrap_or("<missing>");
            if let Some(id) = row.subscenario_id {
                writeln!(f, "  {} = {id} ({name})", row.selector_column)?;
            }
        }

        Ok(())
    }
}
