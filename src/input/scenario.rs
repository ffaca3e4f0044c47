//! Code for reading scenario definitions from `scenarios.toml`.
use super::{input_err_msg, read_toml};
use crate::category::SubscenarioSelectors;
use crate::feature::FeatureFlags;
use crate::scenario::{RunStatus, Scenario, ScenarioMap, ValidationStatus};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const SCENARIOS_FILE_NAME: &str = "scenarios.toml";

/// A scenario as defined in `scenarios.toml`
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
struct ScenarioRaw {
    description: String,
    features: FeatureFlags,
    subscenarios: SubscenarioSelectors,
    validation_status: ValidationStatus,
    run_status: RunStatus,
}

/// Read the scenarios defined in a store directory.
///
/// # Arguments
///
/// * `store_dir` - Folder containing the store's input files
///
/// # Returns
///
/// The scenarios, in the order they are defined, or an error.
pub fn read_scenarios(store_dir: &Path) -> Result<ScenarioMap> {
    let file_path = store_dir.join(SCENARIOS_FILE_NAME);
    let scenarios_raw: IndexMap<String, ScenarioRaw> = read_toml(&file_path)?;
    read_scenarios_from_map(scenarios_raw).with_context(|| input_err_msg(&file_path))
}

fn read_scenarios_from_map(scenarios_raw: IndexMap<String, ScenarioRaw>) -> Result<ScenarioMap> {
    ensure!(!scenarios_raw.is_empty(), "No scenarios defined");

    let mut scenarios = ScenarioMap::new();
    for (name, raw) in scenarios_raw {
        ensure!(!name.trim().is_empty(), "Scenario names cannot be empty");
        let scenario = Scenario {
            name: name.as_str().into(),
            description: raw.description,
            features: raw.features,
            subscenarios: raw.subscenarios,
            validation_status: raw.validation_status,
            run_status: raw.run_status,
        };
        scenarios.insert(scenario.name.clone(), scenario);
    }

    Ok(scenarios)
}
