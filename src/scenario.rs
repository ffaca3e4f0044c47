//! Scenario definitions.
//!
//! A scenario names one fragment per subscenario category (or none) and turns optional model
//! features on or off. It also carries lifecycle status fields, which are recorded for the benefit
//! of other tools but have no effect on assembly.
use crate::category::SubscenarioSelectors;
use crate::feature::FeatureFlags;
use crate::id::define_id_type;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

define_id_type! {ScenarioName}

/// A map of scenarios, keyed by name
pub type ScenarioMap = IndexMap<ScenarioName, Scenario>;

/// Whether a scenario has been validated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Not yet validated
    #[default]
    NotValidated,
    /// Validated without errors
    Valid,
    /// Validation found errors
    Invalid,
}

/// Whether a scenario has been run through the optimiser
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Never run
    #[default]
    NotRun,
    /// Currently running
    Running,
    /// Finished successfully
    Complete,
    /// Finished with an error
    Failed,
}

impl Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotValidated => "not_validated",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        };
        write!(f, "{s}")
    }
}

impl Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotRun => "not_run",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A scenario: one selector per category plus feature flags
#[derive(Clone, Debug, PartialEq)]
pub struct Scenario {
    /// Unique name of the scenario
    pub name: ScenarioName,
    /// Free-text description
    pub description: String,
    /// Which optional features are enabled
    pub features: FeatureFlags,
    /// The fragment selected for each category
    pub subscenarios: SubscenarioSelectors,
    /// Validation status (carried only)
    pub validation_status: ValidationStatus,
    /// Run status (carried only)
    pub run_status: RunStatus,
}

impl Scenario {
    /// Create a new scenario with no features and nothing selected
    pub fn new(name: ScenarioName) -> Self {
        Self {
            name,
            description: String::new(),
            features: FeatureFlags::default(),
            subscenarios: SubscenarioSelectors::default(),
            validation_status: ValidationStatus::default(),
            run_status: RunStatus::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_scenario_is_empty() {
        let scenario = Scenario::new("base".into());
        assert_eq!(scenario.name.as_str(), "base");
        assert_eq!(scenario.subscenarios.iter().count(), 0);
        assert_eq!(scenario.features.iter_enabled().count(), 0);
        assert_eq!(scenario.validation_status, ValidationStatus::NotValidated);
        assert_eq!(scenario.run_status, RunStatus::NotRun);
    }

    #[derive(Deserialize, Serialize)]
    struct Statuses {
        validation_status: ValidationStatus,
        run_status: RunStatus,
    }

    #[test]
    fn status_display_matches_serde() {
        let statuses = Statuses {
            validation_status: ValidationStatus::Invalid,
            run_status: RunStatus::Complete,
        };
        let toml_str = toml::to_string(&statuses).unwrap();
        assert_eq!(
            toml_str,
            "validation_status = \"invalid\"\nrun_status = \"complete\"\n"
        );
        assert_eq!(statuses.validation_status.to_string(), "invalid");
        assert_eq!(statuses.run_status.to_string(), "complete");
    }
}
