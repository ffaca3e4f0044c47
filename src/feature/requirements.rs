//! The declarative mapping from features to the subscenario categories they need, and the
//! feature-toggle consistency checker built on it.
//!
//! The mapping is plain data (see `requirements.toml` for the bundled version) so that it can be
//! maintained and tested independently of the code which applies it. Users can supply their own
//! version via the `feature_requirements_path` setting.
use super::{Feature, FeatureFlags};
use crate::category::SubscenarioCategory;
use crate::input::{input_err_msg, read_toml};
use crate::scenario::Scenario;
use crate::violation::{Violation, ViolationKind, ViolationReport};
use anyhow::{Context, Result, bail, ensure};
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use strum::IntoEnumIterator;

/// The bundled feature requirements
const DEFAULT_REQUIREMENTS: &str = include_str!("requirements.toml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CategoryRuleRaw {
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    exclusive: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AlwaysRuleRaw {
    #[serde(default)]
    required: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FeatureRequirementsRaw {
    always: AlwaysRuleRaw,
    #[serde(default)]
    features: IndexMap<String, CategoryRuleRaw>,
}

/// The categories gated by a single feature
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureRule {
    /// Categories which must be selected when the feature is on
    pub required: Vec<SubscenarioCategory>,
    /// Categories which should not be selected when the feature is off
    pub exclusive: Vec<SubscenarioCategory>,
}

/// Which subscenario categories each feature needs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureRequirements {
    /// Categories every scenario must select, regardless of features
    pub always: Vec<SubscenarioCategory>,
    /// The rule for each feature, in [`Feature`] order
    pub features: IndexMap<Feature, FeatureRule>,
}

fn parse_categories(names: &[String]) -> Result<Vec<SubscenarioCategory>> {
    names
        .iter()
        .map(|name| {
            SubscenarioCategory::from_name(name)
                .with_context(|| format!("Unknown subscenario category: {name}"))
        })
        .collect()
}

fn parse_feature(name: &str) -> Result<Feature> {
    Feature::iter()
        .find(|feature| feature.name() == name)
        .with_context(|| format!("Unknown feature: {name}"))
}

impl FeatureRequirements {
    /// Load the feature requirements from the given path, or the bundled version if `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Self::from_toml_str(DEFAULT_REQUIREMENTS),
            Some(path) => {
                let raw: FeatureRequirementsRaw = read_toml(path)?;
                Self::from_raw(raw).with_context(|| input_err_msg(path))
            }
        }
    }

    /// Parse the feature requirements from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let raw = toml::from_str(toml_str).context("Could not parse feature requirements")?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: FeatureRequirementsRaw) -> Result<Self> {
        let always = parse_categories(&raw.always.required)?;

        let mut by_feature = HashMap::new();
        for (name, rule) in raw.features {
            let feature = parse_feature(&name)?;
            let rule = FeatureRule {
                required: parse_categories(&rule.required)
                    .with_context(|| format!("Invalid requirements for feature {feature}"))?,
                exclusive: parse_categories(&rule.exclusive)
                    .with_context(|| format!("Invalid requirements for feature {feature}"))?,
            };
            ensure!(
                by_feature.insert(feature, rule).is_none(),
                "Feature {feature} is listed more than once"
            );
        }

        // Store rules in a fixed order so that violations are reported deterministically
        let features = Feature::iter()
            .map(|feature| {
                let rule = by_feature
                    .remove(&feature)
                    .with_context(|| format!("No requirements given for feature {feature}"))?;
                Ok((feature, rule))
            })
            .collect::<Result<IndexMap<_, _>>>()?;

        let requirements = Self { always, features };
        requirements.validate()?;
        Ok(requirements)
    }

    /// Check the mapping is coherent.
    ///
    /// A category may be exclusive to at most one feature, and a category exclusive to one feature
    /// may not be required by any other (or by every scenario).
    fn validate(&self) -> Result<()> {
        let mut exclusive_owner: HashMap<SubscenarioCategory, Feature> = HashMap::new();
        for (&feature, rule) in &self.features {
            for &category in &rule.exclusive {
                if let Some(other) = exclusive_owner.insert(category, feature) {
                    bail!(
                        "Category {category} cannot be exclusive to both {other} and {feature}"
                    );
                }
            }
        }

        for &category in &self.always {
            if let Some(owner) = exclusive_owner.get(&category) {
                bail!(
                    "Category {category} is always required, so cannot be exclusive to {owner}"
                );
            }
        }

        for (&feature, rule) in &self.features {
            for category in &rule.required {
                match exclusive_owner.get(category) {
                    Some(&owner) if owner != feature => bail!(
                        "Category {category} is required by {feature}, so cannot be exclusive to \
                         {owner}"
                    ),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    /// Get the rule for a feature
    pub fn rule(&self, feature: Feature) -> &FeatureRule {
        // Every feature has a rule once loaded
        &self.features[&feature]
    }

    /// The categories which must be selected given the enabled features, in order of discovery
    pub fn required_categories(&self, flags: &FeatureFlags) -> IndexSet<SubscenarioCategory> {
        let mut required: IndexSet<_> = self.always.iter().copied().collect();
        for feature in flags.iter_enabled() {
            required.extend(self.rule(feature).required.iter().copied());
        }
        required
    }

    /// Check that a scenario's feature flags agree with its selectors.
    ///
    /// Every violation is collected. A missing required selector is an error; an exclusive
    /// selector set while its feature is off is a warning.
    pub fn check(&self, scenario: &Scenario) -> ViolationReport {
        let flags = &scenario.features;
        let selectors = &scenario.subscenarios;
        let mut report = ViolationReport::new();

        let mut reported = IndexSet::new();
        for &category in &self.always {
            if selectors.get(category).is_none() && reported.insert(category) {
                report.push(
                    Violation::error(
                        ViolationKind::FeatureSelectorIncoherence,
                        format!("A {category} subscenario must be selected for every scenario"),
                    )
                    .for_selector(category, None),
                );
            }
        }

        for (&feature, rule) in &self.features {
            if flags.is_enabled(feature) {
                for &category in &rule.required {
                    if selectors.get(category).is_none() && reported.insert(category) {
                        report.push(
                            Violation::error(
                                ViolationKind::FeatureSelectorIncoherence,
                                format!(
                                    "Feature {feature} is enabled, but no {category} subscenario \
                                     is selected"
                                ),
                            )
                            .for_selector(category, None),
                        );
                    }
                }
            } else {
                for &category in &rule.exclusive {
                    if let Some(id) = selectors.get(category) {
                        report.push(
                            Violation::warning(
                                ViolationKind::FeatureSelectorIncoherence,
                                format!(
                                    "Feature {feature} is disabled ({} = false), so this \
                                     selector will be ignored",
                                    feature.flag_name()
                                ),
                            )
                            .for_selector(category, Some(id)),
                        );
                    }
                }
            }
        }

        report
    }
}
