//! Subscenario categories and the selectors a scenario uses to pick one fragment per category.
//!
//! Every category has exactly one optional field in [`SubscenarioSelectors`]. The field and the
//! [`SubscenarioCategory`] variant are generated together so that generic code (e.g. the registry
//! validator) can treat every selector as a tagged [`SelectorRef`] without knowing which field it
//! came from.
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use strum::{EnumIter, IntoEnumIterator};

/// The surrogate identifier of a subscenario fragment within its category
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct SubscenarioID(pub u32);

impl Display for SubscenarioID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A selector value tagged with the category it refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SelectorRef {
    /// The category of the selected fragment
    pub category: SubscenarioCategory,
    /// The selected fragment
    pub id: SubscenarioID,
}

impl Display for SelectorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.category, self.id)
    }
}

macro_rules! define_subscenario_categories {
    ($($(#[$meta:meta])* $variant:ident => $field:ident,)*) => {
        /// A class of interchangeable input fragments (e.g. load profiles or project portfolios)
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Deserialize,
            Serialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum SubscenarioCategory {
            $($(#[$meta])* $variant,)*
        }

        impl SubscenarioCategory {
            /// The name of the category as used in input files
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($field),)*
                }
            }

            /// Look up a category by the name used in input files
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($field) => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }

        /// The subscenario selected for each category, if any.
        ///
        /// In a scenario file these appear as `<category> = <subscenario_id>` entries in the
        /// scenario's `subscenarios` table. Unknown categories are rejected.
        #[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
        #[serde(default, deny_unknown_fields)]
        pub struct SubscenarioSelectors {
            $(
                #[allow(missing_docs)]
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<SubscenarioID>,
            )*
        }

        impl SubscenarioSelectors {
            /// Get the selected subscenario for a category
            pub fn get(&self, category: SubscenarioCategory) -> Option<SubscenarioID> {
                match category {
                    $(SubscenarioCategory::$variant => self.$field,)*
                }
            }

            /// Set or clear the selected subscenario for a category
            pub fn set(&mut self, category: SubscenarioCategory, id: Option<SubscenarioID>) {
                match category {
                    $(SubscenarioCategory::$variant => self.$field = id,)*
                }
            }
        }
    };
}

define_subscenario_categories! {
    /// The temporal structure (periods, subproblems, stages, horizons and timepoints)
    Temporal => temporal,
    /// The set of load zones
    LoadZones => load_zones,
    /// Balancing areas for load-following reserves (up)
    LfReservesUpBa => lf_reserves_up_ba,
    /// Balancing areas for load-following reserves (down)
    LfReservesDownBa => lf_reserves_down_ba,
    /// Balancing areas for regulation (up)
    RegulationUpBa => regulation_up_ba,
    /// Balancing areas for regulation (down)
    RegulationDownBa => regulation_down_ba,
    /// Balancing areas for frequency response
    FrequencyResponseBa => frequency_response_ba,
    /// Balancing areas for spinning reserves
    SpinningReservesBa => spinning_reserves_ba,
    /// Renewable portfolio standard zones
    RpsZones => rps_zones,
    /// Carbon cap zones
    CarbonCapZones => carbon_cap_zones,
    /// Planning reserve margin zones
    PrmZones => prm_zones,
    /// Local capacity zones
    LocalCapacityZones => local_capacity_zones,
    /// The projects that make up the portfolio
    ProjectPortfolio => project_portfolio,
    /// Operational characteristics of each project
    ProjectOperationalChars => project_operational_chars,
    /// Project availability (e.g. planned outages)
    ProjectAvailability => project_availability,
    /// Fuels used by each project
    ProjectFuels => project_fuels,
    /// Fuel prices
    FuelPrices => fuel_prices,
    /// The load zone of each project
    ProjectLoadZones => project_load_zones,
    /// Project contributions to load-following reserves (up)
    ProjectLfReservesUpBa => project_lf_reserves_up_ba,
    /// Project contributions to load-following reserves (down)
    ProjectLfReservesDownBa => project_lf_reserves_down_ba,
    /// Project contributions to regulation (up)
    ProjectRegulationUpBa => project_regulation_up_ba,
    /// Project contributions to regulation (down)
    ProjectRegulationDownBa => project_regulation_down_ba,
    /// Project contributions to frequency response
    ProjectFrequencyResponseBa => project_frequency_response_ba,
    /// Project contributions to spinning reserves
    ProjectSpinningReservesBa => project_spinning_reserves_ba,
    /// The RPS zone of each project
    ProjectRpsZones => project_rps_zones,
    /// The carbon cap zone of each project
    ProjectCarbonCapZones => project_carbon_cap_zones,
    /// The PRM zone of each project
    ProjectPrmZones => project_prm_zones,
    /// Project ELCC characteristics
    ProjectElccChars => project_elcc_chars,
    /// Energy-only PRM project settings
    ProjectPrmEnergyOnly => project_prm_energy_only,
    /// The local capacity zone of each project
    ProjectLocalCapacityZones => project_local_capacity_zones,
    /// Project local capacity characteristics
    ProjectLocalCapacityChars => project_local_capacity_chars,
    /// Specified (existing) project capacity
    ProjectSpecifiedCapacity => project_specified_capacity,
    /// Fixed costs of specified project capacity
    ProjectSpecifiedFixedCost => project_specified_fixed_cost,
    /// Costs of new-build project capacity
    ProjectNewCost => project_new_cost,
    /// Potential for new-build project capacity
    ProjectNewPotential => project_new_potential,
    /// Build sizes for binary new-build projects
    ProjectNewBinaryBuildSize => project_new_binary_build_size,
    /// The transmission lines that make up the portfolio
    TransmissionPortfolio => transmission_portfolio,
    /// The load zones connected by each transmission line
    TransmissionLoadZones => transmission_load_zones,
    /// Specified (existing) transmission capacity
    TransmissionSpecifiedCapacity => transmission_specified_capacity,
    /// Costs of new-build transmission capacity
    TransmissionNewCost => transmission_new_cost,
    /// Operational characteristics of each transmission line
    TransmissionOperationalChars => transmission_operational_chars,
    /// Transmission hurdle rates
    TransmissionHurdleRates => transmission_hurdle_rates,
    /// The carbon cap zone of each transmission line
    TransmissionCarbonCapZones => transmission_carbon_cap_zones,
    /// Simultaneous flow limits
    TransmissionSimultaneousFlowLimits => transmission_simultaneous_flow_limits,
    /// Line groups for simultaneous flow limits
    TransmissionSimultaneousFlowLimitLineGroups => transmission_simultaneous_flow_limit_line_groups,
    /// Load profiles
    Load => load,
    /// Load-following reserve requirements (up)
    LfReservesUp => lf_reserves_up,
    /// Load-following reserve requirements (down)
    LfReservesDown => lf_reserves_down,
    /// Regulation requirements (up)
    RegulationUp => regulation_up,
    /// Regulation requirements (down)
    RegulationDown => regulation_down,
    /// Frequency response requirements
    FrequencyResponse => frequency_response,
    /// Spinning reserve requirements
    SpinningReserves => spinning_reserves,
    /// RPS targets
    RpsTarget => rps_target,
    /// Carbon cap targets
    CarbonCapTarget => carbon_cap_target,
    /// Planning reserve margin requirements
    PrmRequirement => prm_requirement,
    /// ELCC surface
    ElccSurface => elcc_surface,
    /// Local capacity requirements
    LocalCapacityRequirement => local_capacity_requirement,
    /// Numerical tuning parameters
    Tuning => tuning,
}

impl Display for SubscenarioCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl SubscenarioCategory {
    /// The name of the selector column in the denormalised scenario view
    pub fn selector_column(self) -> String {
        format!("{}_scenario_id", self.name())
    }
}

impl SubscenarioSelectors {
    /// Iterate over the non-null selectors as tagged references, in category order
    pub fn iter(&self) -> impl Iterator<Item = SelectorRef> + '_ {
        SubscenarioCategory::iter()
            .filter_map(|category| self.get(category).map(|id| SelectorRef { category, id }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::IntoDeserializer;
    use serde::de::value::{Error as ValueError, StrDeserializer};

    #[test]
    fn category_names_match_serde_names() {
        for category in SubscenarioCategory::iter() {
            let de: StrDeserializer<ValueError> = category.name().into_deserializer();
            assert_eq!(SubscenarioCategory::deserialize(de).unwrap(), category);
            assert_eq!(SubscenarioCategory::from_name(category.name()), Some(category));
        }
    }

    #[test]
    fn selectors_get_set() {
        let mut selectors = SubscenarioSelectors::default();
        assert!(selectors.get(SubscenarioCategory::RpsTarget).is_none());

        selectors.set(SubscenarioCategory::RpsTarget, Some(SubscenarioID(3)));
        assert_eq!(selectors.rps_target, Some(SubscenarioID(3)));
        assert_eq!(
            selectors.get(SubscenarioCategory::RpsTarget),
            Some(SubscenarioID(3))
        );

        selectors.set(SubscenarioCategory::RpsTarget, None);
        assert!(selectors.rps_target.is_none());
    }

    #[test]
    fn selectors_iter_in_category_order() {
        let selectors = SubscenarioSelectors {
            tuning: Some(SubscenarioID(1)),
            temporal: Some(SubscenarioID(4)),
            ..Default::default()
        };
        let refs: Vec<_> = selectors.iter().collect();
        assert_eq!(
            refs,
            [
                SelectorRef {
                    category: SubscenarioCategory::Temporal,
                    id: SubscenarioID(4)
                },
                SelectorRef {
                    category: SubscenarioCategory::Tuning,
                    id: SubscenarioID(1)
                },
            ]
        );
    }

    #[test]
    fn selectors_reject_unknown_category() {
        let result: Result<SubscenarioSelectors, _> = toml::from_str("not_a_category = 1");
        assert!(result.is_err());
    }

    #[test]
    fn selector_column() {
        assert_eq!(
            SubscenarioCategory::RpsTarget.selector_column(),
            "rps_target_scenario_id"
        );
    }
}
