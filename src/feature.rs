//! Optional model features which a scenario can switch on or off.
//!
//! Each feature gates a list of subscenario categories (see [`requirements`]). In scenario files
//! the flags appear as `of_<feature> = true|false` entries in the scenario's `features` table.
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use strum::{EnumIter, IntoEnumIterator};

pub mod requirements;
pub use requirements::FeatureRequirements;

macro_rules! define_features {
    ($($(#[$meta:meta])* $variant:ident => $name:tt, $field:ident,)*) => {
        /// An optional model feature
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Deserialize,
            Serialize,
        )]
        pub enum Feature {
            $($(#[$meta])* #[serde(rename = $name)] $variant,)*
        }

        impl Feature {
            /// The name of the feature as used in the requirements file
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            /// The name of the flag for this feature in scenario files
            pub fn flag_name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($field),)*
                }
            }
        }

        /// Which features are enabled for a scenario
        #[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
        #[serde(default, deny_unknown_fields)]
        pub struct FeatureFlags {
            $(
                #[allow(missing_docs)]
                pub $field: bool,
            )*
        }

        impl FeatureFlags {
            /// Whether the given feature is enabled
            pub fn is_enabled(&self, feature: Feature) -> bool {
                match feature {
                    $(Feature::$variant => self.$field,)*
                }
            }

            /// Enable or disable the given feature
            pub fn set(&mut self, feature: Feature, enabled: bool) {
                match feature {
                    $(Feature::$variant => self.$field = enabled,)*
                }
            }
        }
    };
}

define_features! {
    /// Transmission between load zones
    Transmission => "transmission", of_transmission,
    /// Hurdle rates on transmission flows
    TransmissionHurdleRates => "transmission_hurdle_rates", of_transmission_hurdle_rates,
    /// Simultaneous flow limits on groups of lines
    SimultaneousFlowLimits => "simultaneous_flow_limits", of_simultaneous_flow_limits,
    /// Load-following reserves (up)
    LfReservesUp => "lf_reserves_up", of_lf_reserves_up,
    /// Load-following reserves (down)
    LfReservesDown => "lf_reserves_down", of_lf_reserves_down,
    /// Regulation (up)
    RegulationUp => "regulation_up", of_regulation_up,
    /// Regulation (down)
    RegulationDown => "regulation_down", of_regulation_down,
    /// Frequency response
    FrequencyResponse => "frequency_response", of_frequency_response,
    /// Spinning reserves
    SpinningReserves => "spinning_reserves", of_spinning_reserves,
    /// Renewable portfolio standard
    Rps => "rps", of_rps,
    /// Carbon cap
    CarbonCap => "carbon_cap", of_carbon_cap,
    /// Tracking of carbon imports over transmission lines
    TrackCarbonImports => "track_carbon_imports", of_track_carbon_imports,
    /// Planning reserve margin
    Prm => "prm", of_prm,
    /// ELCC surface for the planning reserve margin
    ElccSurface => "elcc_surface", of_elcc_surface,
    /// Local capacity requirements
    LocalCapacity => "local_capacity", of_local_capacity,
    /// Multiple stages per subproblem
    MultiStage => "multi_stage", of_multi_stage,
    /// Numerical tuning parameters
    Tuning => "tuning", of_tuning,
}

impl Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FeatureFlags {
    /// Iterate over the enabled features
    pub fn iter_enabled(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::iter().filter(|&feature| self.is_enabled(feature))
    }
}
