//! The declared cross-references between subscenario categories.
//!
//! Each entry says that fragments of one category refer to (or must agree with) the selected
//! fragment of another. The table is turned into a graph (see [`crate::graph`]) which fixes the
//! order the checks run in.
use crate::category::SubscenarioCategory;
use crate::store::ProjectSubcategory;
use std::fmt::{self, Display};

/// A node in the category dependency graph
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryNode {
    /// A category selected directly by scenarios
    Scenario(SubscenarioCategory),
    /// A project-keyed sub-category, selected via operational characteristics
    Project(ProjectSubcategory),
}

impl Display for CategoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryNode::Scenario(category) => write!(f, "{category}"),
            CategoryNode::Project(subcategory) => write!(f, "{subcategory}"),
        }
    }
}

/// How a fragment depends on another and the rule which must hold between them
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// Each sub-fragment ID named by an operational characteristics row must be registered for
    /// that row's project
    SubFragment(ProjectSubcategory),
    /// Every entity of the dependency's fragment must appear in the dependent fragment
    CoversEntities(SubscenarioCategory),
    /// Every entity of the dependent fragment must be a member of the dependency's fragment
    EntitiesWithin(SubscenarioCategory),
    /// Every zone assigned by the dependent fragment must be a member of the dependency's fragment
    ZonesWithin(SubscenarioCategory),
}

impl Dependency {
    /// The node depended on
    pub fn node(self) -> CategoryNode {
        match self {
            Dependency::SubFragment(subcategory) => CategoryNode::Project(subcategory),
            Dependency::CoversEntities(category)
            | Dependency::EntitiesWithin(category)
            | Dependency::ZonesWithin(category) => CategoryNode::Scenario(category),
        }
    }
}

impl Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = match self {
            Dependency::SubFragment(_) => "sub_fragment",
            Dependency::CoversEntities(_) => "covers_entities",
            Dependency::EntitiesWithin(_) => "entities_within",
            Dependency::ZonesWithin(_) => "zones_within",
        };
        write!(f, "{rule}")
    }
}

/// A declared cross-reference from one category to another
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CrossReference {
    /// The category whose fragments hold the reference
    pub dependent: SubscenarioCategory,
    /// What is referred to, and how
    pub dependency: Dependency,
}

const fn xref(dependent: SubscenarioCategory, dependency: Dependency) -> CrossReference {
    CrossReference {
        dependent,
        dependency,
    }
}

use Dependency::{CoversEntities, EntitiesWithin, SubFragment, ZonesWithin};
use SubscenarioCategory as C;

/// Every cross-reference checked by the registry validator
pub const CROSS_REFERENCES: &[CrossReference] = &[
    // Operational characteristics
    xref(C::ProjectOperationalChars, SubFragment(ProjectSubcategory::HeatRateCurves)),
    xref(C::ProjectOperationalChars, SubFragment(ProjectSubcategory::StartupChars)),
    xref(
        C::ProjectOperationalChars,
        SubFragment(ProjectSubcategory::VariableGeneratorProfiles),
    ),
    xref(
        C::ProjectOperationalChars,
        SubFragment(ProjectSubcategory::HydroOperationalChars),
    ),
    xref(C::ProjectOperationalChars, CoversEntities(C::ProjectPortfolio)),
    // Project geography
    xref(C::ProjectLoadZones, CoversEntities(C::ProjectPortfolio)),
    xref(C::ProjectLoadZones, ZonesWithin(C::LoadZones)),
    xref(C::ProjectRpsZones, EntitiesWithin(C::ProjectPortfolio)),
    xref(C::ProjectRpsZones, ZonesWithin(C::RpsZones)),
    xref(C::ProjectCarbonCapZones, EntitiesWithin(C::ProjectPortfolio)),
    xref(C::ProjectCarbonCapZones, ZonesWithin(C::CarbonCapZones)),
    xref(C::ProjectPrmZones, EntitiesWithin(C::ProjectPortfolio)),
    xref(C::ProjectPrmZones, ZonesWithin(C::PrmZones)),
    xref(C::ProjectLocalCapacityZones, EntitiesWithin(C::ProjectPortfolio)),
    xref(C::ProjectLocalCapacityZones, ZonesWithin(C::LocalCapacityZones)),
    // Reserve balancing areas
    xref(C::ProjectLfReservesUpBa, EntitiesWithin(C::ProjectPortfolio)),
    xref(C::ProjectLfReservesUpBa, ZonesWithin(C::LfReservesUpBa)),
    xref(C::ProjectLfReservesDownBa, EntitiesWithin(C::ProjectPortfolio)),
    xref(C::ProjectLfReservesDownBa, ZonesWithin(C::LfReservesDownBa)),
    xref(C::ProjectRegulationUpBa, EntitiesWithin(C::ProjectPortfolio)),
    xref(C::ProjectRegulationUpBa, ZonesWithin(C::RegulationUpBa)),
    xref(C::ProjectRegulationDownBa, EntitiesWithin(C::ProjectPortfolio)),
    xref(C::ProjectRegulationDownBa, ZonesWithin(C::RegulationDownBa)),
    xref(C::ProjectFrequencyResponseBa, EntitiesWithin(C::ProjectPortfolio)),
    xref(C::ProjectFrequencyResponseBa, ZonesWithin(C::FrequencyResponseBa)),
    xref(C::ProjectSpinningReservesBa, EntitiesWithin(C::ProjectPortfolio)),
    xref(C::ProjectSpinningReservesBa, ZonesWithin(C::SpinningReservesBa)),
    // Other project data
    xref(C::ProjectSpecifiedCapacity, EntitiesWithin(C::ProjectPortfolio)),
    xref(C::ProjectElccChars, EntitiesWithin(C::ProjectPortfolio)),
    xref(C::ProjectLocalCapacityChars, EntitiesWithin(C::ProjectPortfolio)),
    // Transmission
    xref(C::TransmissionLoadZones, CoversEntities(C::TransmissionPortfolio)),
    xref(C::TransmissionLoadZones, ZonesWithin(C::LoadZones)),
    xref(C::TransmissionCarbonCapZones, EntitiesWithin(C::TransmissionPortfolio)),
    xref(C::TransmissionCarbonCapZones, ZonesWithin(C::CarbonCapZones)),
    xref(C::TransmissionSpecifiedCapacity, EntitiesWithin(C::TransmissionPortfolio)),
];
