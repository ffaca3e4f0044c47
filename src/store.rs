//! The subscenario store: an immutable snapshot of every fragment a scenario could select.
//!
//! Fragments are keyed by (category, subscenario ID) and know nothing about each other. Checking
//! that they fit together is left to the [`registry`](crate::registry) validator.
use crate::category::{SelectorRef, SubscenarioCategory, SubscenarioID};
use crate::id::define_id_type;
use crate::temporal::TemporalTables;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{self, Display};
use strum::EnumIter;

define_id_type! {EntityID}

/// A fragment registry entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Fragment {
    /// Surrogate ID, unique within the category
    pub id: SubscenarioID,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: String,
}

/// The fragments registered for one category, keyed by ID
pub type FragmentMap = IndexMap<SubscenarioID, Fragment>;

/// A set of named entities (projects, zones, lines or balancing areas)
pub type EntitySet = IndexSet<EntityID>;

/// A map from entity to the zones it is assigned to
pub type ZoneMap = IndexMap<EntityID, IndexSet<EntityID>>;

/// Operational characteristics for each project in one fragment
pub type OperationalCharsMap = IndexMap<EntityID, OperationalChars>;

/// Project-keyed sub-categories, whose fragments are registered per project
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum ProjectSubcategory {
    /// Heat rate curves
    HeatRateCurves,
    /// Startup characteristics
    StartupChars,
    /// Variable generator profiles
    VariableGeneratorProfiles,
    /// Hydro operational characteristics
    HydroOperationalChars,
}

impl ProjectSubcategory {
    /// The name of the sub-category as used in input files
    pub fn name(self) -> &'static str {
        match self {
            Self::HeatRateCurves => "heat_rate_curves",
            Self::StartupChars => "startup_chars",
            Self::VariableGeneratorProfiles => "variable_generator_profiles",
            Self::HydroOperationalChars => "hydro_operational_chars",
        }
    }
}

impl Display for ProjectSubcategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project_{}", self.name())
    }
}

/// One project's row in an operational characteristics fragment
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OperationalChars {
    /// The project
    pub project: EntityID,
    /// Operational type (e.g. "gen_commit_bin")
    pub operational_type: String,
    /// Heat rate curve sub-fragment, if any
    pub heat_rate_curves_id: Option<SubscenarioID>,
    /// Startup characteristics sub-fragment, if any
    pub startup_chars_id: Option<SubscenarioID>,
    /// Variable generator profile sub-fragment, if any
    pub variable_generator_profile_id: Option<SubscenarioID>,
    /// Hydro operational characteristics sub-fragment, if any
    pub hydro_operational_chars_id: Option<SubscenarioID>,
}

impl OperationalChars {
    /// The sub-fragment of the given sub-category which this row names, if any
    pub fn sub_fragment(&self, subcategory: ProjectSubcategory) -> Option<SubscenarioID> {
        match subcategory {
            ProjectSubcategory::HeatRateCurves => self.heat_rate_curves_id,
            ProjectSubcategory::StartupChars => self.startup_chars_id,
            ProjectSubcategory::VariableGeneratorProfiles => self.variable_generator_profile_id,
            ProjectSubcategory::HydroOperationalChars => self.hydro_operational_chars_id,
        }
    }
}

/// A point on a project's heat rate curve
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeatRateCurvePoint {
    /// The period this point applies to
    pub period: u32,
    /// Fraction of capacity at this load point
    pub load_point_fraction: f64,
    /// Average heat rate at this load point
    pub average_heat_rate: f64,
}

/// An immutable snapshot of all fragments.
///
/// Concurrent assemblies can share one store, since nothing in it is modified after loading.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubscenarioStore {
    /// Fragment registries, one per category
    pub fragments: HashMap<SubscenarioCategory, FragmentMap>,
    /// Members of fragments which are sets of entities (e.g. portfolios and zone sets)
    pub members: HashMap<SelectorRef, EntitySet>,
    /// Entity-to-zone assignments of fragments which are zone maps
    pub zones: HashMap<SelectorRef, ZoneMap>,
    /// Detail rows of `project_operational_chars` fragments
    pub operational_chars: HashMap<SubscenarioID, OperationalCharsMap>,
    /// Registries of the project-keyed sub-categories, keyed by (project, ID)
    pub project_fragments:
        HashMap<ProjectSubcategory, IndexMap<(EntityID, SubscenarioID), Fragment>>,
    /// Heat rate curve detail rows, keyed by (project, ID)
    pub heat_rate_curves: HashMap<(EntityID, SubscenarioID), Vec<HeatRateCurvePoint>>,
    /// Temporal detail tables, keyed by temporal subscenario ID
    pub temporal: HashMap<SubscenarioID, TemporalTables>,
}

impl SubscenarioStore {
    /// Look up a fragment in the registry
    pub fn fragment(&self, selector: SelectorRef) -> Option<&Fragment> {
        self.fragments.get(&selector.category)?.get(&selector.id)
    }

    /// All fragments registered for a category (empty if none)
    pub fn fragments_for(&self, category: SubscenarioCategory) -> impl Iterator<Item = &Fragment> {
        self.fragments
            .get(&category)
            .into_iter()
            .flat_map(|fragments| fragments.values())
    }

    /// Add a fragment to a category's registry, replacing any existing one with the same ID
    pub fn insert_fragment(&mut self, category: SubscenarioCategory, fragment: Fragment) {
        self.fragments
            .entry(category)
            .or_default()
            .insert(fragment.id, fragment);
    }

    /// The members of an entity-set fragment
    pub fn members(&self, selector: SelectorRef) -> Option<&EntitySet> {
        self.members.get(&selector)
    }

    /// The entity-to-zone assignments of a zone-map fragment
    pub fn zone_map(&self, selector: SelectorRef) -> Option<&ZoneMap> {
        self.zones.get(&selector)
    }

    /// The operational characteristics rows of a fragment
    pub fn operational_chars(&self, id: SubscenarioID) -> Option<&OperationalCharsMap> {
        self.operational_chars.get(&id)
    }

    /// Look up a project-keyed sub-fragment
    pub fn project_fragment(
        &self,
        subcategory: ProjectSubcategory,
        project: &EntityID,
        id: SubscenarioID,
    ) -> Option<&Fragment> {
        self.project_fragments
            .get(&subcategory)?
            .get(&(project.clone(), id))
    }

    /// The heat rate curve points of a project's heat rate sub-fragment (empty if none)
    pub fn heat_rate_curve(&self, project: &EntityID, id: SubscenarioID) -> &[HeatRateCurvePoint] {
        self.heat_rate_curves
            .get(&(project.clone(), id))
            .map_or(&[], Vec::as_slice)
    }

    /// The temporal detail tables of a temporal fragment
    pub fn temporal_tables(&self, id: SubscenarioID) -> Option<&TemporalTables> {
        self.temporal.get(&id)
    }

    /// The entities named by a fragment's detail rows, whatever form they take.
    ///
    /// For entity sets these are the members, for zone maps the entities being assigned and for
    /// operational characteristics the projects described.
    pub fn entities(&self, selector: SelectorRef) -> IndexSet<&EntityID> {
        let mut entities = IndexSet::new();
        if let Some(members) = self.members(selector) {
            entities.extend(members);
        }
        if let Some(zone_map) = self.zone_map(selector) {
            entities.extend(zone_map.keys());
        }
        if selector.category == SubscenarioCategory::ProjectOperationalChars {
            if let Some(chars) = self.operational_chars(selector.id) {
                entities.extend(chars.keys());
            }
        }
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::store;
    use rstest::rstest;

    fn selector(category: SubscenarioCategory, id: u32) -> SelectorRef {
        SelectorRef {
            category,
            id: SubscenarioID(id),
        }
    }

    #[rstest]
    fn fragment_lookup(store: SubscenarioStore) {
        let fragment = store
            .fragment(selector(SubscenarioCategory::Temporal, 1))
            .unwrap();
        assert_eq!(fragment.id, SubscenarioID(1));
        assert!(
            store
                .fragment(selector(SubscenarioCategory::Temporal, 99))
                .is_none()
        );
        assert!(
            store
                .fragment(selector(SubscenarioCategory::ElccSurface, 1))
                .is_none()
        );
    }

    #[rstest]
    fn entities_of_each_detail_kind(store: SubscenarioStore) {
        let portfolio = store.entities(selector(SubscenarioCategory::ProjectPortfolio, 1));
        assert_eq!(
            portfolio.iter().map(|e| e.as_str()).collect::<Vec<_>>(),
            ["gas_ct", "wind"]
        );

        let load_zones = store.entities(selector(SubscenarioCategory::ProjectLoadZones, 1));
        assert_eq!(load_zones.len(), 2);

        let chars = store.entities(selector(SubscenarioCategory::ProjectOperationalChars, 1));
        assert_eq!(chars.len(), 2);

        assert!(
            store
                .entities(selector(SubscenarioCategory::Load, 1))
                .is_empty()
        );
    }

    #[rstest]
    fn project_fragment_lookup(store: SubscenarioStore) {
        let gas_ct = EntityID::new("gas_ct");
        assert!(
            store
                .project_fragment(ProjectSubcategory::HeatRateCurves, &gas_ct, SubscenarioID(1))
                .is_some()
        );
        assert!(
            store
                .project_fragment(ProjectSubcategory::HeatRateCurves, &gas_ct, SubscenarioID(2))
                .is_none()
        );
        assert_eq!(store.heat_rate_curve(&gas_ct, SubscenarioID(1)).len(), 3);
        assert!(store.heat_rate_curve(&gas_ct, SubscenarioID(2)).is_empty());
    }

    #[test]
    fn sub_fragment_by_subcategory() {
        let chars = OperationalChars {
            project: "gas_ct".into(),
            operational_type: "gen_commit_cap".into(),
            heat_rate_curves_id: Some(SubscenarioID(1)),
            startup_chars_id: None,
            variable_generator_profile_id: None,
            hydro_operational_chars_id: Some(SubscenarioID(3)),
        };
        assert_eq!(
            chars.sub_fragment(ProjectSubcategory::HeatRateCurves),
            Some(SubscenarioID(1))
        );
        assert_eq!(chars.sub_fragment(ProjectSubcategory::StartupChars), None);
        assert_eq!(
            chars.sub_fragment(ProjectSubcategory::HydroOperationalChars),
            Some(SubscenarioID(3))
        );
    }
}
