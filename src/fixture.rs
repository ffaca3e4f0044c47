//! Fixtures for tests
use crate::category::{SelectorRef, SubscenarioCategory, SubscenarioID};
use crate::feature::FeatureRequirements;
use crate::scenario::Scenario;
use crate::store::{
    EntityID, Fragment, HeatRateCurvePoint, OperationalChars, ProjectSubcategory,
    SubscenarioStore, ZoneMap,
};
use crate::temporal::tables::{HorizonRow, HorizonTimepointRow, PeriodRow, TimepointRow};
use crate::temporal::{BoundaryType, TemporalTables};
use indexmap::IndexSet;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

fn selector(category: SubscenarioCategory, id: u32) -> SelectorRef {
    SelectorRef {
        category,
        id: SubscenarioID(id),
    }
}

fn fragment(id: u32, name: &str) -> Fragment {
    Fragment {
        id: SubscenarioID(id),
        name: name.into(),
        description: String::new(),
    }
}

fn entity_set(ids: &[&str]) -> IndexSet<EntityID> {
    ids.iter().map(|&id| id.into()).collect()
}

fn zone_map(assignments: &[(&str, &str)]) -> ZoneMap {
    assignments
        .iter()
        .map(|&(entity, zone)| (entity.into(), entity_set(&[zone])))
        .collect()
}

/// A scenario selecting only the categories which are always required
#[fixture]
pub fn scenario() -> Scenario {
    let mut scenario = Scenario::new("base".into());
    scenario.description = "Base case".into();
    for category in [
        SubscenarioCategory::Temporal,
        SubscenarioCategory::LoadZones,
        SubscenarioCategory::Load,
        SubscenarioCategory::ProjectPortfolio,
        SubscenarioCategory::ProjectOperationalChars,
        SubscenarioCategory::ProjectLoadZones,
    ] {
        scenario
            .subscenarios
            .set(category, Some(SubscenarioID(1)));
    }
    scenario
}

/// The bundled feature requirements
#[fixture]
pub fn requirements() -> FeatureRequirements {
    FeatureRequirements::load(None).unwrap()
}

/// A single day of 24 hourly timepoints in one subproblem, with a circular "day" horizon
#[fixture]
pub fn temporal_tables() -> TemporalTables {
    let timepoints = (1..=24)
        .map(|timepoint| TimepointRow {
            subproblem_id: 1,
            stage_id: 1,
            timepoint,
            period: 2030,
            number_of_hours_in_timepoint: 1.0,
            timepoint_weight: 1.0,
            linked_timepoint: None,
            month: Some(1),
            hour_of_day: Some(f64::from(timepoint - 1)),
        })
        .collect();
    let horizon_timepoints = (1..=24)
        .map(|timepoint| HorizonTimepointRow {
            subproblem_id: 1,
            stage_id: 1,
            timepoint,
            balancing_type_horizon: "day".into(),
            horizon: "day-1".into(),
        })
        .collect();

    TemporalTables {
        periods: vec![PeriodRow {
            period: 2030,
            discount_factor: 1.0,
            number_years_represented: 1.0,
        }],
        subproblems: vec![1],
        stages: Vec::new(),
        timepoints,
        horizons: vec![HorizonRow {
            subproblem_id: 1,
            balancing_type_horizon: "day".into(),
            horizon: "day-1".into(),
            boundary: BoundaryType::Circular,
        }],
        horizon_timepoints,
        horizon_start_end: Vec::new(),
    }
}

/// A small store with a gas and a wind project in two load zones, plus an RPS zone
#[fixture]
pub fn store(temporal_tables: TemporalTables) -> SubscenarioStore {
    let mut store = SubscenarioStore::default();
    for (category, name) in [
        (SubscenarioCategory::Temporal, "one day"),
        (SubscenarioCategory::LoadZones, "two zones"),
        (SubscenarioCategory::Load, "flat load"),
        (SubscenarioCategory::ProjectPortfolio, "gas and wind"),
        (SubscenarioCategory::ProjectLoadZones, "base"),
        (SubscenarioCategory::ProjectOperationalChars, "base"),
        (SubscenarioCategory::RpsZones, "one zone"),
        (SubscenarioCategory::ProjectRpsZones, "wind only"),
        (SubscenarioCategory::RpsTarget, "50 percent"),
        (SubscenarioCategory::Tuning, "default"),
    ] {
        store.insert_fragment(category, fragment(1, name));
    }

    store.temporal.insert(SubscenarioID(1), temporal_tables);
    store.members.insert(
        selector(SubscenarioCategory::LoadZones, 1),
        entity_set(&["north", "south"]),
    );
    store.members.insert(
        selector(SubscenarioCategory::ProjectPortfolio, 1),
        entity_set(&["gas_ct", "wind"]),
    );
    store.members.insert(
        selector(SubscenarioCategory::RpsZones, 1),
        entity_set(&["rps_zone"]),
    );
    store.zones.insert(
        selector(SubscenarioCategory::ProjectLoadZones, 1),
        zone_map(&[("gas_ct", "north"), ("wind", "south")]),
    );
    store.zones.insert(
        selector(SubscenarioCategory::ProjectRpsZones, 1),
        zone_map(&[("wind", "rps_zone")]),
    );

    let gas_ct = OperationalChars {
        project: "gas_ct".into(),
        operational_type: "gen_commit_cap".into(),
        heat_rate_curves_id: Some(SubscenarioID(1)),
        startup_chars_id: None,
        variable_generator_profile_id: None,
        hydro_operational_chars_id: None,
    };
    let wind = OperationalChars {
        project: "wind".into(),
        operational_type: "gen_var".into(),
        heat_rate_curves_id: None,
        startup_chars_id: None,
        variable_generator_profile_id: Some(SubscenarioID(1)),
        hydro_operational_chars_id: None,
    };
    store.operational_chars.insert(
        SubscenarioID(1),
        [gas_ct, wind]
            .into_iter()
            .map(|chars| (chars.project.clone(), chars))
            .collect(),
    );

    store
        .project_fragments
        .entry(ProjectSubcategory::HeatRateCurves)
        .or_default()
        .insert(("gas_ct".into(), SubscenarioID(1)), fragment(1, "gas ct curve"));
    store
        .project_fragments
        .entry(ProjectSubcategory::VariableGeneratorProfiles)
        .or_default()
        .insert(("wind".into(), SubscenarioID(1)), fragment(1, "wind profile"));

    let point = |period, load_point_fraction, average_heat_rate| HeatRateCurvePoint {
        period,
        load_point_fraction,
        average_heat_rate,
    };
    store.heat_rate_curves.insert(
        ("gas_ct".into(), SubscenarioID(1)),
        vec![
            point(2030, 0.5, 11.0),
            point(2030, 1.0, 9.5),
            point(2040, 1.0, 9.0),
        ],
    );

    store
}
