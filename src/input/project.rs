//! Code for reading project operational characteristics and the project-keyed sub-fragments.
use super::{input_err_msg, read_csv_optional, try_insert};
use crate::category::SubscenarioID;
use crate::store::{
    EntityID, Fragment, HeatRateCurvePoint, OperationalChars, OperationalCharsMap,
    ProjectSubcategory,
};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use strum::IntoEnumIterator;

const OPERATIONAL_CHARS_FILE_NAME: &str = "project_operational_chars.csv";
const HEAT_RATE_CURVES_FILE_NAME: &str = "project_heat_rate_curves.csv";

/// Project sub-fragment registries, keyed by (project, ID)
type ProjectFragmentMap = IndexMap<(EntityID, SubscenarioID), Fragment>;

#[derive(Debug, PartialEq, Deserialize)]
struct OperationalCharsRaw {
    subscenario_id: u32,
    project: String,
    operational_type: String,
    heat_rate_curves_id: Option<u32>,
    startup_chars_id: Option<u32>,
    variable_generator_profile_id: Option<u32>,
    hydro_operational_chars_id: Option<u32>,
}

#[derive(Debug, PartialEq, Deserialize)]
struct ProjectFragmentRaw {
    project: String,
    subscenario_id: u32,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, PartialEq, Deserialize)]
struct HeatRateCurveRaw {
    project: String,
    subscenario_id: u32,
    period: u32,
    load_point_fraction: f64,
    average_heat_rate: f64,
}

/// The name of the registry file for a project sub-category
pub fn project_registry_file_name(subcategory: ProjectSubcategory) -> String {
    format!("subscenarios_{subcategory}.csv")
}

/// Read the operational characteristics rows of every fragment
pub fn read_operational_chars(
    store_dir: &Path,
) -> Result<HashMap<SubscenarioID, OperationalCharsMap>> {
    let file_path = store_dir.join(OPERATIONAL_CHARS_FILE_NAME);
    let chars_csv = read_csv_optional(&file_path)?;
    read_operational_chars_from_iter(chars_csv).with_context(|| input_err_msg(&file_path))
}

fn read_operational_chars_from_iter<I>(
    iter: I,
) -> Result<HashMap<SubscenarioID, OperationalCharsMap>>
where
    I: Iterator<Item = OperationalCharsRaw>,
{
    let mut map: HashMap<SubscenarioID, OperationalCharsMap> = HashMap::new();
    for raw in iter {
        ensure!(
            !raw.operational_type.is_empty(),
            "Project {} has no operational type",
            raw.project
        );
        let project: EntityID = raw.project.as_str().into();
        let chars = OperationalChars {
            project: project.clone(),
            operational_type: raw.operational_type,
            heat_rate_curves_id: raw.heat_rate_curves_id.map(SubscenarioID),
            startup_chars_id: raw.startup_chars_id.map(SubscenarioID),
            variable_generator_profile_id: raw.variable_generator_profile_id.map(SubscenarioID),
            hydro_operational_chars_id: raw.hydro_operational_chars_id.map(SubscenarioID),
        };
        let fragment = map.entry(SubscenarioID(raw.subscenario_id)).or_default();
        try_insert(fragment, &project, chars)?;
    }

    Ok(map)
}

/// Read the registries of the project sub-categories.
///
/// Sub-fragments are registered per project: the same ID may name different sub-fragments for
/// different projects.
pub fn read_project_fragments(
    store_dir: &Path,
) -> Result<HashMap<ProjectSubcategory, ProjectFragmentMap>> {
    let mut registries = HashMap::new();
    for subcategory in ProjectSubcategory::iter() {
        let file_path = store_dir.join(project_registry_file_name(subcategory));
        let fragments_csv = read_csv_optional(&file_path)?;
        let fragments = read_project_fragments_from_iter(fragments_csv)
            .with_context(|| input_err_msg(&file_path))?;
        if !fragments.is_empty() {
            registries.insert(subcategory, fragments);
        }
    }

    Ok(registries)
}

fn read_project_fragments_from_iter<I>(iter: I) -> Result<ProjectFragmentMap>
where
    I: Iterator<Item = ProjectFragmentRaw>,
{
    let mut fragments = ProjectFragmentMap::new();
    for raw in iter {
        let id = SubscenarioID(raw.subscenario_id);
        let fragment = Fragment {
            id,
            name: raw.name,
            description: raw.description,
        };
        try_insert(&mut fragments, &(raw.project.as_str().into(), id), fragment)?;
    }

    Ok(fragments)
}

/// Read the heat rate curve points of every heat rate sub-fragment
pub fn read_heat_rate_curves(
    store_dir: &Path,
) -> Result<HashMap<(EntityID, SubscenarioID), Vec<HeatRateCurvePoint>>> {
    let file_path = store_dir.join(HEAT_RATE_CURVES_FILE_NAME);
    let curves_csv = read_csv_optional(&file_path)?;
    read_heat_rate_curves_from_iter(curves_csv).with_context(|| input_err_msg(&file_path))
}

fn read_heat_rate_curves_from_iter<I>(
    iter: I,
) -> Result<HashMap<(EntityID, SubscenarioID), Vec<HeatRateCurvePoint>>>
where
    I: Iterator<Item = HeatRateCurveRaw>,
{
    let mut curves: HashMap<(EntityID, SubscenarioID), Vec<HeatRateCurvePoint>> = HashMap::new();
    for raw in iter {
        ensure!(
            raw.load_point_fraction > 0.0 && raw.load_point_fraction <= 1.0,
            "Load point fraction for project {} must be in the range (0, 1], got {}",
            raw.project,
            raw.load_point_fraction
        );
        ensure!(
            raw.average_heat_rate.is_finite() && raw.average_heat_rate > 0.0,
            "Average heat rate for project {} must be positive, got {}",
            raw.project,
            raw.average_heat_rate
        );

        let key = (EntityID::new(&raw.project), SubscenarioID(raw.subscenario_id));
        curves.entry(key).or_default().push(HeatRateCurvePoint {
            period: raw.period,
            load_point_fraction: raw.load_point_fraction,
            average_heat_rate: raw.average_heat_rate,
        });
    }

    Ok(curves)
}
