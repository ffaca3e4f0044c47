//! The module responsible for writing the results of assembly to file.
use crate::assembler::ResolvedScenario;
use crate::temporal::{AdjacentTimepoint, TimepointID};
use crate::view::ScenarioView;
use crate::violation::Violation;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub mod metadata;
use metadata::write_metadata;

/// The output file name for the timepoint grid
const TIMEPOINTS_FILE_NAME: &str = "timepoints.csv";

/// The output file name for horizons
const HORIZONS_FILE_NAME: &str = "horizons.csv";

/// The output file name for the denormalised scenario view
const SCENARIO_VIEW_FILE_NAME: &str = "scenario_view.csv";

/// The output file name for the selected fragments
const FRAGMENTS_FILE_NAME: &str = "fragments.csv";

/// The output file name for the projects in scope
const PROJECTS_FILE_NAME: &str = "projects.csv";

/// The output file name for heat rate curves in scope
const HEAT_RATE_CURVES_FILE_NAME: &str = "heat_rate_curves.csv";

/// The output file name for warnings
const WARNINGS_FILE_NAME: &str = "warnings.csv";

/// Get the default output directory for a scenario of the specified store
pub fn get_output_dir(store_dir: &Path, scenario: &str, results_root: PathBuf) -> Result<PathBuf> {
    // Get the store name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let store_dir = store_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to store")?;

    let store_name = store_dir
        .file_name()
        .context("Store cannot be in root folder")?
        .to_str()
        .context("Invalid chars in store dir name")?;

    // Construct path
    Ok([results_root, store_name.into(), scenario.into()]
        .iter()
        .collect())
}

/// Create a new output directory for the scenario, optionally overwriting existing data
///
/// # Arguments
///
/// * `output_dir` - The output directory to create/overwrite
/// * `allow_overwrite` - Whether to delete and recreate the folder if it is non-empty
///
/// # Returns
///
/// True if the output dir contained existing data that was deleted, false if not, or an error.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    // If the folder already exists, then delete it
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Please delete the folder or pass the \
             --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir).context("Could not delete folder")?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// A row of `timepoints.csv`: one timepoint for one balancing type
#[derive(Serialize, Debug, PartialEq)]
struct TimepointRow<'a> {
    subproblem_id: u32,
    stage_id: u32,
    timepoint: TimepointID,
    period: u32,
    number_of_hours_in_timepoint: f64,
    timepoint_weight: f64,
    linked_timepoint: Option<i32>,
    month: Option<u32>,
    hour_of_day: Option<f64>,
    balancing_type: &'a str,
    horizon: &'a str,
    previous_timepoint: Option<String>,
    next_timepoint: Option<String>,
}

/// A row of `horizons.csv`
#[derive(Serialize, Debug, PartialEq)]
struct HorizonRow<'a> {
    subproblem_id: u32,
    stage_id: u32,
    balancing_type: &'a str,
    horizon: &'a str,
    declared_boundary: String,
    boundary: String,
    tmp_start: Option<TimepointID>,
    tmp_end: Option<TimepointID>,
    number_of_timepoints: usize,
    duration_hours: f64,
}

/// A row of `fragments.csv`
#[derive(Serialize, Debug, PartialEq)]
struct FragmentRow<'a> {
    category: String,
    subscenario_id: u32,
    name: &'a str,
    description: &'a str,
}

/// A row of `projects.csv`
#[derive(Serialize, Debug, PartialEq)]
struct ProjectRow<'a> {
    project: &'a str,
    load_zones: String,
    operational_type: Option<&'a str>,
}

/// A row of `heat_rate_curves.csv`
#[derive(Serialize, Debug, PartialEq)]
struct HeatRateCurveRow<'a> {
    project: &'a str,
    period: u32,
    load_point_fraction: f64,
    average_heat_rate: f64,
}

fn adjacent_to_string(adjacent: Option<AdjacentTimepoint>) -> Option<String> {
    adjacent.map(|adjacent| adjacent.to_string())
}

/// Writes the results of assembling one scenario
pub struct ScenarioWriter {
    output_path: PathBuf,
}

impl ScenarioWriter {
    /// Create a new writer for the given output folder, which must already exist
    pub fn new(output_path: &Path) -> Self {
        Self {
            output_path: output_path.to_path_buf(),
        }
    }

    fn create_writer(&self, file_name: &str) -> Result<csv::Writer<fs::File>> {
        let file_path = self.output_path.join(file_name);
        csv::Writer::from_path(&file_path)
            .with_context(|| format!("Could not create {}", file_path.display()))
    }

    /// Write every output file for a resolved scenario
    pub fn write_all(
        &self,
        store_dir: &Path,
        resolved: &ResolvedScenario,
        view: &ScenarioView,
    ) -> Result<()> {
        write_metadata(&self.output_path, store_dir, resolved)?;
        self.write_timepoints(resolved)?;
        self.write_horizons(resolved)?;
        self.write_scenario_view(view)?;
        self.write_fragments(resolved)?;
        self.write_projects(resolved)?;
        self.write_warnings(resolved.warnings.iter())?;
        Ok(())
    }

    /// Write the timepoint grid: one row per timepoint and balancing type
    pub fn write_timepoints(&self, resolved: &ResolvedScenario) -> Result<()> {
        let mut writer = self.create_writer(TIMEPOINTS_FILE_NAME)?;
        for grid in resolved.iter_stage_grids() {
            let stage = grid.stage;
            for (balancing_type, links) in &stage.links {
                for (id, timepoint_links) in links {
                    let timepoint = &stage.timepoints[id];
                    writer.serialize(TimepointRow {
                        subproblem_id: grid.subproblem,
                        stage_id: stage.id,
                        timepoint: *id,
                        period: timepoint.period,
                        number_of_hours_in_timepoint: timepoint.hours,
                        timepoint_weight: timepoint.weight,
                        linked_timepoint: timepoint.linked_timepoint,
                        month: timepoint.month,
                        hour_of_day: timepoint.hour_of_day,
                        balancing_type: balancing_type.as_str(),
                        horizon: timepoint_links.horizon.as_str(),
                        previous_timepoint: adjacent_to_string(timepoint_links.previous),
                        next_timepoint: adjacent_to_string(timepoint_links.next),
                    })?;
                }
            }
        }
        writer.flush()?;

        Ok(())
    }

    /// Write the horizons of every stage
    pub fn write_horizons(&self, resolved: &ResolvedScenario) -> Result<()> {
        let mut writer = self.create_writer(HORIZONS_FILE_NAME)?;
        for grid in resolved.iter_stage_grids() {
            for (balancing_type, horizons) in &grid.stage.horizons {
                for horizon in horizons {
                    writer.serialize(HorizonRow {
                        subproblem_id: grid.subproblem,
                        stage_id: grid.stage.id,
                        balancing_type: balancing_type.as_str(),
                        horizon: horizon.id.as_str(),
                        declared_boundary: horizon.declared_boundary.to_string(),
                        boundary: horizon.boundary.to_string(),
                        tmp_start: horizon.timepoints.first().copied(),
                        tmp_end: horizon.timepoints.last().copied(),
                        number_of_timepoints: horizon.timepoints.len(),
                        duration_hours: horizon.duration_hours,
                    })?;
                }
            }
        }
        writer.flush()?;

        Ok(())
    }

    /// Write the denormalised scenario view
    pub fn write_scenario_view(&self, view: &ScenarioView) -> Result<()> {
        let mut writer = self.create_writer(SCENARIO_VIEW_FILE_NAME)?;
        for row in &view.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Write the selected fragments
    pub fn write_fragments(&self, resolved: &ResolvedScenario) -> Result<()> {
        let mut writer = self.create_writer(FRAGMENTS_FILE_NAME)?;
        for selected in &resolved.fragments {
            writer.serialize(FragmentRow {
                category: selected.category.to_string(),
                subscenario_id: selected.fragment.id.0,
                name: &selected.fragment.name,
                description: &selected.fragment.description,
            })?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Write the projects in scope and their heat rate curves
    pub fn write_projects(&self, resolved: &ResolvedScenario) -> Result<()> {
        let mut projects_writer = self.create_writer(PROJECTS_FILE_NAME)?;
        let mut curves_writer = self.create_writer(HEAT_RATE_CURVES_FILE_NAME)?;
        for (project, scoped) in &resolved.projects {
            projects_writer.serialize(ProjectRow {
                project: project.as_str(),
                load_zones: scoped.load_zones.iter().join(";"),
                operational_type: scoped
                    .operational_chars
                    .as_ref()
                    .map(|chars| chars.operational_type.as_str()),
            })?;
            for point in &scoped.heat_rate_curve {
                curves_writer.serialize(HeatRateCurveRow {
                    project: project.as_str(),
                    period: point.period,
                    load_point_fraction: point.load_point_fraction,
                    average_heat_rate: point.average_heat_rate,
                })?;
            }
        }
        projects_writer.flush()?;
        curves_writer.flush()?;

        Ok(())
    }

    /// Write violations which didn't block assembly
    pub fn write_warnings<'a, I>(&self, warnings: I) -> Result<()>
    where
        I: Iterator<Item = &'a Violation>,
    {
        let mut writer = self.create_writer(WARNINGS_FILE_NAME)?;
        for warning in warnings {
            writer.serialize(warning)?;
        }
        writer.flush()?;

        Ok(())
    }
}
