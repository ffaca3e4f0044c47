//! Code for reading the temporal detail tables.
//!
//! Every row carries the `temporal_scenario_id` of the fragment it belongs to. Rows are grouped by
//! fragment here; checking them against each other is left to the temporal resolver.
use super::read_csv_optional;
use crate::category::SubscenarioID;
use crate::temporal::tables::{
    HorizonRow, HorizonStartEndRow, HorizonTimepointRow, PeriodRow, StageRow, TemporalTables,
    TimepointRow,
};
use crate::temporal::{BalancingType, BoundaryType, HorizonID, TimepointID};
use anyhow::Result;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;

const PERIODS_FILE_NAME: &str = "temporal_periods.csv";
const SUBPROBLEMS_FILE_NAME: &str = "temporal_subproblems.csv";
const STAGES_FILE_NAME: &str = "temporal_stages.csv";
const TIMEPOINTS_FILE_NAME: &str = "temporal_timepoints.csv";
const HORIZONS_FILE_NAME: &str = "temporal_horizons.csv";
const HORIZON_TIMEPOINTS_FILE_NAME: &str = "temporal_horizon_timepoints.csv";
const HORIZON_START_END_FILE_NAME: &str = "temporal_horizon_timepoints_start_end.csv";

/// Temporal detail tables, keyed by temporal subscenario ID
pub type TemporalTablesMap = HashMap<SubscenarioID, TemporalTables>;

/// A raw row of one of the temporal files
trait TemporalRaw: DeserializeOwned + 'static {
    /// The row once separated from its fragment ID
    type Row;

    /// The name of the file the rows are read from
    const FILE_NAME: &'static str;

    /// Split the raw row into its fragment ID and the row proper
    fn split(self) -> (u32, Self::Row);

    /// The rows of this type in a fragment's tables
    fn rows(tables: &mut TemporalTables) -> &mut Vec<Self::Row>;
}

#[derive(Deserialize)]
struct PeriodRaw {
    temporal_scenario_id: u32,
    period: u32,
    discount_factor: f64,
    number_years_represented: f64,
}

impl TemporalRaw for PeriodRaw {
    type Row = PeriodRow;
    const FILE_NAME: &'static str = PERIODS_FILE_NAME;

    fn split(self) -> (u32, PeriodRow) {
        let row = PeriodRow {
            period: self.period,
            discount_factor: self.discount_factor,
            number_years_represented: self.number_years_represented,
        };
        (self.temporal_scenario_id, row)
    }

    fn rows(tables: &mut TemporalTables) -> &mut Vec<PeriodRow> {
        &mut tables.periods
    }
}

#[derive(Deserialize)]
struct SubproblemRaw {
    temporal_scenario_id: u32,
    subproblem_id: u32,
}

impl TemporalRaw for SubproblemRaw {
    type Row = u32;
    const FILE_NAME: &'static str = SUBPROBLEMS_FILE_NAME;

    fn split(self) -> (u32, u32) {
        (self.temporal_scenario_id, self.subproblem_id)
    }

    fn rows(tables: &mut TemporalTables) -> &mut Vec<u32> {
        &mut tables.subproblems
    }
}

#[derive(Deserialize)]
struct StageRaw {
    temporal_scenario_id: u32,
    subproblem_id: u32,
    stage_id: u32,
    #[serde(default)]
    stage_name: String,
}

impl TemporalRaw for StageRaw {
    type Row = StageRow;
    const FILE_NAME: &'static str = STAGES_FILE_NAME;

    fn split(self) -> (u32, StageRow) {
        let row = StageRow {
            subproblem_id: self.subproblem_id,
            stage_id: self.stage_id,
            stage_name: self.stage_name,
        };
        (self.temporal_scenario_id, row)
    }

    fn rows(tables: &mut TemporalTables) -> &mut Vec<StageRow> {
        &mut tables.stages
    }
}

#[derive(Deserialize)]
struct TimepointRaw {
    temporal_scenario_id: u32,
    subproblem_id: u32,
    stage_id: u32,
    timepoint: TimepointID,
    period: u32,
    number_of_hours_in_timepoint: f64,
    timepoint_weight: f64,
    #[serde(default)]
    linked_timepoint: Option<i32>,
    #[serde(default)]
    month: Option<u32>,
    #[serde(default)]
    hour_of_day: Option<f64>,
}

impl TemporalRaw for TimepointRaw {
    type Row = TimepointRow;
    const FILE_NAME: &'static str = TIMEPOINTS_FILE_NAME;

    fn split(self) -> (u32, TimepointRow) {
        let row = TimepointRow {
            subproblem_id: self.subproblem_id,
            stage_id: self.stage_id,
            timepoint: self.timepoint,
            period: self.period,
            number_of_hours_in_timepoint: self.number_of_hours_in_timepoint,
            timepoint_weight: self.timepoint_weight,
            linked_timepoint: self.linked_timepoint,
            month: self.month,
            hour_of_day: self.hour_of_day,
        };
        (self.temporal_scenario_id, row)
    }

    fn rows(tables: &mut TemporalTables) -> &mut Vec<TimepointRow> {
        &mut tables.timepoints
    }
}

#[derive(Deserialize)]
struct HorizonRaw {
    temporal_scenario_id: u32,
    subproblem_id: u32,
    balancing_type_horizon: BalancingType,
    horizon: HorizonID,
    boundary: BoundaryType,
}

impl TemporalRaw for HorizonRaw {
    type Row = HorizonRow;
    const FILE_NAME: &'static str = HORIZONS_FILE_NAME;

    fn split(self) -> (u32, HorizonRow) {
        let row = HorizonRow {
            subproblem_id: self.subproblem_id,
            balancing_type_horizon: self.balancing_type_horizon,
            horizon: self.horizon,
            boundary: self.boundary,
        };
        (self.temporal_scenario_id, row)
    }

    fn rows(tables: &mut TemporalTables) -> &mut Vec<HorizonRow> {
        &mut tables.horizons
    }
}

#[derive(Deserialize)]
struct HorizonTimepointRaw {
    temporal_scenario_id: u32,
    subproblem_id: u32,
    stage_id: u32,
    timepoint: TimepointID,
    balancing_type_horizon: BalancingType,
    horizon: HorizonID,
}

impl TemporalRaw for HorizonTimepointRaw {
    type Row = HorizonTimepointRow;
    const FILE_NAME: &'static str = HORIZON_TIMEPOINTS_FILE_NAME;

    fn split(self) -> (u32, HorizonTimepointRow) {
        let row = HorizonTimepointRow {
            subproblem_id: self.subproblem_id,
            stage_id: self.stage_id,
            timepoint: self.timepoint,
            balancing_type_horizon: self.balancing_type_horizon,
            horizon: self.horizon,
        };
        (self.temporal_scenario_id, row)
    }

    fn rows(tables: &mut TemporalTables) -> &mut Vec<HorizonTimepointRow> {
        &mut tables.horizon_timepoints
    }
}

#[derive(Deserialize)]
struct HorizonStartEndRaw {
    temporal_scenario_id: u32,
    subproblem_id: u32,
    stage_id: u32,
    balancing_type_horizon: BalancingType,
    horizon: HorizonID,
    tmp_start: TimepointID,
    tmp_end: TimepointID,
}

impl TemporalRaw for HorizonStartEndRaw {
    type Row = HorizonStartEndRow;
    const FILE_NAME: &'static str = HORIZON_START_END_FILE_NAME;

    fn split(self) -> (u32, HorizonStartEndRow) {
        let row = HorizonStartEndRow {
            subproblem_id: self.subproblem_id,
            stage_id: self.stage_id,
            balancing_type_horizon: self.balancing_type_horizon,
            horizon: self.horizon,
            tmp_start: self.tmp_start,
            tmp_end: self.tmp_end,
        };
        (self.temporal_scenario_id, row)
    }

    fn rows(tables: &mut TemporalTables) -> &mut Vec<HorizonStartEndRow> {
        &mut tables.horizon_start_end
    }
}

/// Read the temporal detail tables of every temporal fragment.
///
/// All of the temporal files are optional here. A temporal fragment with missing tables fails
/// when its hierarchy is resolved.
///
/// # Arguments
///
/// * `store_dir` - Folder containing the store's input files
pub fn read_temporal_tables(store_dir: &Path) -> Result<TemporalTablesMap> {
    let mut tables = TemporalTablesMap::new();
    read_temporal_file::<PeriodRaw>(store_dir, &mut tables)?;
    read_temporal_file::<SubproblemRaw>(store_dir, &mut tables)?;
    read_temporal_file::<StageRaw>(store_dir, &mut tables)?;
    read_temporal_file::<TimepointRaw>(store_dir, &mut tables)?;
    read_temporal_file::<HorizonRaw>(store_dir, &mut tables)?;
    read_temporal_file::<HorizonTimepointRaw>(store_dir, &mut tables)?;
    read_temporal_file::<HorizonStartEndRaw>(store_dir, &mut tables)?;

    Ok(tables)
}

fn read_temporal_file<R: TemporalRaw>(
    store_dir: &Path,
    tables: &mut TemporalTablesMap,
) -> Result<()> {
    let file_path = store_dir.join(R::FILE_NAME);
    let rows_csv = read_csv_optional::<R>(&file_path)?;
    read_temporal_rows_from_iter(rows_csv, tables);
    Ok(())
}

fn read_temporal_rows_from_iter<R, I>(iter: I, tables: &mut TemporalTablesMap)
where
    R: TemporalRaw,
    I: Iterator<Item = R>,
{
    for raw in iter {
        let (temporal_scenario_id, row) = raw.split();
        let fragment_tables = tables
            .entry(SubscenarioID(temporal_scenario_id))
            .or_default();
        R::rows(fragment_tables).push(row);
    }
}
