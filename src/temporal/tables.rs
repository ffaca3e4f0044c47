//! Rows of the temporal detail tables of one temporal fragment.
//!
//! These are kept exactly as provided by the user: the resolver is responsible for checking them
//! against each other.
use super::{BalancingType, BoundaryType, HorizonID, TimepointID};

/// A row of `temporal_periods.csv`
#[derive(Clone, Debug, PartialEq)]
pub struct PeriodRow {
    /// The period (typically its first year)
    pub period: u32,
    /// Discount factor applied to costs in this period
    pub discount_factor: f64,
    /// The number of years this period represents
    pub number_years_represented: f64,
}

/// A row of `temporal_stages.csv`
#[derive(Clone, Debug, PartialEq)]
pub struct StageRow {
    /// The subproblem the stage belongs to
    pub subproblem_id: u32,
    /// The stage within the subproblem
    pub stage_id: u32,
    /// Human-readable name (e.g. "day-ahead")
    pub stage_name: String,
}

/// A row of `temporal_timepoints.csv`
#[derive(Clone, Debug, PartialEq)]
pub struct TimepointRow {
    /// The subproblem the timepoint belongs to
    pub subproblem_id: u32,
    /// The stage the timepoint belongs to
    pub stage_id: u32,
    /// The timepoint
    pub timepoint: TimepointID,
    /// The period the timepoint belongs to
    pub period: u32,
    /// The duration of the timepoint in hours
    pub number_of_hours_in_timepoint: f64,
    /// Expansion factor for objective function purposes
    pub timepoint_weight: f64,
    /// Non-positive index if this timepoint is linked to the following subproblem
    pub linked_timepoint: Option<i32>,
    /// Calendar month
    pub month: Option<u32>,
    /// Hour of the day
    pub hour_of_day: Option<f64>,
}

/// A row of `temporal_horizons.csv`
#[derive(Clone, Debug, PartialEq)]
pub struct HorizonRow {
    /// The subproblem the horizon belongs to
    pub subproblem_id: u32,
    /// The balancing type of the horizon (e.g. "day")
    pub balancing_type_horizon: BalancingType,
    /// The horizon
    pub horizon: HorizonID,
    /// Wraparound policy at the horizon's boundaries
    pub boundary: BoundaryType,
}

/// A row of `temporal_horizon_timepoints.csv`
#[derive(Clone, Debug, PartialEq)]
pub struct HorizonTimepointRow {
    /// The subproblem
    pub subproblem_id: u32,
    /// The stage
    pub stage_id: u32,
    /// The timepoint which is a member of the horizon
    pub timepoint: TimepointID,
    /// The balancing type of the horizon
    pub balancing_type_horizon: BalancingType,
    /// The horizon
    pub horizon: HorizonID,
}

/// A row of `temporal_horizon_timepoints_start_end.csv`
#[derive(Clone, Debug, PartialEq)]
pub struct HorizonStartEndRow {
    /// The subproblem
    pub subproblem_id: u32,
    /// The stage
    pub stage_id: u32,
    /// The balancing type of the horizon
    pub balancing_type_horizon: BalancingType,
    /// The horizon
    pub horizon: HorizonID,
    /// The first timepoint of the horizon
    pub tmp_start: TimepointID,
    /// The last timepoint of the horizon
    pub tmp_end: TimepointID,
}

/// All the temporal detail rows belonging to one temporal fragment
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemporalTables {
    /// Periods
    pub periods: Vec<PeriodRow>,
    /// Declared subproblems
    pub subproblems: Vec<u32>,
    /// Stages (a subproblem without any has the single default stage)
    pub stages: Vec<StageRow>,
    /// Timepoints
    pub timepoints: Vec<TimepointRow>,
    /// Horizons
    pub horizons: Vec<HorizonRow>,
    /// Direct horizon membership rows
    pub horizon_timepoints: Vec<HorizonTimepointRow>,
    /// Horizon start/end mapping (takes precedence over membership rows when present)
    pub horizon_start_end: Vec<HorizonStartEndRow>,
}
