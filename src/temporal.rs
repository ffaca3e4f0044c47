//! The temporal hierarchy: periods, subproblems, stages, horizons and timepoints.
//!
//! A temporal fragment is stored as a set of flat tables (see [`tables`]). Resolving it checks the
//! tables against each other and builds the tree which the optimiser is indexed against, including
//! the previous and next timepoint of every timepoint for each balancing type.
use crate::category::SubscenarioID;
use crate::id::define_id_type;
use indexmap::{IndexMap, IndexSet};
use serde_string_enum::DeserializeLabeledStringEnum;
use std::collections::HashMap;
use std::fmt::{self, Display};

mod error;
mod horizon;
mod linked;
pub mod tables;
pub use error::{HierarchyLocation, TemporalError, TemporalErrorKind};
use horizon::LinkedSource;
use tables::{PeriodRow, StageRow, TimepointRow};
pub use tables::TemporalTables;

/// The ID of a timepoint. Always positive, so it can't be confused with a linked index.
pub type TimepointID = u32;

define_id_type! {BalancingType}
define_id_type! {HorizonID}

/// What happens at the edges of a horizon
#[derive(Clone, Copy, Debug, PartialEq, Eq, DeserializeLabeledStringEnum)]
pub enum BoundaryType {
    /// The last timepoint wraps around to the first
    #[string = "circular"]
    Circular,
    /// The first timepoint has no predecessor and the last no successor
    #[string = "linear"]
    Linear,
    /// The first timepoint is preceded by the previous subproblem's linked timepoints
    #[string = "linked"]
    Linked,
}

impl Display for BoundaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Circular => "circular",
            Self::Linear => "linear",
            Self::Linked => "linked",
        };
        write!(f, "{s}")
    }
}

/// A period, shared by every subproblem of a temporal fragment
#[derive(Clone, Debug, PartialEq)]
pub struct Period {
    /// The period (typically its first year)
    pub period: u32,
    /// Discount factor applied to costs in this period
    pub discount_factor: f64,
    /// The number of years the period represents
    pub number_years_represented: f64,
}

/// The smallest unit of time in the optimisation
#[derive(Clone, Debug, PartialEq)]
pub struct Timepoint {
    /// The timepoint ID
    pub id: TimepointID,
    /// The period the timepoint belongs to
    pub period: u32,
    /// Duration in hours
    pub hours: f64,
    /// Expansion factor for objective function purposes
    pub weight: f64,
    /// Index of this timepoint in the chain handed to the next subproblem, if any
    pub linked_timepoint: Option<i32>,
    /// Calendar month
    pub month: Option<u32>,
    /// Hour of the day
    pub hour_of_day: Option<f64>,
}

/// The neighbour of a timepoint within a horizon
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdjacentTimepoint {
    /// A timepoint of the same stage
    Timepoint(TimepointID),
    /// A linked timepoint carried over from the previous subproblem
    Linked(i32),
}

impl Display for AdjacentTimepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timepoint(id) => write!(f, "{id}"),
            Self::Linked(index) => write!(f, "{index}"),
        }
    }
}

/// A contiguous block of timepoints over which a balancing constraint applies
#[derive(Clone, Debug, PartialEq)]
pub struct Horizon {
    /// The balancing type (e.g. "day" or "year")
    pub balancing_type: BalancingType,
    /// The horizon ID
    pub id: HorizonID,
    /// The boundary given in the input
    pub declared_boundary: BoundaryType,
    /// The boundary actually applied.
    ///
    /// This is [`BoundaryType::Linear`] when a `linked` boundary cannot apply, because the horizon
    /// is not the first of its subproblem or there is no previous subproblem.
    pub boundary: BoundaryType,
    /// The horizon's timepoints, in order
    pub timepoints: Vec<TimepointID>,
    /// Total duration of the horizon in hours
    pub duration_hours: f64,
}

/// A timepoint's position within its horizon for one balancing type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimepointLinks {
    /// The horizon containing the timepoint
    pub horizon: HorizonID,
    /// The preceding timepoint, if any
    pub previous: Option<AdjacentTimepoint>,
    /// The following timepoint, if any
    pub next: Option<AdjacentTimepoint>,
}

/// A timepoint carried from one subproblem into the next
#[derive(Clone, Debug, PartialEq)]
pub struct LinkedTimepoint {
    /// The (non-positive) linked index
    pub index: i32,
    /// The timepoint in the subproblem which provides it
    pub timepoint: Timepoint,
}

/// A refinement of a subproblem (e.g. day-ahead then real-time)
#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    /// The stage ID
    pub id: u32,
    /// Human-readable name
    pub name: String,
    /// The stage's timepoints, ordered by ID
    pub timepoints: IndexMap<TimepointID, Timepoint>,
    /// Horizons for each balancing type, ordered by their first timepoint
    pub horizons: IndexMap<BalancingType, Vec<Horizon>>,
    /// Neighbours of each timepoint for each balancing type
    pub links: IndexMap<BalancingType, IndexMap<TimepointID, TimepointLinks>>,
    /// Timepoints this stage hands on to the next subproblem, ordered 0, -1, -2, ...
    pub linked_timepoints: Vec<LinkedTimepoint>,
    /// Timepoints from the previous subproblem preceding this stage, ordered 0, -1, -2, ...
    ///
    /// Empty unless the stage has a horizon with an effective `linked` boundary.
    pub linked_predecessors: Vec<LinkedTimepoint>,
}

impl Stage {
    /// The balancing types defined for this stage
    pub fn balancing_types(&self) -> impl Iterator<Item = &BalancingType> {
        self.horizons.keys()
    }

    fn timepoint_links(
        &self,
        timepoint: TimepointID,
        balancing_type: &BalancingType,
    ) -> Option<&TimepointLinks> {
        self.links.get(balancing_type)?.get(&timepoint)
    }

    /// The horizon containing a timepoint for the given balancing type
    pub fn horizon_of(
        &self,
        timepoint: TimepointID,
        balancing_type: &BalancingType,
    ) -> Option<&HorizonID> {
        Some(&self.timepoint_links(timepoint, balancing_type)?.horizon)
    }

    /// The timepoint preceding a timepoint for the given balancing type
    pub fn previous(
        &self,
        timepoint: TimepointID,
        balancing_type: &BalancingType,
    ) -> Option<AdjacentTimepoint> {
        self.timepoint_links(timepoint, balancing_type)?.previous
    }

    /// The timepoint following a timepoint for the given balancing type
    pub fn next(
        &self,
        timepoint: TimepointID,
        balancing_type: &BalancingType,
    ) -> Option<AdjacentTimepoint> {
        self.timepoint_links(timepoint, balancing_type)?.next
    }

    /// The predecessor of a linked predecessor, continuing the chain 0, -1, -2, ...
    pub fn linked_predecessor(&self, index: i32) -> Option<AdjacentTimepoint> {
        let earliest = self.linked_predecessors.last()?.index;
        (index > earliest && index <= 0).then_some(AdjacentTimepoint::Linked(index - 1))
    }
}

/// A subproblem, solved independently of (but possibly linked to) the others
#[derive(Clone, Debug, PartialEq)]
pub struct Subproblem {
    /// The subproblem ID
    pub id: u32,
    /// The subproblem's stages, ordered by ID
    pub stages: IndexMap<u32, Stage>,
}

/// The resolved temporal structure of one temporal fragment
#[derive(Clone, Debug, PartialEq)]
pub struct TemporalHierarchy {
    /// The temporal fragment this hierarchy was resolved from
    pub temporal_scenario_id: SubscenarioID,
    /// The periods, ordered by period
    pub periods: IndexMap<u32, Period>,
    /// The subproblems, ordered by ID
    pub subproblems: IndexMap<u32, Subproblem>,
}

impl TemporalHierarchy {
    /// Iterate over every (subproblem, stage) pair in order
    pub fn iter_stages(&self) -> impl Iterator<Item = (&Subproblem, &Stage)> {
        self.subproblems
            .values()
            .flat_map(|subproblem| subproblem.stages.values().map(move |stage| (subproblem, stage)))
    }

    /// Look up a stage
    pub fn stage(&self, subproblem: u32, stage: u32) -> Option<&Stage> {
        self.subproblems.get(&subproblem)?.stages.get(&stage)
    }

    /// The largest number of stages in any subproblem
    pub fn max_stage_count(&self) -> usize {
        self.subproblems
            .values()
            .map(|subproblem| subproblem.stages.len())
            .max()
            .unwrap_or(0)
    }
}

/// Resolve the temporal hierarchy of a temporal fragment.
///
/// Resolution stops at the first structural problem: no partial hierarchy is returned.
pub fn resolve_temporal_hierarchy(
    temporal_scenario_id: SubscenarioID,
    tables: &TemporalTables,
) -> Result<TemporalHierarchy, TemporalError> {
    let location = HierarchyLocation::fragment(temporal_scenario_id);
    let periods = build_periods(&location, &tables.periods)?;
    let subproblem_ids = build_subproblem_ids(&location, &tables.subproblems)?;
    let stage_names = build_stage_names(&location, &subproblem_ids, &tables.stages)?;
    let mut timepoints = build_timepoints(&location, &periods, &stage_names, &tables.timepoints)?;
    let declarations = horizon::declare_horizons(&location, &subproblem_ids, &tables.horizons)?;
    let mut membership =
        horizon::assign_timepoints(&location, tables, &stage_names, &timepoints, &declarations)?;

    // Every timepoint needs a horizon for every balancing type used anywhere in the fragment
    let balancing_types: IndexSet<_> = declarations
        .values()
        .flat_map(|declared| declared.keys().cloned())
        .collect();

    let no_horizons = IndexMap::new();
    let mut subproblems: IndexMap<u32, Subproblem> = IndexMap::new();
    for (&subproblem_id, names) in &stage_names {
        let previous = subproblems.last().map(|(_, subproblem)| subproblem);
        let mut stages = IndexMap::new();
        for (&stage_id, name) in names {
            let stage_location = location.subproblem(subproblem_id).stage(stage_id);
            let stage_timepoints = timepoints
                .remove(&(subproblem_id, stage_id))
                .unwrap_or_default();
            if stage_timepoints.is_empty() {
                return Err(TemporalError::new(
                    stage_location,
                    TemporalErrorKind::NoTimepoints,
                ));
            }

            let linked_timepoints =
                linked::collect_linked_timepoints(&stage_location, &stage_timepoints)?;
            let linked_source = match previous {
                None => LinkedSource::FirstSubproblem,
                Some(previous) => LinkedSource::Previous {
                    subproblem: previous.id,
                    linked: previous
                        .stages
                        .get(&stage_id)
                        .map_or(&[][..], |stage| &stage.linked_timepoints),
                },
            };
            let grid = horizon::build_stage_grid(
                &stage_location,
                &stage_timepoints,
                &balancing_types,
                declarations.get(&subproblem_id).unwrap_or(&no_horizons),
                membership
                    .remove(&(subproblem_id, stage_id))
                    .unwrap_or_default(),
                linked_source,
            )?;

            stages.insert(
                stage_id,
                Stage {
                    id: stage_id,
                    name: name.clone(),
                    timepoints: stage_timepoints,
                    horizons: grid.horizons,
                    links: grid.links,
                    linked_timepoints,
                    linked_predecessors: grid.linked_predecessors,
                },
            );
        }

        // Stages of a subproblem share one horizon structure
        if let Some((&first_id, first)) = stages.first() {
            for (&stage_id, stage) in stages.iter().skip(1) {
                horizon::check_same_horizons(
                    &location.subproblem(subproblem_id).stage(stage_id),
                    first_id,
                    &first.horizons,
                    &stage.horizons,
                )?;
            }
        }

        subproblems.insert(
            subproblem_id,
            Subproblem {
                id: subproblem_id,
                stages,
            },
        );
    }

    Ok(TemporalHierarchy {
        temporal_scenario_id,
        periods,
        subproblems,
    })
}

fn is_finite_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn build_periods(
    location: &HierarchyLocation,
    rows: &[PeriodRow],
) -> Result<IndexMap<u32, Period>, TemporalError> {
    let fail = |kind| Err(TemporalError::new(location.clone(), kind));
    if rows.is_empty() {
        return fail(TemporalErrorKind::NoPeriods);
    }

    let mut periods = IndexMap::new();
    for row in rows {
        for (field, value) in [
            ("discount_factor", row.discount_factor),
            ("number_years_represented", row.number_years_represented),
        ] {
            if !is_finite_positive(value) {
                return fail(TemporalErrorKind::InvalidPeriodValue {
                    period: row.period,
                    field,
                    value,
                });
            }
        }

        let period = Period {
            period: row.period,
            discount_factor: row.discount_factor,
            number_years_represented: row.number_years_represented,
        };
        if periods.insert(row.period, period).is_some() {
            return fail(TemporalErrorKind::DuplicatePeriod(row.period));
        }
    }
    periods.sort_keys();

    Ok(periods)
}

fn build_subproblem_ids(
    location: &HierarchyLocation,
    rows: &[u32],
) -> Result<IndexSet<u32>, TemporalError> {
    if rows.is_empty() {
        return Err(TemporalError::new(
            location.clone(),
            TemporalErrorKind::NoSubproblems,
        ));
    }

    let mut ids = IndexSet::new();
    for &id in rows {
        if !ids.insert(id) {
            return Err(TemporalError::new(
                location.subproblem(id),
                TemporalErrorKind::DuplicateSubproblem,
            ));
        }
    }
    ids.sort();

    Ok(ids)
}

/// Stage names for each subproblem, both ordered by ID
type StageNames = IndexMap<u32, IndexMap<u32, String>>;

/// The default stage of a subproblem without explicit stages
const DEFAULT_STAGE: u32 = 1;

fn build_stage_names(
    location: &HierarchyLocation,
    subproblem_ids: &IndexSet<u32>,
    rows: &[StageRow],
) -> Result<StageNames, TemporalError> {
    let mut names: StageNames = subproblem_ids
        .iter()
        .map(|&id| (id, IndexMap::new()))
        .collect();

    for row in rows {
        let subproblem_location = location.subproblem(row.subproblem_id);
        let Some(stages) = names.get_mut(&row.subproblem_id) else {
            return Err(TemporalError::new(
                subproblem_location,
                TemporalErrorKind::UndeclaredSubproblem,
            ));
        };
        if stages
            .insert(row.stage_id, row.stage_name.clone())
            .is_some()
        {
            return Err(TemporalError::new(
                subproblem_location.stage(row.stage_id),
                TemporalErrorKind::DuplicateStage,
            ));
        }
    }

    for stages in names.values_mut() {
        if stages.is_empty() {
            stages.insert(DEFAULT_STAGE, String::new());
        }
        stages.sort_keys();
    }

    Ok(names)
}

/// Timepoints for each (subproblem, stage), ordered by ID
type StageTimepoints = HashMap<(u32, u32), IndexMap<TimepointID, Timepoint>>;

fn build_timepoints(
    location: &HierarchyLocation,
    periods: &IndexMap<u32, Period>,
    stage_names: &StageNames,
    rows: &[TimepointRow],
) -> Result<StageTimepoints, TemporalError> {
    let mut timepoints: StageTimepoints = HashMap::new();
    for row in rows {
        let subproblem_location = location.subproblem(row.subproblem_id);
        let Some(stages) = stage_names.get(&row.subproblem_id) else {
            return Err(TemporalError::new(
                subproblem_location,
                TemporalErrorKind::UndeclaredSubproblem,
            ));
        };
        let stage_location = subproblem_location.stage(row.stage_id);
        let fail = |kind| Err(TemporalError::new(stage_location.clone(), kind));
        if !stages.contains_key(&row.stage_id) {
            return fail(TemporalErrorKind::UndeclaredStage);
        }
        if row.timepoint == 0 {
            return fail(TemporalErrorKind::NonPositiveTimepoint(row.timepoint));
        }
        if !periods.contains_key(&row.period) {
            return fail(TemporalErrorKind::UndeclaredPeriod {
                timepoint: row.timepoint,
                period: row.period,
            });
        }
        for (field, value) in [
            ("number_of_hours_in_timepoint", row.number_of_hours_in_timepoint),
            ("timepoint_weight", row.timepoint_weight),
        ] {
            if !is_finite_positive(value) {
                return fail(TemporalErrorKind::InvalidTimepointValue {
                    timepoint: row.timepoint,
                    field,
                    value,
                });
            }
        }

        let timepoint = Timepoint {
            id: row.timepoint,
            period: row.period,
            hours: row.number_of_hours_in_timepoint,
            weight: row.timepoint_weight,
            linked_timepoint: row.linked_timepoint,
            month: row.month,
            hour_of_day: row.hour_of_day,
        };
        if timepoints
            .entry((row.subproblem_id, row.stage_id))
            .or_default()
            .insert(row.timepoint, timepoint)
            .is_some()
        {
            return fail(TemporalErrorKind::DuplicateTimepoint(row.timepoint));
        }
    }

    for stage_timepoints in timepoints.values_mut() {
        stage_timepoints.sort_keys();
    }

    Ok(timepoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::temporal_tables;
    use float_cmp::approx_eq;
    use rstest::rstest;
    use tables::{HorizonRow, HorizonStartEndRow, HorizonTimepointRow};

    fn resolve(tables: &TemporalTables) -> Result<TemporalHierarchy, TemporalError> {
        resolve_temporal_hierarchy(SubscenarioID(1), tables)
    }

    fn day() -> BalancingType {
        "day".into()
    }

    fn timepoint_row(subproblem_id: u32, stage_id: u32, timepoint: TimepointID) -> TimepointRow {
        TimepointRow {
            subproblem_id,
            stage_id,
            timepoint,
            period: 2030,
            number_of_hours_in_timepoint: 1.0,
            timepoint_weight: 1.0,
            linked_timepoint: None,
            month: Some(1),
            hour_of_day: Some(f64::from(timepoint)),
        }
    }

    /// Subproblems of four timepoints each, every one with a single "day" horizon
    fn subproblem_tables(count: u32, boundary: BoundaryType) -> TemporalTables {
        let mut tables = TemporalTables {
            periods: vec![PeriodRow {
                period: 2030,
                discount_factor: 1.0,
                number_years_represented: 1.0,
            }],
            subproblems: (1..=count).collect(),
            ..Default::default()
        };
        for subproblem_id in 1..=count {
            let horizon: HorizonID = format!("day-{subproblem_id}").into();
            tables.horizons.push(HorizonRow {
                subproblem_id,
                balancing_type_horizon: day(),
                horizon: horizon.clone(),
                boundary,
            });
            let first = (subproblem_id - 1) * 4 + 1;
            for timepoint in first..first + 4 {
                let mut row = timepoint_row(subproblem_id, 1, timepoint);
                // The last two timepoints are carried into the next subproblem
                if timepoint == first + 2 {
                    row.linked_timepoint = Some(-1);
                } else if timepoint == first + 3 {
                    row.linked_timepoint = Some(0);
                }
                tables.timepoints.push(row);
                tables.horizon_timepoints.push(HorizonTimepointRow {
                    subproblem_id,
                    stage_id: 1,
                    timepoint,
                    balancing_type_horizon: day(),
                    horizon: horizon.clone(),
                });
            }
        }
        tables
    }

    #[rstest]
    fn circular_day(temporal_tables: TemporalTables) {
        let hierarchy = resolve(&temporal_tables).unwrap();
        assert_eq!(hierarchy.periods.len(), 1);
        assert!(approx_eq!(f64, hierarchy.periods[&2030].discount_factor, 1.0));
        assert_eq!(hierarchy.max_stage_count(), 1);

        let stage = hierarchy.stage(1, 1).unwrap();
        assert_eq!(stage.timepoints.len(), 24);
        assert_eq!(stage.previous(1, &day()), Some(AdjacentTimepoint::Timepoint(24)));
        assert_eq!(stage.next(24, &day()), Some(AdjacentTimepoint::Timepoint(1)));
        assert_eq!(stage.previous(5, &day()), Some(AdjacentTimepoint::Timepoint(4)));
        assert_eq!(stage.horizon_of(12, &day()).unwrap().as_str(), "day-1");

        let horizon = &stage.horizons[&day()][0];
        assert_eq!(horizon.boundary, BoundaryType::Circular);
        assert!(approx_eq!(f64, horizon.duration_hours, 24.0));
        assert!(stage.linked_predecessors.is_empty());
    }

    #[rstest]
    fn linear_day(mut temporal_tables: TemporalTables) {
        temporal_tables.horizons[0].boundary = BoundaryType::Linear;
        let hierarchy = resolve(&temporal_tables).unwrap();
        let stage = hierarchy.stage(1, 1).unwrap();
        assert_eq!(stage.previous(1, &day()), None);
        assert_eq!(stage.next(24, &day()), None);
        assert_eq!(stage.next(1, &day()), Some(AdjacentTimepoint::Timepoint(2)));
    }

    #[rstest]
    fn resolution_is_deterministic(temporal_tables: TemporalTables) {
        assert_eq!(resolve(&temporal_tables), resolve(&temporal_tables));
    }

    #[rstest]
    fn timepoints_ordered_by_id(mut temporal_tables: TemporalTables) {
        temporal_tables.timepoints.reverse();
        let hierarchy = resolve(&temporal_tables).unwrap();
        let stage = hierarchy.stage(1, 1).unwrap();
        assert!(stage.timepoints.keys().copied().eq(1..=24));
        assert_eq!(stage.previous(1, &day()), Some(AdjacentTimepoint::Timepoint(24)));
    }

    #[rstest]
    fn no_periods(mut temporal_tables: TemporalTables) {
        temporal_tables.periods.clear();
        let err = resolve(&temporal_tables).unwrap_err();
        assert_eq!(err.kind, TemporalErrorKind::NoPeriods);
        assert_eq!(err.location, HierarchyLocation::fragment(SubscenarioID(1)));
    }

    #[rstest]
    fn no_subproblems(mut temporal_tables: TemporalTables) {
        temporal_tables.subproblems.clear();
        assert_eq!(
            resolve(&temporal_tables).unwrap_err().kind,
            TemporalErrorKind::NoSubproblems
        );
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn invalid_discount_factor(mut temporal_tables: TemporalTables, #[case] value: f64) {
        temporal_tables.periods[0].discount_factor = value;
        assert!(matches!(
            resolve(&temporal_tables).unwrap_err().kind,
            TemporalErrorKind::InvalidPeriodValue {
                field: "discount_factor",
                ..
            }
        ));
    }

    #[rstest]
    fn undeclared_period(mut temporal_tables: TemporalTables) {
        temporal_tables.timepoints[3].period = 2040;
        let err = resolve(&temporal_tables).unwrap_err();
        assert_eq!(
            err.kind,
            TemporalErrorKind::UndeclaredPeriod {
                timepoint: 4,
                period: 2040
            }
        );
        assert_eq!(err.location.subproblem, Some(1));
        assert_eq!(err.location.stage, Some(1));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-0.5)]
    #[case(f64::NAN)]
    fn invalid_timepoint_weight(mut temporal_tables: TemporalTables, #[case] value: f64) {
        temporal_tables.timepoints[0].timepoint_weight = value;
        assert!(matches!(
            resolve(&temporal_tables).unwrap_err().kind,
            TemporalErrorKind::InvalidTimepointValue {
                timepoint: 1,
                field: "timepoint_weight",
                ..
            }
        ));
    }

    #[rstest]
    fn duplicate_timepoint(mut temporal_tables: TemporalTables) {
        temporal_tables.timepoints.push(timepoint_row(1, 1, 3));
        assert_eq!(
            resolve(&temporal_tables).unwrap_err().kind,
            TemporalErrorKind::DuplicateTimepoint(3)
        );
    }

    #[rstest]
    fn zero_timepoint(mut temporal_tables: TemporalTables) {
        temporal_tables.timepoints.push(timepoint_row(1, 1, 0));
        assert_eq!(
            resolve(&temporal_tables).unwrap_err().kind,
            TemporalErrorKind::NonPositiveTimepoint(0)
        );
    }

    #[rstest]
    fn timepoint_in_undeclared_stage(mut temporal_tables: TemporalTables) {
        temporal_tables.timepoints.push(timepoint_row(1, 2, 25));
        let err = resolve(&temporal_tables).unwrap_err();
        assert_eq!(err.kind, TemporalErrorKind::UndeclaredStage);
        assert_eq!(err.location.stage, Some(2));
    }

    #[rstest]
    fn timepoint_in_undeclared_subproblem(mut temporal_tables: TemporalTables) {
        temporal_tables.timepoints.push(timepoint_row(2, 1, 25));
        let err = resolve(&temporal_tables).unwrap_err();
        assert_eq!(err.kind, TemporalErrorKind::UndeclaredSubproblem);
        assert_eq!(err.location.subproblem, Some(2));
    }

    #[rstest]
    fn subproblem_without_timepoints(mut temporal_tables: TemporalTables) {
        temporal_tables.subproblems.push(2);
        let err = resolve(&temporal_tables).unwrap_err();
        assert_eq!(err.kind, TemporalErrorKind::NoTimepoints);
        assert_eq!(err.location.subproblem, Some(2));
        assert_eq!(err.location.stage, Some(DEFAULT_STAGE));
    }

    #[rstest]
    fn horizon_without_timepoints(mut temporal_tables: TemporalTables) {
        temporal_tables.horizons.push(HorizonRow {
            subproblem_id: 1,
            balancing_type_horizon: day(),
            horizon: "day-2".into(),
            boundary: BoundaryType::Circular,
        });
        let err = resolve(&temporal_tables).unwrap_err();
        assert_eq!(err.kind, TemporalErrorKind::EmptyHorizon);
        assert_eq!(err.location.horizon, Some((day(), "day-2".into())));
    }

    #[rstest]
    fn duplicate_membership_same_balancing_type(mut temporal_tables: TemporalTables) {
        temporal_tables.horizons.push(HorizonRow {
            subproblem_id: 1,
            balancing_type_horizon: day(),
            horizon: "day-2".into(),
            boundary: BoundaryType::Circular,
        });
        temporal_tables.horizon_timepoints.push(HorizonTimepointRow {
            subproblem_id: 1,
            stage_id: 1,
            timepoint: 24,
            balancing_type_horizon: day(),
            horizon: "day-2".into(),
        });
        let err = resolve(&temporal_tables).unwrap_err();
        assert!(matches!(
            err.kind,
            TemporalErrorKind::DuplicateHorizonMembership { timepoint: 24, .. }
        ));
        assert_eq!(
            err.violation_kind(),
            crate::violation::ViolationKind::DuplicateMembership
        );
    }

    #[rstest]
    fn membership_across_balancing_types(mut temporal_tables: TemporalTables) {
        let week: BalancingType = "week".into();
        temporal_tables.horizons.push(HorizonRow {
            subproblem_id: 1,
            balancing_type_horizon: week.clone(),
            horizon: "week-1".into(),
            boundary: BoundaryType::Linear,
        });
        for timepoint in 1..=24 {
            temporal_tables.horizon_timepoints.push(HorizonTimepointRow {
                subproblem_id: 1,
                stage_id: 1,
                timepoint,
                balancing_type_horizon: week.clone(),
                horizon: "week-1".into(),
            });
        }

        let hierarchy = resolve(&temporal_tables).unwrap();
        let stage = hierarchy.stage(1, 1).unwrap();
        assert_eq!(stage.balancing_types().count(), 2);
        assert_eq!(stage.previous(1, &day()), Some(AdjacentTimepoint::Timepoint(24)));
        assert_eq!(stage.previous(1, &week), None);
    }

    #[rstest]
    fn uncovered_timepoint(mut temporal_tables: TemporalTables) {
        temporal_tables.horizon_timepoints.retain(|row| row.timepoint != 24);
        assert_eq!(
            resolve(&temporal_tables).unwrap_err().kind,
            TemporalErrorKind::UncoveredTimepoint {
                timepoint: 24,
                balancing_type: day()
            }
        );
    }

    #[rstest]
    fn non_contiguous_horizon(mut temporal_tables: TemporalTables) {
        temporal_tables.horizons.push(HorizonRow {
            subproblem_id: 1,
            balancing_type_horizon: day(),
            horizon: "day-2".into(),
            boundary: BoundaryType::Circular,
        });
        temporal_tables.horizon_timepoints[10].horizon = "day-2".into();
        let err = resolve(&temporal_tables).unwrap_err();
        assert_eq!(err.kind, TemporalErrorKind::NonContiguousHorizon);
        assert_eq!(err.location.horizon, Some((day(), "day-1".into())));
    }

    #[rstest]
    fn start_end_mapping(mut temporal_tables: TemporalTables) {
        temporal_tables.horizon_timepoints.clear();
        temporal_tables.horizons.push(HorizonRow {
            subproblem_id: 1,
            balancing_type_horizon: day(),
            horizon: "day-2".into(),
            boundary: BoundaryType::Linear,
        });
        for (horizon, tmp_start, tmp_end) in [("day-2", 13, 24), ("day-1", 1, 12)] {
            temporal_tables.horizon_start_end.push(HorizonStartEndRow {
                subproblem_id: 1,
                stage_id: 1,
                balancing_type_horizon: day(),
                horizon: horizon.into(),
                tmp_start,
                tmp_end,
            });
        }

        let hierarchy = resolve(&temporal_tables).unwrap();
        let stage = hierarchy.stage(1, 1).unwrap();
        let horizons = &stage.horizons[&day()];
        assert_eq!(horizons[0].id.as_str(), "day-1");
        assert_eq!(horizons[0].timepoints, (1..=12).collect::<Vec<_>>());
        assert_eq!(horizons[1].id.as_str(), "day-2");
        assert_eq!(stage.previous(1, &day()), Some(AdjacentTimepoint::Timepoint(12)));
        assert_eq!(stage.previous(13, &day()), None);
        assert!(approx_eq!(f64, horizons[1].duration_hours, 12.0));
    }

    #[rstest]
    fn start_after_end(mut temporal_tables: TemporalTables) {
        temporal_tables.horizon_start_end.push(HorizonStartEndRow {
            subproblem_id: 1,
            stage_id: 1,
            balancing_type_horizon: day(),
            horizon: "day-1".into(),
            tmp_start: 24,
            tmp_end: 1,
        });
        assert_eq!(
            resolve(&temporal_tables).unwrap_err().kind,
            TemporalErrorKind::StartAfterEnd { start: 24, end: 1 }
        );
    }

    #[rstest]
    fn start_end_unknown_timepoint(mut temporal_tables: TemporalTables) {
        temporal_tables.horizon_start_end.push(HorizonStartEndRow {
            subproblem_id: 1,
            stage_id: 1,
            balancing_type_horizon: day(),
            horizon: "day-1".into(),
            tmp_start: 1,
            tmp_end: 48,
        });
        assert_eq!(
            resolve(&temporal_tables).unwrap_err().kind,
            TemporalErrorKind::UnknownTimepoint(48)
        );
    }

    #[test]
    fn linked_subproblems() {
        let hierarchy = resolve(&subproblem_tables(2, BoundaryType::Linked)).unwrap();

        // No previous subproblem, so the first falls back to linear
        let first = hierarchy.stage(1, 1).unwrap();
        assert_eq!(first.horizons[&day()][0].boundary, BoundaryType::Linear);
        assert_eq!(first.previous(1, &day()), None);
        assert_eq!(
            first
                .linked_timepoints
                .iter()
                .map(|linked| (linked.index, linked.timepoint.id))
                .collect::<Vec<_>>(),
            [(0, 4), (-1, 3)]
        );

        let second = hierarchy.stage(2, 1).unwrap();
        let horizon = &second.horizons[&day()][0];
        assert_eq!(horizon.declared_boundary, BoundaryType::Linked);
        assert_eq!(horizon.boundary, BoundaryType::Linked);
        assert_eq!(second.previous(5, &day()), Some(AdjacentTimepoint::Linked(0)));
        assert_eq!(second.next(8, &day()), None);
        assert_eq!(second.linked_predecessors.len(), 2);
        assert_eq!(second.linked_predecessor(0), Some(AdjacentTimepoint::Linked(-1)));
        assert_eq!(second.linked_predecessor(-1), None);
    }

    #[test]
    fn linked_without_linked_timepoints() {
        let mut tables = subproblem_tables(2, BoundaryType::Linked);
        for row in &mut tables.timepoints {
            row.linked_timepoint = None;
        }
        let err = resolve(&tables).unwrap_err();
        assert_eq!(
            err.kind,
            TemporalErrorKind::MissingLinkedTimepoints {
                previous_subproblem: 1
            }
        );
        assert_eq!(err.location.subproblem, Some(2));
    }

    #[test]
    fn linked_on_later_horizon_is_linear() {
        let mut tables = subproblem_tables(2, BoundaryType::Circular);
        // Split the second subproblem's day in two, only the later half linked
        tables.horizons.push(HorizonRow {
            subproblem_id: 2,
            balancing_type_horizon: day(),
            horizon: "day-2b".into(),
            boundary: BoundaryType::Linked,
        });
        for row in &mut tables.horizon_timepoints {
            if row.timepoint >= 7 {
                row.horizon = "day-2b".into();
            }
        }

        let hierarchy = resolve(&tables).unwrap();
        let stage = hierarchy.stage(2, 1).unwrap();
        let horizons = &stage.horizons[&day()];
        assert_eq!(horizons[1].id.as_str(), "day-2b");
        assert_eq!(horizons[1].boundary, BoundaryType::Linear);
        assert_eq!(stage.previous(7, &day()), None);
        assert!(stage.linked_predecessors.is_empty());
    }

    #[rstest]
    #[case(&[(3, -2), (4, 0)])]
    #[case(&[(3, 0), (4, -1)])]
    #[case(&[(3, -1), (4, -1)])]
    #[case(&[(3, 0), (4, 1)])]
    #[case(&[(4, -1)])]
    fn malformed_linked_timepoints(#[case] linked: &[(TimepointID, i32)]) {
        let mut tables = subproblem_tables(1, BoundaryType::Circular);
        for row in &mut tables.timepoints {
            row.linked_timepoint = linked
                .iter()
                .find(|(timepoint, _)| *timepoint == row.timepoint)
                .map(|(_, index)| *index);
        }
        assert!(matches!(
            resolve(&tables).unwrap_err().kind,
            TemporalErrorKind::MalformedLinkedTimepoints { .. }
        ));
    }

    #[test]
    fn explicit_stages() {
        let mut tables = subproblem_tables(1, BoundaryType::Circular);
        tables.stages = vec![
            StageRow {
                subproblem_id: 1,
                stage_id: 2,
                stage_name: "real-time".into(),
            },
            StageRow {
                subproblem_id: 1,
                stage_id: 1,
                stage_name: "day-ahead".into(),
            },
        ];
        for timepoint in 1..=4 {
            tables.timepoints.push(timepoint_row(1, 2, timepoint));
            tables.horizon_timepoints.push(HorizonTimepointRow {
                subproblem_id: 1,
                stage_id: 2,
                timepoint,
                balancing_type_horizon: day(),
                horizon: "day-1".into(),
            });
        }

        let hierarchy = resolve(&tables).unwrap();
        assert_eq!(hierarchy.max_stage_count(), 2);
        let stage_names: Vec<_> = hierarchy
            .iter_stages()
            .map(|(_, stage)| stage.name.as_str())
            .collect();
        assert_eq!(stage_names, ["day-ahead", "real-time"]);
    }

    #[test]
    fn stages_split_horizons_differently() {
        let mut tables = subproblem_tables(1, BoundaryType::Circular);
        tables.horizons.push(HorizonRow {
            subproblem_id: 1,
            balancing_type_horizon: day(),
            horizon: "day-1b".into(),
            boundary: BoundaryType::Circular,
        });
        // Stage 1 is split as [1, 2], [3, 4]; stage 2 as [1, 2, 3], [4]
        for row in &mut tables.horizon_timepoints {
            if row.timepoint >= 3 {
                row.horizon = "day-1b".into();
            }
        }
        for timepoint in 1..=4 {
            tables.timepoints.push(timepoint_row(1, 2, timepoint));
            tables.horizon_timepoints.push(HorizonTimepointRow {
                subproblem_id: 1,
                stage_id: 2,
                timepoint,
                balancing_type_horizon: day(),
                horizon: if timepoint == 4 { "day-1b" } else { "day-1" }.into(),
            });
        }
        tables.stages = (1..=2)
            .map(|stage_id| StageRow {
                subproblem_id: 1,
                stage_id,
                stage_name: format!("stage-{stage_id}"),
            })
            .collect();

        let err = resolve(&tables).unwrap_err();
        assert_eq!(
            err.kind,
            TemporalErrorKind::StageHorizonMismatch { first_stage: 1 }
        );
        assert_eq!(err.location.subproblem, Some(1));
        assert_eq!(err.location.stage, Some(2));
        assert_eq!(err.location.horizon, Some((day(), "day-1".into())));
    }

    #[test]
    fn adjacent_timepoint_display() {
        assert_eq!(AdjacentTimepoint::Timepoint(5).to_string(), "5");
        assert_eq!(AdjacentTimepoint::Linked(-2).to_string(), "-2");
    }
}
