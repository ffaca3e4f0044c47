//! Horizon membership, ordering and boundary handling.
use super::{
    AdjacentTimepoint, BalancingType, BoundaryType, HierarchyLocation, Horizon, HorizonID,
    LinkedTimepoint, StageNames, StageTimepoints, TemporalError, TemporalErrorKind,
    TemporalTables, Timepoint, TimepointID, TimepointLinks,
};
use indexmap::{IndexMap, IndexSet};
use log::warn;
use std::collections::HashMap;

/// Declared horizons and their boundaries, by subproblem and balancing type
pub(super) type HorizonDeclarations =
    IndexMap<u32, IndexMap<BalancingType, IndexMap<HorizonID, BoundaryType>>>;

/// The horizon each timepoint of a stage belongs to, by balancing type
pub(super) type StageMembership = IndexMap<BalancingType, HashMap<TimepointID, HorizonID>>;

/// Where linked timepoints for a stage's first horizon come from
#[derive(Clone, Copy)]
pub(super) enum LinkedSource<'a> {
    /// There is no previous subproblem
    FirstSubproblem,
    /// The same stage of the previous subproblem
    Previous {
        subproblem: u32,
        linked: &'a [LinkedTimepoint],
    },
}

/// Horizons and timepoint neighbours of one stage
#[derive(Default)]
pub(super) struct StageGrid {
    pub horizons: IndexMap<BalancingType, Vec<Horizon>>,
    pub links: IndexMap<BalancingType, IndexMap<TimepointID, TimepointLinks>>,
    pub linked_predecessors: Vec<LinkedTimepoint>,
}

pub(super) fn declare_horizons(
    location: &HierarchyLocation,
    subproblem_ids: &IndexSet<u32>,
    rows: &[super::tables::HorizonRow],
) -> Result<HorizonDeclarations, TemporalError> {
    let mut declarations = HorizonDeclarations::new();
    for row in rows {
        let subproblem_location = location.subproblem(row.subproblem_id);
        if !subproblem_ids.contains(&row.subproblem_id) {
            return Err(TemporalError::new(
                subproblem_location,
                TemporalErrorKind::UndeclaredSubproblem,
            ));
        }

        if declarations
            .entry(row.subproblem_id)
            .or_default()
            .entry(row.balancing_type_horizon.clone())
            .or_default()
            .insert(row.horizon.clone(), row.boundary)
            .is_some()
        {
            return Err(TemporalError::new(
                subproblem_location.horizon(&row.balancing_type_horizon, &row.horizon),
                TemporalErrorKind::DuplicateHorizon,
            ));
        }
    }

    Ok(declarations)
}

/// Assign timepoints to horizons.
///
/// If any start/end rows are given, they are used for the whole fragment and the direct
/// membership rows are ignored.
pub(super) fn assign_timepoints(
    location: &HierarchyLocation,
    tables: &TemporalTables,
    stage_names: &StageNames,
    timepoints: &StageTimepoints,
    declarations: &HorizonDeclarations,
) -> Result<HashMap<(u32, u32), StageMembership>, TemporalError> {
    let mut assigner = Assigner {
        stage_names,
        timepoints,
        declarations,
        membership: HashMap::new(),
    };

    if tables.horizon_start_end.is_empty() {
        for row in &tables.horizon_timepoints {
            let target = Target {
                location: location
                    .subproblem(row.subproblem_id)
                    .stage(row.stage_id)
                    .horizon(&row.balancing_type_horizon, &row.horizon),
                subproblem: row.subproblem_id,
                stage: row.stage_id,
                balancing_type: &row.balancing_type_horizon,
                horizon: &row.horizon,
            };
            let stage_timepoints = assigner.stage_timepoints(&target, row.timepoint)?;
            if !stage_timepoints.contains_key(&row.timepoint) {
                return Err(target.error(TemporalErrorKind::UnknownTimepoint(row.timepoint)));
            }
            assigner.assign(&target, row.timepoint)?;
        }
    } else {
        for row in &tables.horizon_start_end {
            let target = Target {
                location: location
                    .subproblem(row.subproblem_id)
                    .stage(row.stage_id)
                    .horizon(&row.balancing_type_horizon, &row.horizon),
                subproblem: row.subproblem_id,
                stage: row.stage_id,
                balancing_type: &row.balancing_type_horizon,
                horizon: &row.horizon,
            };
            let stage_timepoints = assigner.stage_timepoints(&target, row.tmp_start)?;
            let position = |timepoint: TimepointID| {
                stage_timepoints
                    .get_index_of(&timepoint)
                    .ok_or_else(|| target.error(TemporalErrorKind::UnknownTimepoint(timepoint)))
            };
            let start = position(row.tmp_start)?;
            let end = position(row.tmp_end)?;
            if start > end {
                return Err(target.error(TemporalErrorKind::StartAfterEnd {
                    start: row.tmp_start,
                    end: row.tmp_end,
                }));
            }

            let range: Vec<TimepointID> = stage_timepoints
                .keys()
                .skip(start)
                .take(end - start + 1)
                .copied()
                .collect();
            for timepoint in range {
                assigner.assign(&target, timepoint)?;
            }
        }
    }

    Ok(assigner.membership)
}

/// The horizon a membership row refers to
struct Target<'a> {
    location: HierarchyLocation,
    subproblem: u32,
    stage: u32,
    balancing_type: &'a BalancingType,
    horizon: &'a HorizonID,
}

impl Target<'_> {
    fn error(&self, kind: TemporalErrorKind) -> TemporalError {
        TemporalError::new(self.location.clone(), kind)
    }
}

struct Assigner<'a> {
    stage_names: &'a StageNames,
    timepoints: &'a StageTimepoints,
    declarations: &'a HorizonDeclarations,
    membership: HashMap<(u32, u32), StageMembership>,
}

impl<'a> Assigner<'a> {
    /// The timepoints of the stage a row refers to
    fn stage_timepoints(
        &self,
        target: &Target,
        timepoint: TimepointID,
    ) -> Result<&'a IndexMap<TimepointID, Timepoint>, TemporalError> {
        let Some(stages) = self.stage_names.get(&target.subproblem) else {
            return Err(target.error(TemporalErrorKind::UndeclaredSubproblem));
        };
        if !stages.contains_key(&target.stage) {
            return Err(target.error(TemporalErrorKind::UndeclaredStage));
        }

        self.timepoints
            .get(&(target.subproblem, target.stage))
            .ok_or_else(|| target.error(TemporalErrorKind::UnknownTimepoint(timepoint)))
    }

    fn assign(&mut self, target: &Target, timepoint: TimepointID) -> Result<(), TemporalError> {
        let declared = self
            .declarations
            .get(&target.subproblem)
            .and_then(|declared| declared.get(target.balancing_type))
            .is_some_and(|horizons| horizons.contains_key(target.horizon));
        if !declared {
            return Err(target.error(TemporalErrorKind::UndeclaredHorizon(timepoint)));
        }

        let assigned = self
            .membership
            .entry((target.subproblem, target.stage))
            .or_default()
            .entry(target.balancing_type.clone())
            .or_default();
        match assigned.insert(timepoint, target.horizon.clone()) {
            Some(previous) if previous != *target.horizon => Err(target.error(
                TemporalErrorKind::DuplicateHorizonMembership {
                    timepoint,
                    balancing_type: target.balancing_type.clone(),
                    first: previous,
                    second: target.horizon.clone(),
                },
            )),
            _ => Ok(()),
        }
    }
}

/// Build the horizons of one stage and work out each timepoint's neighbours
pub(super) fn build_stage_grid(
    location: &HierarchyLocation,
    timepoints: &IndexMap<TimepointID, Timepoint>,
    balancing_types: &IndexSet<BalancingType>,
    declared: &IndexMap<BalancingType, IndexMap<HorizonID, BoundaryType>>,
    mut membership: StageMembership,
    linked_source: LinkedSource,
) -> Result<StageGrid, TemporalError> {
    let mut grid = StageGrid::default();
    for balancing_type in balancing_types {
        let assigned = membership.swap_remove(balancing_type).unwrap_or_default();
        let mut horizons = order_horizons(
            location,
            timepoints,
            balancing_type,
            declared.get(balancing_type),
            &assigned,
        )?;

        let mut links = IndexMap::new();
        for (index, horizon) in horizons.iter_mut().enumerate() {
            let horizon_location = location.horizon(balancing_type, &horizon.id);
            horizon.boundary =
                effective_boundary(&horizon_location, horizon, index == 0, linked_source)?;
            if let (BoundaryType::Linked, LinkedSource::Previous { linked, .. }) =
                (horizon.boundary, linked_source)
            {
                grid.linked_predecessors = linked.to_vec();
            }
            link_horizon(horizon, &mut links);
        }
        links.sort_keys();

        grid.horizons.insert(balancing_type.clone(), horizons);
        grid.links.insert(balancing_type.clone(), links);
    }

    Ok(grid)
}

/// Check that a stage splits its timepoints into horizons exactly as the subproblem's first stage
pub(super) fn check_same_horizons(
    location: &HierarchyLocation,
    first_stage: u32,
    expected: &IndexMap<BalancingType, Vec<Horizon>>,
    actual: &IndexMap<BalancingType, Vec<Horizon>>,
) -> Result<(), TemporalError> {
    for (balancing_type, horizons) in expected {
        let stage_horizons = actual.get(balancing_type).map_or(&[][..], Vec::as_slice);
        for horizon in horizons {
            let matches = stage_horizons
                .iter()
                .find(|other| other.id == horizon.id)
                .is_some_and(|other| other.timepoints == horizon.timepoints);
            if !matches {
                return Err(TemporalError::new(
                    location.horizon(balancing_type, &horizon.id),
                    TemporalErrorKind::StageHorizonMismatch { first_stage },
                ));
            }
        }
    }

    Ok(())
}

/// Collect the declared horizons of one balancing type, ordered by their first timepoint
fn order_horizons(
    location: &HierarchyLocation,
    timepoints: &IndexMap<TimepointID, Timepoint>,
    balancing_type: &BalancingType,
    declared: Option<&IndexMap<HorizonID, BoundaryType>>,
    assigned: &HashMap<TimepointID, HorizonID>,
) -> Result<Vec<Horizon>, TemporalError> {
    // Position in the stage and timepoint for each horizon member
    let mut members: HashMap<&HorizonID, Vec<(usize, &Timepoint)>> = HashMap::new();
    for (position, (id, timepoint)) in timepoints.iter().enumerate() {
        let Some(horizon) = assigned.get(id) else {
            return Err(TemporalError::new(
                location.clone(),
                TemporalErrorKind::UncoveredTimepoint {
                    timepoint: *id,
                    balancing_type: balancing_type.clone(),
                },
            ));
        };
        members.entry(horizon).or_default().push((position, timepoint));
    }

    let mut horizons = Vec::new();
    for (id, &boundary) in declared.into_iter().flatten() {
        let fail = |kind| Err(TemporalError::new(location.horizon(balancing_type, id), kind));
        let Some(horizon_members) = members.get(id) else {
            return fail(TemporalErrorKind::EmptyHorizon);
        };
        if !horizon_members
            .windows(2)
            .all(|pair| pair[1].0 == pair[0].0 + 1)
        {
            return fail(TemporalErrorKind::NonContiguousHorizon);
        }

        let first_position = horizon_members[0].0;
        let horizon = Horizon {
            balancing_type: balancing_type.clone(),
            id: id.clone(),
            declared_boundary: boundary,
            boundary,
            timepoints: horizon_members.iter().map(|(_, tp)| tp.id).collect(),
            duration_hours: horizon_members.iter().map(|(_, tp)| tp.hours).sum(),
        };
        horizons.push((first_position, horizon));
    }
    horizons.sort_by_key(|(first_position, _)| *first_position);

    Ok(horizons.into_iter().map(|(_, horizon)| horizon).collect())
}

/// The boundary which actually applies to a horizon
fn effective_boundary(
    location: &HierarchyLocation,
    horizon: &Horizon,
    is_first: bool,
    linked_source: LinkedSource,
) -> Result<BoundaryType, TemporalError> {
    if horizon.declared_boundary != BoundaryType::Linked {
        return Ok(horizon.declared_boundary);
    }

    if !is_first {
        warn!(
            "{location}: only the first horizon of a subproblem can be linked; treating boundary \
             as linear"
        );
        return Ok(BoundaryType::Linear);
    }

    match linked_source {
        LinkedSource::FirstSubproblem => {
            warn!(
                "{location}: there is no previous subproblem to link to; treating boundary as \
                 linear"
            );
            Ok(BoundaryType::Linear)
        }
        LinkedSource::Previous { subproblem, linked } if linked.is_empty() => {
            Err(TemporalError::new(
                location.clone(),
                TemporalErrorKind::MissingLinkedTimepoints {
                    previous_subproblem: subproblem,
                },
            ))
        }
        LinkedSource::Previous { .. } => Ok(BoundaryType::Linked),
    }
}

/// Record the previous and next timepoint of each of a horizon's timepoints
fn link_horizon(horizon: &Horizon, links: &mut IndexMap<TimepointID, TimepointLinks>) {
    let timepoints = &horizon.timepoints;
    let last = timepoints.len() - 1;
    for (i, &timepoint) in timepoints.iter().enumerate() {
        let previous = if i > 0 {
            Some(AdjacentTimepoint::Timepoint(timepoints[i - 1]))
        } else {
            match horizon.boundary {
                BoundaryType::Circular => Some(AdjacentTimepoint::Timepoint(timepoints[last])),
                BoundaryType::Linear => None,
                BoundaryType::Linked => Some(AdjacentTimepoint::Linked(0)),
            }
        };
        let next = if i < last {
            Some(AdjacentTimepoint::Timepoint(timepoints[i + 1]))
        } else if horizon.boundary == BoundaryType::Circular {
            Some(AdjacentTimepoint::Timepoint(timepoints[0]))
        } else {
            None
        };

        links.insert(
            timepoint,
            TimepointLinks {
                horizon: horizon.id.clone(),
                previous,
                next,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn horizon(boundary: BoundaryType, timepoints: Vec<TimepointID>) -> Horizon {
        Horizon {
            balancing_type: "day".into(),
            id: "day-1".into(),
            declared_boundary: boundary,
            boundary,
            duration_hours: timepoints.len() as f64,
            timepoints,
        }
    }

    #[rstest]
    #[case(BoundaryType::Circular, Some(AdjacentTimepoint::Timepoint(7)), Some(AdjacentTimepoint::Timepoint(7)))]
    #[case(BoundaryType::Linear, None, None)]
    #[case(BoundaryType::Linked, Some(AdjacentTimepoint::Linked(0)), None)]
    fn single_timepoint_horizon(
        #[case] boundary: BoundaryType,
        #[case] previous: Option<AdjacentTimepoint>,
        #[case] next: Option<AdjacentTimepoint>,
    ) {
        let mut links = IndexMap::new();
        link_horizon(&horizon(boundary, vec![7]), &mut links);
        assert_eq!(links[&7].previous, previous);
        assert_eq!(links[&7].next, next);
    }

    #[test]
    fn linked_falls_back_on_first_subproblem() {
        let location = HierarchyLocation::fragment(crate::category::SubscenarioID(1));
        let horizon = horizon(BoundaryType::Linked, vec![1, 2]);
        assert_eq!(
            effective_boundary(&location, &horizon, true, LinkedSource::FirstSubproblem),
            Ok(BoundaryType::Linear)
        );
        assert_eq!(
            effective_boundary(
                &location,
                &horizon,
                false,
                LinkedSource::Previous {
                    subproblem: 1,
                    linked: &[]
                }
            ),
            Ok(BoundaryType::Linear)
        );
    }
}
