//! Timepoints linking one subproblem to the next.
use super::{
    HierarchyLocation, LinkedTimepoint, TemporalError, TemporalErrorKind, Timepoint, TimepointID,
};
use indexmap::IndexMap;
use itertools::Itertools;

/// Check a stage's linked timepoint indices and return them, ordered 0, -1, -2, ...
///
/// Taken in timepoint order, the indices must be `-(k-1), ..., -1, 0`.
pub(super) fn collect_linked_timepoints(
    location: &HierarchyLocation,
    timepoints: &IndexMap<TimepointID, Timepoint>,
) -> Result<Vec<LinkedTimepoint>, TemporalError> {
    let linked = timepoints
        .values()
        .filter_map(|timepoint| {
            timepoint.linked_timepoint.map(|index| LinkedTimepoint {
                index,
                timepoint: timepoint.clone(),
            })
        })
        .collect_vec();
    if linked.is_empty() {
        return Ok(linked);
    }

    let indices = linked.iter().map(|linked| linked.index).collect_vec();
    check_linked_indices(&indices).map_err(|reason| {
        TemporalError::new(
            location.clone(),
            TemporalErrorKind::MalformedLinkedTimepoints { indices, reason },
        )
    })?;

    Ok(linked.into_iter().rev().collect())
}

fn check_linked_indices(indices: &[i32]) -> Result<(), &'static str> {
    if indices.iter().any(|&index| index > 0) {
        return Err("indices must not be positive");
    }
    if !indices.iter().tuple_windows().all(|(a, b)| a < b) {
        return Err("indices must be strictly increasing in timepoint order");
    }
    if !indices.iter().tuple_windows().all(|(a, b)| a + 1 == *b) {
        return Err("indices must be contiguous");
    }
    if indices.last() != Some(&0) {
        return Err("the last index must be 0");
    }

    Ok(())
}
