//! Errors raised while resolving a temporal hierarchy.
use super::{BalancingType, HorizonID, TimepointID};
use crate::category::{SubscenarioCategory, SubscenarioID};
use crate::violation::{Violation, ViolationKind};
use std::fmt::{self, Display};
use thiserror::Error;

/// Where in the temporal hierarchy a problem was found
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchyLocation {
    /// The temporal fragment
    pub temporal_scenario_id: SubscenarioID,
    /// The subproblem, if the problem is confined to one
    pub subproblem: Option<u32>,
    /// The stage, if the problem is confined to one
    pub stage: Option<u32>,
    /// The balancing type and horizon, if the problem is confined to one
    pub horizon: Option<(BalancingType, HorizonID)>,
}

impl HierarchyLocation {
    /// A location covering the whole temporal fragment
    pub fn fragment(temporal_scenario_id: SubscenarioID) -> Self {
        Self {
            temporal_scenario_id,
            subproblem: None,
            stage: None,
            horizon: None,
        }
    }

    /// Narrow this location to a subproblem
    pub fn subproblem(&self, subproblem: u32) -> Self {
        Self {
            subproblem: Some(subproblem),
            ..self.clone()
        }
    }

    /// Narrow this location to a stage
    pub fn stage(&self, stage: u32) -> Self {
        Self {
            stage: Some(stage),
            ..self.clone()
        }
    }

    /// Narrow this location to a horizon
    pub fn horizon(&self, balancing_type: &BalancingType, horizon: &HorizonID) -> Self {
        Self {
            horizon: Some((balancing_type.clone(), horizon.clone())),
            ..self.clone()
        }
    }
}

impl Display for HierarchyLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "temporal fragment {}", self.temporal_scenario_id)?;
        if let Some(subproblem) = self.subproblem {
            write!(f, ", subproblem {subproblem}")?;
        }
        if let Some(stage) = self.stage {
            write!(f, ", stage {stage}")?;
        }
        if let Some((balancing_type, horizon)) = &self.horizon {
            write!(f, ", horizon {horizon} (balancing type {balancing_type})")?;
        }
        Ok(())
    }
}

/// The specific invariant a temporal hierarchy breaks
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TemporalErrorKind {
    /// The fragment has no period rows
    #[error("No periods are defined")]
    NoPeriods,
    /// Two period rows share an ID
    #[error("Period {0} is defined more than once")]
    DuplicatePeriod(u32),
    /// A period's discount factor or years represented is not finite and positive
    #[error("Invalid {field} for period {period}: {value}")]
    InvalidPeriodValue {
        /// The period
        period: u32,
        /// The offending column
        field: &'static str,
        /// The value given
        value: f64,
    },
    /// The fragment has no subproblem rows
    #[error("No subproblems are defined")]
    NoSubproblems,
    /// Two subproblem rows share an ID
    #[error("Subproblem is defined more than once")]
    DuplicateSubproblem,
    /// A row refers to a subproblem with no subproblem row
    #[error("Subproblem is not declared")]
    UndeclaredSubproblem,
    /// Two stage rows share a (subproblem, stage) key
    #[error("Stage is defined more than once")]
    DuplicateStage,
    /// A row refers to a stage which isn't declared for its subproblem
    #[error("Stage is not declared for this subproblem")]
    UndeclaredStage,
    /// A (subproblem, stage) has no timepoints
    #[error("No timepoints are defined")]
    NoTimepoints,
    /// Two timepoint rows share an ID within a stage
    #[error("Timepoint {0} is defined more than once")]
    DuplicateTimepoint(TimepointID),
    /// A timepoint ID is zero or negative
    #[error("Timepoint IDs must be positive, but found {0}")]
    NonPositiveTimepoint(TimepointID),
    /// A timepoint's period has no period row
    #[error("Timepoint {timepoint} refers to undeclared period {period}")]
    UndeclaredPeriod {
        /// The timepoint
        timepoint: TimepointID,
        /// The period it names
        period: u32,
    },
    /// A timepoint's hours or weight is not finite and positive
    #[error("Invalid {field} for timepoint {timepoint}: {value}")]
    InvalidTimepointValue {
        /// The timepoint
        timepoint: TimepointID,
        /// The offending column
        field: &'static str,
        /// The value given
        value: f64,
    },
    /// Two horizon rows share a (subproblem, balancing type, horizon) key
    #[error("Horizon is defined more than once")]
    DuplicateHorizon,
    /// A membership row names a horizon with no horizon row
    #[error("Timepoint {0} is assigned to a horizon which is not declared")]
    UndeclaredHorizon(TimepointID),
    /// A start/end row names a timepoint missing from its stage
    #[error("Timepoint {0} does not exist in this subproblem and stage")]
    UnknownTimepoint(TimepointID),
    /// A start/end row's start comes after its end
    #[error("Horizon starts at timepoint {start}, which comes after its end timepoint {end}")]
    StartAfterEnd {
        /// First timepoint of the horizon
        start: TimepointID,
        /// Last timepoint of the horizon
        end: TimepointID,
    },
    /// A declared horizon has no timepoints in a stage
    #[error("Horizon has no timepoints")]
    EmptyHorizon,
    /// A horizon's timepoints are not a contiguous run of the stage
    #[error("Horizon timepoints are not contiguous")]
    NonContiguousHorizon,
    /// A timepoint is claimed by two horizons of one balancing type
    #[error(
        "Timepoint {timepoint} belongs to more than one horizon of balancing type \
         {balancing_type} ({first} and {second})"
    )]
    DuplicateHorizonMembership {
        /// The timepoint
        timepoint: TimepointID,
        /// The balancing type both horizons belong to
        balancing_type: BalancingType,
        /// The horizon seen first
        first: HorizonID,
        /// The horizon seen second
        second: HorizonID,
    },
    /// A timepoint has no horizon for a balancing type used in the fragment
    #[error("Timepoint {timepoint} is not in any horizon of balancing type {balancing_type}")]
    UncoveredTimepoint {
        /// The timepoint
        timepoint: TimepointID,
        /// The balancing type lacking a horizon
        balancing_type: BalancingType,
    },
    /// A stage's linked timepoint indices are not `-(k-1), ..., -1, 0` in timepoint order
    #[error("Malformed linked timepoints {indices:?}: {reason}")]
    MalformedLinkedTimepoints {
        /// The indices, in timepoint order
        indices: Vec<i32>,
        /// Which rule they break
        reason: &'static str,
    },
    /// A first horizon is `linked` but the previous subproblem has nothing to link
    #[error(
        "Horizon has a linked boundary but subproblem {previous_subproblem} provides no linked \
         timepoints for this stage"
    )]
    MissingLinkedTimepoints {
        /// The subproblem which should supply the linked timepoints
        previous_subproblem: u32,
    },
    /// A stage groups timepoints into horizons differently from the subproblem's first stage
    #[error("Horizon covers different timepoints than in stage {first_stage} of this subproblem")]
    StageHorizonMismatch {
        /// The subproblem's first stage
        first_stage: u32,
    },
}

/// A structural inconsistency in a temporal hierarchy.
///
/// Resolution stops at the first of these, since later steps (e.g. deriving predecessors) are
/// meaningless on a broken tree.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{kind} ({location})")]
pub struct TemporalError {
    /// Where the problem was found
    pub location: HierarchyLocation,
    /// What the problem is
    pub kind: TemporalErrorKind,
}

impl TemporalError {
    /// Create a new error at the given location
    pub fn new(location: HierarchyLocation, kind: TemporalErrorKind) -> Self {
        Self { location, kind }
    }

    /// The class of violation this error represents
    pub fn violation_kind(&self) -> ViolationKind {
        match self.kind {
            TemporalErrorKind::DuplicateHorizonMembership { .. } => {
                ViolationKind::DuplicateMembership
            }
            _ => ViolationKind::StructuralInconsistency,
        }
    }
}

impl From<TemporalError> for Violation {
    fn from(err: TemporalError) -> Self {
        let id = err.location.temporal_scenario_id;
        Violation::error(err.violation_kind(), err.to_string())
            .for_selector(SubscenarioCategory::Temporal, Some(id))
    }
}
