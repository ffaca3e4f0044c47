//! Violations found while validating a scenario.
//!
//! The registry validator and the feature checker collect every violation they find rather than
//! stopping at the first, so that a scenario author can fix several problems in one go. The
//! assembler merges their output (and any temporal hierarchy error) into a [`ViolationReport`].
use crate::category::{SubscenarioCategory, SubscenarioID};
use serde::Serialize;
use std::fmt::{self, Display};

/// The kind of problem a violation describes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A selector or cross-reference points at something which doesn't exist
    DanglingReference,
    /// The temporal hierarchy breaks one of its invariants
    StructuralInconsistency,
    /// A feature flag and the selectors disagree
    FeatureSelectorIncoherence,
    /// A timepoint belongs to more than one horizon of the same balancing type
    DuplicateMembership,
}

/// How serious a violation is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Surfaced to the user but doesn't block assembly
    Warning,
    /// Blocks assembly
    Error,
}

/// A single problem with a scenario's configuration
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Violation {
    /// What sort of problem this is
    pub kind: ViolationKind,
    /// Whether the problem blocks assembly
    pub severity: Severity,
    /// The category involved, if the problem concerns a selector
    pub category: Option<SubscenarioCategory>,
    /// The selected subscenario involved, if any
    pub subscenario_id: Option<SubscenarioID>,
    /// Human-readable description, naming the missing or mismatched key
    pub message: String,
}

impl Violation {
    /// Create a new error-level violation
    pub fn error(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            category: None,
            subscenario_id: None,
            message: message.into(),
        }
    }

    /// Create a new warning-level violation
    pub fn warning(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, message)
        }
    }

    /// Attach the selector this violation concerns
    pub fn for_selector(
        mut self,
        category: SubscenarioCategory,
        subscenario_id: Option<SubscenarioID>,
    ) -> Self {
        self.category = Some(category);
        self.subscenario_id = subscenario_id;
        self
    }

    /// Whether this violation blocks assembly
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "[{severity}] ")?;
        match (self.category, self.subscenario_id) {
            (Some(category), Some(id)) => write!(f, "{category} ({id}): ")?,
            (Some(category), None) => write!(f, "{category}: ")?,
            _ => {}
        }
        write!(f, "{}", self.message)
    }
}

/// All the violations found for one scenario, in the order they were found
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViolationReport(Vec<Violation>);

impl ViolationReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a violation to the report
    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    /// Whether any violation blocks assembly
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Violation::is_error)
    }

    /// Whether the report is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of violations
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over all violations
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    /// Iterate over the violations which block assembly
    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter().filter(|v| v.is_error())
    }

    /// Iterate over the warnings
    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter().filter(|v| !v.is_error())
    }
}

impl Extend<Violation> for ViolationReport {
    fn extend<T: IntoIterator<Item = Violation>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<Violation> for ViolationReport {
    fn from_iter<T: IntoIterator<Item = Violation>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ViolationReport {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ViolationReport {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for ViolationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for violation in &self.0 {
            writeln!(f, "  * {violation}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_display() {
        let violation = Violation::error(ViolationKind::DanglingReference, "Fragment not found")
            .for_selector(SubscenarioCategory::Load, Some(SubscenarioID(2)));
        assert_eq!(
            violation.to_string(),
            "[error] load (2): Fragment not found"
        );

        let violation =
            Violation::warning(ViolationKind::FeatureSelectorIncoherence, "Ignored selector")
                .for_selector(SubscenarioCategory::Tuning, None);
        assert_eq!(violation.to_string(), "[warning] tuning: Ignored selector");
    }

    #[test]
    fn report_has_errors() {
        let mut report = ViolationReport::new();
        assert!(!report.has_errors());

        report.push(Violation::warning(
            ViolationKind::FeatureSelectorIncoherence,
            "w",
        ));
        assert!(!report.has_errors());
        assert_eq!(report.warnings().count(), 1);

        report.push(Violation::error(ViolationKind::DanglingReference, "e"));
        assert!(report.has_errors());
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.len(), 2);
    }
}
