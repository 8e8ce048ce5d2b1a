//! Recoverable data problems.
//!
//! Inconsistent cross-references never abort a refresh: they are collected here, logged, and
//! handed back to the UI next to the geometry that could still be produced.

use rustc_hash::FxHashSet;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A node referenced by rack, job or topology data is absent from the nodes response.
    MissingNode,
    /// A switch references a child switch that does not exist (yet).
    MissingSwitch,
    UnknownState,
    OverlappingNodes,
    /// Two racks of one range claim the same column.
    RackColumnConflict,
    /// A pinned core index is outside the node's core count.
    CoreOutOfRange,
    /// More cores are allocated than the node has.
    OverAllocated,
    /// Data that is structurally valid but ignored (e.g. nodes on a non-leaf switch).
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    /// Entity the warning is about (node, rack, switch or job name).
    pub subject: String,
    pub message: String,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
    #[serde(skip)]
    seen: FxHashSet<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning. Identical warnings (same kind, subject and message) are kept once, so
    /// projections that revisit the same data do not repeat themselves.
    pub fn warn(
        &mut self,
        kind: WarningKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        let warning = Warning {
            kind,
            subject: subject.into(),
            message: message.into(),
        };
        if !self.seen.insert(warning.clone()) {
            return;
        }
        tracing::warn!(kind = ?warning.kind, subject = %warning.subject, "{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        for warning in other.warnings {
            if self.seen.insert(warning.clone()) {
                self.warnings.push(warning);
            }
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.warnings
    }
}
