use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::variant::Variant;

/// Outcome of a solve, independent of the backend that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    Suboptimal,
    /// Time limit reached with a feasible incumbent
    TimeLimitFeasible,
    /// Infeasible, unbounded, or stopped before finding an incumbent
    NoSolution,
    /// The backend terminated abnormally without an incumbent
    Error,
}

impl SolveStatus {
    pub fn has_solution(&self) -> bool {
        matches!(
            self,
            SolveStatus::Optimal | SolveStatus::Suboptimal | SolveStatus::TimeLimitFeasible
        )
    }
}

/// Assignments of one stratum in a stratified solution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StratumSolution {
    pub stratum: usize,
    pub assignments: BTreeMap<usize, usize>,
    pub backup_assignments: BTreeMap<usize, usize>,
    /// Largest realized primary distance in this stratum
    pub primary_radius: f64,
    /// Largest realized backup distance in this stratum
    pub backup_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub variant: Variant,
    pub status: SolveStatus,
    /// Status as reported by the backend
    pub backend_status: String,
    pub objective_value: Option<f64>,
    pub centers: BTreeSet<usize>,
    /// Primary assignment, client -> center
    pub assignments: BTreeMap<usize, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_assignments: Option<BTreeMap<usize, usize>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub strata: Vec<StratumSolution>,
}

impl Solution {
    /// A solution value carrying no incumbent
    pub fn empty(variant: Variant, status: SolveStatus, backend_status: impl Into<String>) -> Self {
        Solution {
            variant,
            status,
            backend_status: backend_status.into(),
            objective_value: None,
            centers: BTreeSet::new(),
            assignments: BTreeMap::new(),
            backup_assignments: None,
            strata: Vec::new(),
        }
    }

    pub fn has_solution(&self) -> bool {
        self.status.has_solution()
    }
}
