use std::collections::{BTreeMap, BTreeSet};

use crate::domain::backend::{BackendError, BackendStatus, RawResult};
use crate::domain::instance::Instance;
use crate::domain::models::{AssignmentVars, CompiledModel, Layout, StratifiedVars};
use crate::domain::problem::VarId;
use crate::domain::solution::{Solution, SolveStatus, StratumSolution};

/// Binary variables above this value are read as 1
pub const BINARY_THRESHOLD: f64 = 0.5;

const EXTRACTOR: &str = "solution extractor";

/// Map a backend status to a domain status, given whether an incumbent exists
pub fn classify(status: &BackendStatus, has_incumbent: bool) -> SolveStatus {
    match (status, has_incumbent) {
        (BackendStatus::Optimal, true) => SolveStatus::Optimal,
        (BackendStatus::Suboptimal, true) => SolveStatus::Suboptimal,
        (BackendStatus::TimeLimit, true) => SolveStatus::TimeLimitFeasible,
        (BackendStatus::Other(_), _) => SolveStatus::Error,
        _ => SolveStatus::NoSolution,
    }
}

/// Decode a raw backend result into a `Solution`.
///
/// Without an incumbent the result is an empty solution, not an error. With
/// one, every client row must contain a selected center; when floating-point
/// slack leaves several above the threshold the lowest-numbered center wins.
pub fn extract(
    model: &CompiledModel,
    instance: &Instance,
    raw: &RawResult,
) -> Result<Solution, BackendError> {
    let backend_status = format!("{:?}", raw.status);
    let status = classify(&raw.status, raw.values.is_some());

    let values = match (&raw.values, status.has_solution()) {
        (Some(values), true) => values,
        _ => return Ok(Solution::empty(model.variant, status, backend_status)),
    };

    if values.len() != model.problem.num_variables() {
        return Err(BackendError::new(
            EXTRACTOR,
            format!(
                "incumbent has {} values for {} variables",
                values.len(),
                model.problem.num_variables()
            ),
        ));
    }

    let selected = |var: VarId| values[var.index()] > BINARY_THRESHOLD;

    let centers: BTreeSet<usize> = model
        .open
        .iter()
        .enumerate()
        .filter(|(_, &y)| selected(y))
        .map(|(j, _)| j)
        .collect();

    let mut solution = Solution::empty(model.variant, status, backend_status);
    solution.objective_value = Some(model.problem.objective_value(values));

    match &model.layout {
        Layout::Single { primary } => {
            solution.assignments = decode_grid(primary, &selected, "primary")?;
        }
        Layout::Resilient { primary, backup } => {
            solution.assignments = decode_grid(primary, &selected, "primary")?;
            solution.backup_assignments = Some(decode_grid(backup, &selected, "backup")?);
        }
        Layout::Stratified(vars) => {
            solution.strata = decode_strata(vars, instance, &selected)?;
        }
    }

    solution.centers = centers;
    Ok(solution)
}

fn decode_grid(
    grid: &AssignmentVars,
    selected: &impl Fn(VarId) -> bool,
    role: &str,
) -> Result<BTreeMap<usize, usize>, BackendError> {
    (0..grid.num_clients())
        .map(|client| {
            first_selected(grid.row(client).iter().copied().enumerate(), selected)
                .map(|center| (client, center))
                .ok_or_else(|| unassigned(role, client, None))
        })
        .collect()
}

fn decode_strata(
    vars: &StratifiedVars,
    instance: &Instance,
    selected: &impl Fn(VarId) -> bool,
) -> Result<Vec<StratumSolution>, BackendError> {
    let strata = instance
        .strata()
        .map_err(|e| BackendError::new(EXTRACTOR, e.to_string()))?;
    let indexer = &vars.indexer;

    let mut decoded = Vec::with_capacity(indexer.num_strata());
    for s in 0..indexer.num_strata() {
        let mut block = StratumSolution {
            stratum: s,
            assignments: BTreeMap::new(),
            backup_assignments: BTreeMap::new(),
            primary_radius: 0.0,
            backup_radius: 0.0,
        };

        for client in (0..instance.num_nodes()).filter(|&i| strata.is_member(i, s)) {
            let primary = first_selected(
                indexer.centers_for(s, client).map(|(j, idx)| (j, vars.primary(idx))),
                selected,
            )
            .ok_or_else(|| unassigned("primary", client, Some(s)))?;
            let backup = first_selected(
                indexer.centers_for(s, client).map(|(j, idx)| (j, vars.backup(idx))),
                selected,
            )
            .ok_or_else(|| unassigned("backup", client, Some(s)))?;

            block.primary_radius = block.primary_radius.max(instance.distance(client, primary));
            block.backup_radius = block.backup_radius.max(instance.distance(client, backup));
            block.assignments.insert(client, primary);
            block.backup_assignments.insert(client, backup);
        }

        decoded.push(block);
    }
    Ok(decoded)
}

/// First center, in scan order, whose variable is selected
fn first_selected(
    mut candidates: impl Iterator<Item = (usize, VarId)>,
    selected: &impl Fn(VarId) -> bool,
) -> Option<usize> {
    candidates.find(|&(_, var)| selected(var)).map(|(center, _)| center)
}

fn unassigned(role: &str, client: usize, stratum: Option<usize>) -> BackendError {
    let details = match stratum {
        Some(s) => format!("incumbent leaves client {} without a {} center in stratum {}", client, role, s),
        None => format!("incumbent leaves client {} without a {} center", client, role),
    };
    BackendError::new(EXTRACTOR, details)
}
