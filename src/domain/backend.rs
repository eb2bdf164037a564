use thiserror::Error;

use crate::config::SolverConfig;
use crate::domain::problem::{Constraint, Objective, Problem, VarId, Variable};

/// Failure inside an optimization backend
#[derive(Error, Debug)]
#[error("{backend}: {details}")]
pub struct BackendError {
    pub backend: String,
    pub details: String,
}

impl BackendError {
    pub fn new(backend: &str, details: impl Into<String>) -> Self {
        BackendError {
            backend: backend.to_string(),
            details: details.into(),
        }
    }
}

/// Termination status reported by a backend after `optimize`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Optimal,
    Suboptimal,
    TimeLimit,
    Infeasible,
    Unbounded,
    /// Any other terminal state, with the backend's own description
    Other(String),
}

/// Common interface for MIP backends.
///
/// The protocol is: declare every variable, add constraints, set the
/// objective, call `optimize` once, then read values. Handles returned by
/// `declare_variable` are positional and match the `Problem`'s `VarId`s.
pub trait OptimizationBackend {
    fn declare_variable(&mut self, variable: &Variable) -> Result<VarId, BackendError>;

    fn add_constraint(&mut self, constraint: &Constraint) -> Result<(), BackendError>;

    fn set_objective(&mut self, objective: &Objective) -> Result<(), BackendError>;

    /// Run the search under the given limits
    fn optimize(&mut self, config: &SolverConfig) -> Result<BackendStatus, BackendError>;

    /// Value of a variable in the incumbent, `None` when there is no incumbent
    fn value_of(&self, var: VarId) -> Option<f64>;

    /// Get the backend name for logging/debugging
    fn name(&self) -> &str;
}

/// Absolute tolerance used when checking a time-limited incumbent
pub const INCUMBENT_TOLERANCE: f64 = 1e-6;

/// Status and incumbent values of one backend run
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    pub status: BackendStatus,
    pub values: Option<Vec<f64>>,
}

/// Load `problem` into `backend`, optimize, and collect the incumbent.
pub fn run_backend(
    backend: &mut dyn OptimizationBackend,
    problem: &Problem,
    config: &SolverConfig,
) -> Result<RawResult, BackendError> {
    for (position, variable) in problem.variables().iter().enumerate() {
        let handle = backend.declare_variable(variable)?;
        if handle.index() != position {
            return Err(BackendError::new(
                backend.name(),
                format!(
                    "variable '{}' declared at position {} but got handle {}",
                    variable.name,
                    position,
                    handle.index()
                ),
            ));
        }
    }
    for constraint in problem.constraints() {
        backend.add_constraint(constraint)?;
    }
    backend.set_objective(problem.objective())?;

    log::debug!(
        "{}: optimizing '{}' ({} variables, {} constraints, limit {:?}, {} thread(s))",
        backend.name(),
        problem.name(),
        problem.num_variables(),
        problem.num_constraints(),
        config.time_limit,
        config.threads
    );
    let status = backend.optimize(config)?;

    let values = match status {
        BackendStatus::Optimal | BackendStatus::Suboptimal | BackendStatus::TimeLimit => {
            (0..problem.num_variables())
                .map(|position| backend.value_of(handle_at(position)))
                .collect::<Option<Vec<f64>>>()
        }
        _ => None,
    };

    // Incumbents are checked against the exact problem: a time-limited run may
    // report values without a feasible incumbent, and an approximating backend
    // may accept binaries the exact rows reject.
    let (status, values) = match (status, values) {
        (status, Some(values)) if !problem.is_feasible(&values, INCUMBENT_TOLERANCE) => {
            let violated = problem.violations(&values, INCUMBENT_TOLERANCE);
            match status {
                BackendStatus::TimeLimit => {
                    log::warn!(
                        "{}: time limit reached without a feasible incumbent for '{}'",
                        backend.name(),
                        problem.name()
                    );
                    (BackendStatus::TimeLimit, None)
                }
                status => {
                    log::warn!(
                        "{}: {:?} incumbent for '{}' violates {}",
                        backend.name(),
                        status,
                        problem.name(),
                        violated.join(", ")
                    );
                    (
                        BackendStatus::Other(format!(
                            "incumbent violates {}",
                            violated.join(", ")
                        )),
                        None,
                    )
                }
            }
        }
        (status, values) => (status, values),
    };

    Ok(RawResult { status, values })
}

/// Handle for the variable declared at `position`.
///
/// Backends number variables in declaration order, so they use this to hand
/// out handles.
pub fn handle_at(position: usize) -> VarId {
    VarId::from_index(position)
}


#[cfg(test)]
mod tests {
    use super::scripted::ScriptedBackend;
    use super::*;
    use crate::domain::problem::{ConstraintSense, LinearExpr, ObjectiveSense};

    /// min z subject to z >= 2 x, x = 1
    fn small_problem() -> Problem {
        let mut problem = Problem::new("small");
        let x = problem.add_binary("x");
        let z = problem.add_continuous("z", 0.0, f64::INFINITY);
        problem.add_constraint(
            "bound",
            LinearExpr::new().with(z, 1.0).with(x, -2.0),
            ConstraintSense::GreaterEqual,
            0.0,
        );
        problem.add_constraint("pick", LinearExpr::term(x, 1.0), ConstraintSense::Equal, 1.0);
        problem.set_objective(LinearExpr::term(z, 1.0), ObjectiveSense::Minimize);
        problem
    }

    #[test]
    fn test_run_backend_given_optimal_should_collect_values_in_declaration_order() {
        let mut backend = ScriptedBackend::new(BackendStatus::Optimal)
            .set("x", 1.0)
            .set("z", 2.0);
        let config = SolverConfig::default();
        let raw = run_backend(&mut backend, &small_problem(), &config).unwrap();
        assert_eq!(raw.status, BackendStatus::Optimal);
        assert_eq!(raw.values, Some(vec![1.0, 2.0]));
        assert_eq!(backend.constraints_seen, 2);
        assert_eq!(backend.config_seen, Some(config));
    }

    #[test]
    fn test_run_backend_given_infeasible_should_have_no_values() {
        let mut backend = ScriptedBackend::new(BackendStatus::Infeasible).set("x", 1.0);
        let raw = run_backend(&mut backend, &small_problem(), &SolverConfig::default()).unwrap();
        assert_eq!(raw.status, BackendStatus::Infeasible);
        assert_eq!(raw.values, None);
    }

    #[test]
    fn test_run_backend_given_time_limit_should_keep_only_feasible_incumbent() {
        let config = SolverConfig::default();

        let mut feasible = ScriptedBackend::new(BackendStatus::TimeLimit)
            .set("x", 1.0)
            .set("z", 3.0);
        let raw = run_backend(&mut feasible, &small_problem(), &config).unwrap();
        assert_eq!(raw.values, Some(vec![1.0, 3.0]));

        let mut infeasible = ScriptedBackend::new(BackendStatus::TimeLimit)
            .set("x", 1.0)
            .set("z", 1.0);
        let raw = run_backend(&mut infeasible, &small_problem(), &config).unwrap();
        assert_eq!(raw.status, BackendStatus::TimeLimit);
        assert_eq!(raw.values, None);
    }

    #[test]
    fn test_run_backend_given_optimal_incumbent_violating_rows_should_flag_and_drop_values() {
        // z = 1 breaks `bound` (z >= 2 x) although the backend claims optimality
        let mut backend = ScriptedBackend::new(BackendStatus::Optimal)
            .set("x", 1.0)
            .set("z", 1.0);
        let raw = run_backend(&mut backend, &small_problem(), &SolverConfig::default()).unwrap();
        assert_eq!(raw.values, None);
        match raw.status {
            BackendStatus::Other(details) => assert!(details.contains("bound"), "{}", details),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_run_backend_given_misnumbered_handles_should_return_error() {
        let mut backend = ScriptedBackend::new(BackendStatus::Optimal).misnumbered();
        let err = run_backend(&mut backend, &small_problem(), &SolverConfig::default()).unwrap_err();
        assert_eq!(err.backend, "scripted");
        assert!(err.details.contains("'x'"));
    }

    #[test]
    fn test_run_backend_given_optimize_failure_should_propagate() {
        let mut backend = ScriptedBackend::new(BackendStatus::Optimal).failing("license expired");
        let err = run_backend(&mut backend, &small_problem(), &SolverConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "scripted: license expired");
    }
}
