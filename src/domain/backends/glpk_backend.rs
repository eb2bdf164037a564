use std::collections::HashMap;

use crate::config::SolverConfig;
use crate::domain::backend::{handle_at, BackendError, BackendStatus, OptimizationBackend};
use crate::domain::problem::{
    Constraint, ConstraintSense, Objective, ObjectiveSense, VarId, VarKind, Variable,
};

use glpk_rust::{
    solve_ilps as glpk_solve_ilps, Bound, IntegerSparseMatrix as GlpkMatrix, Solution,
    SparseLEIntegerPolyhedron as GlpkPoly, Status as GlpkStatus, Variable as GlpkVar,
};

const NO_TERMINAL_OUTPUT: bool = false;
const NAME: &str = "GLPK";

/// `glp_intopt` return codes: no primal / no dual feasible relaxation
const GLP_ENOPFS: i32 = 10;
const GLP_ENODFS: i32 = 11;

/// Fixed-point units per distance unit
pub const DEFAULT_SCALE: i32 = 1000;

/// GLPK backend.
///
/// glpk-rust only solves integer programs over `Ax <= b` with integer
/// coefficients. Continuous variables are therefore expressed in fixed-point
/// units of `1 / scale`: a row `a.x + c.z <= b` over binaries `x` and a
/// continuous `z = z' / scale` is sent as `round(scale * a).x + c.z' <= floor(scale * b)`.
pub struct GlpkBackend {
    scale: i32,
    variables: Vec<Variable>,
    /// `<=` rows: terms and right-hand side
    rows: Vec<(Vec<(usize, f64)>, f64)>,
    objective: Option<Objective>,
    values: Option<Vec<f64>>,
}

impl GlpkBackend {
    pub fn new() -> Self {
        Self::with_scale(DEFAULT_SCALE)
    }

    pub fn with_scale(scale: i32) -> Self {
        GlpkBackend {
            scale: scale.max(1),
            variables: Vec::new(),
            rows: Vec::new(),
            objective: None,
            values: None,
        }
    }

    fn is_continuous(&self, col: usize) -> bool {
        self.variables[col].kind == VarKind::Continuous
    }

    /// Integer coefficient of `col` in a row scaled by `scale`
    fn scaled_coefficient(&self, col: usize, coeff: f64) -> Result<i32, BackendError> {
        let scaled = if self.is_continuous(col) {
            coeff
        } else {
            coeff * self.scale as f64
        };
        to_i32(scaled.round(), || {
            format!(
                "coefficient {} of '{}' does not fit at scale {}",
                coeff, self.variables[col].name, self.scale
            )
        })
    }

    fn scaled_bound(&self, variable: &Variable) -> Bound {
        match variable.kind {
            VarKind::Binary => (0, 1),
            VarKind::Continuous => {
                let scale = self.scale as f64;
                (
                    clamp_i32((variable.lower * scale).ceil()),
                    clamp_i32((variable.upper * scale).floor()),
                )
            }
        }
    }

    /// Convert the buffered rows to a GLPK LE polyhedron borrowing variable names.
    fn to_polyhedron(&self) -> Result<GlpkPoly<'_>, BackendError> {
        let mut rows = Vec::new();
        let mut cols = Vec::new();
        let mut vals = Vec::new();
        let mut b: Vec<Bound> = Vec::with_capacity(self.rows.len());

        for (row_idx, (terms, rhs)) in self.rows.iter().enumerate() {
            for &(col, coeff) in terms {
                let val = self.scaled_coefficient(col, coeff)?;
                if val != 0 {
                    rows.push(row_idx as i32);
                    cols.push(col as i32);
                    vals.push(val);
                }
            }
            let upper = to_i32((rhs * self.scale as f64 + 1e-9).floor(), || {
                format!("right-hand side {} does not fit at scale {}", rhs, self.scale)
            })?;
            b.push((0, upper));
        }

        let variables: Vec<GlpkVar<'_>> = self
            .variables
            .iter()
            .map(|v| GlpkVar {
                id: v.name.as_str(),
                bound: self.scaled_bound(v),
            })
            .collect();

        Ok(GlpkPoly {
            a: GlpkMatrix { rows, cols, vals },
            b,
            variables,
            double_bound: false,
        })
    }

    /// Least values of the continuous columns that the exact rows allow,
    /// given the binaries in `values`.
    ///
    /// GLPK sees distances rounded to `1 / scale`, so its continuous columns
    /// can sit a fraction of a unit below the radius the binaries realize.
    /// Epigraph columns only appear with a negative coefficient on the side
    /// they bound, so raising each one to its tightest row settles them.
    fn tighten_continuous(&self, values: &mut [f64]) {
        for (col, variable) in self.variables.iter().enumerate() {
            if variable.kind == VarKind::Continuous {
                values[col] = if variable.lower.is_finite() { variable.lower } else { 0.0 };
            }
        }

        // A column bounded by another column settles one pass after it
        for _ in 0..=self.variables.len() {
            let mut raised = false;
            for (terms, rhs) in &self.rows {
                for &(col, coeff) in terms {
                    if coeff >= 0.0 || !self.is_continuous(col) {
                        continue;
                    }
                    let rest: f64 = terms
                        .iter()
                        .filter(|&&(other, _)| other != col)
                        .map(|&(other, a)| a * values[other])
                        .sum();
                    let needed = (rest - rhs) / -coeff;
                    if needed > values[col] {
                        values[col] = needed;
                        raised = true;
                    }
                }
            }
            if !raised {
                break;
            }
        }
    }

    fn convert_status(status: &GlpkStatus, error: Option<&str>) -> BackendStatus {
        match status {
            GlpkStatus::Optimal => BackendStatus::Optimal,
            GlpkStatus::Feasible => BackendStatus::Suboptimal,
            GlpkStatus::Infeasible | GlpkStatus::NoFeasible | GlpkStatus::EmptySpace => {
                BackendStatus::Infeasible
            }
            GlpkStatus::Unbounded => BackendStatus::Unbounded,
            GlpkStatus::Undefined => BackendStatus::Other("Undefined".to_string()),
            GlpkStatus::SimplexFailed => BackendStatus::Other("SimplexFailed".to_string()),
            // The presolver stops before branching when the relaxation has no
            // feasible point. Every model here is bounded below, so a dual
            // infeasible relaxation is primal infeasible as well.
            GlpkStatus::MIPFailed => match error.and_then(intopt_code) {
                Some(GLP_ENOPFS) | Some(GLP_ENODFS) => BackendStatus::Infeasible,
                _ => BackendStatus::Other("MIPFailed".to_string()),
            },
        }
    }
}

impl Default for GlpkBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizationBackend for GlpkBackend {
    fn declare_variable(&mut self, variable: &Variable) -> Result<VarId, BackendError> {
        self.variables.push(variable.clone());
        Ok(handle_at(self.variables.len() - 1))
    }

    fn add_constraint(&mut self, constraint: &Constraint) -> Result<(), BackendError> {
        let terms: Vec<(usize, f64)> = constraint
            .expr
            .terms()
            .iter()
            .map(|(var, coeff)| (var.index(), *coeff))
            .collect();
        let negated = || -> Vec<(usize, f64)> { terms.iter().map(|&(col, coeff)| (col, -coeff)).collect() };

        match constraint.sense {
            ConstraintSense::LessEqual => self.rows.push((terms.clone(), constraint.rhs)),
            ConstraintSense::GreaterEqual => self.rows.push((negated(), -constraint.rhs)),
            ConstraintSense::Equal => {
                self.rows.push((terms.clone(), constraint.rhs));
                self.rows.push((negated(), -constraint.rhs));
            }
        }
        Ok(())
    }

    fn set_objective(&mut self, objective: &Objective) -> Result<(), BackendError> {
        self.objective = Some(objective.clone());
        Ok(())
    }

    fn optimize(&mut self, config: &SolverConfig) -> Result<BackendStatus, BackendError> {
        let objective = self
            .objective
            .as_ref()
            .ok_or_else(|| BackendError::new(NAME, "objective was never set"))?;

        // GLPK runs single-threaded and glpk-rust exposes no time limit
        log::debug!(
            "{}: ignoring time limit {:?} and thread count {}",
            NAME,
            config.time_limit,
            config.threads
        );

        let mut polyhedron = self.to_polyhedron()?;
        if polyhedron.a.vals.is_empty() {
            return Err(BackendError::new(NAME, "constraint matrix has no nonzero coefficient"));
        }

        let glpk_objective: HashMap<&str, f64> = objective
            .expr
            .terms()
            .iter()
            .map(|(var, coeff)| {
                let col = var.index();
                let coeff = if self.is_continuous(col) {
                    coeff / self.scale as f64
                } else {
                    *coeff
                };
                (self.variables[col].name.as_str(), coeff)
            })
            .collect();

        let maximize = objective.sense == ObjectiveSense::Maximize;

        // Call the GLPK library solver
        let lib_solutions: Vec<Solution> = glpk_solve_ilps(
            &mut polyhedron,
            vec![glpk_objective],
            maximize,
            NO_TERMINAL_OUTPUT,
        );

        let solution = lib_solutions
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::new(NAME, "solver returned no solution record"))?;

        let status = Self::convert_status(&solution.status, solution.error.as_deref());
        if let (BackendStatus::Other(_), Some(error)) = (&status, &solution.error) {
            return Err(BackendError::new(NAME, error.clone()));
        }
        if status == BackendStatus::Infeasible {
            log::debug!("{}: no feasible solution ({:?})", NAME, solution.error);
        }

        let values = match status {
            BackendStatus::Optimal | BackendStatus::Suboptimal => {
                let scale = self.scale as f64;
                let mut values: Vec<f64> = self
                    .variables
                    .iter()
                    .map(|v| {
                        let raw = solution.solution.get(v.name.as_str()).copied().unwrap_or(0) as f64;
                        match v.kind {
                            VarKind::Binary => raw,
                            VarKind::Continuous => raw / scale,
                        }
                    })
                    .collect();
                if objective.sense == ObjectiveSense::Minimize {
                    self.tighten_continuous(&mut values);
                }
                Some(values)
            }
            _ => None,
        };
        self.values = values;

        Ok(status)
    }

    fn value_of(&self, var: VarId) -> Option<f64> {
        self.values.as_ref().and_then(|v| v.get(var.index()).copied())
    }

    fn name(&self) -> &str {
        NAME
    }
}

/// Return code in glpk-rust's "GLPK MIP solver failed with code: N" message
fn intopt_code(error: &str) -> Option<i32> {
    error.rsplit(':').next()?.trim().parse().ok()
}

fn to_i32(value: f64, context: impl FnOnce() -> String) -> Result<i32, BackendError> {
    if value.is_finite() && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        Ok(value as i32)
    } else {
        Err(BackendError::new(NAME, context()))
    }
}

fn clamp_i32(value: f64) -> i32 {
    if value.is_nan() {
        0
    } else {
        value.clamp(i32::MIN as f64, i32::MAX as f64) as i32
    }
}
