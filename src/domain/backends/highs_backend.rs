use crate::config::SolverConfig;
use crate::domain::backend::{handle_at, BackendError, BackendStatus, OptimizationBackend};
use crate::domain::problem::{
    Constraint, ConstraintSense, Objective, ObjectiveSense, VarId, VarKind, Variable,
};

use ::highs::{ColProblem, HighsModelStatus, Sense};

const NAME: &str = "HiGHS";

/// HiGHS backend
pub struct HighsBackend {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Option<Objective>,
    values: Option<Vec<f64>>,
}

impl HighsBackend {
    pub fn new() -> Self {
        HighsBackend {
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: None,
            values: None,
        }
    }

    /// Convert HiGHS status to a backend status
    fn convert_status(model_status: HighsModelStatus) -> BackendStatus {
        match model_status {
            HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => BackendStatus::Optimal,
            HighsModelStatus::Infeasible => BackendStatus::Infeasible,
            HighsModelStatus::UnboundedOrInfeasible => BackendStatus::Unbounded,
            HighsModelStatus::Unbounded => BackendStatus::Unbounded,
            HighsModelStatus::ReachedTimeLimit => BackendStatus::TimeLimit,
            other => BackendStatus::Other(format!("{:?}", other)),
        }
    }
}

impl Default for HighsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizationBackend for HighsBackend {
    fn declare_variable(&mut self, variable: &Variable) -> Result<VarId, BackendError> {
        self.variables.push(variable.clone());
        Ok(handle_at(self.variables.len() - 1))
    }

    fn add_constraint(&mut self, constraint: &Constraint) -> Result<(), BackendError> {
        self.constraints.push(constraint.clone());
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

        let sense = match objective.sense {
            ObjectiveSense::Maximize => Sense::Maximise,
            ObjectiveSense::Minimize => Sense::Minimise,
        };

        let mut problem = ColProblem::new();

        // First, add all constraint rows
        let mut rows = Vec::with_capacity(self.constraints.len());
        for constraint in &self.constraints {
            let rhs = constraint.rhs;
            let row = match constraint.sense {
                ConstraintSense::LessEqual => problem.add_row(..=rhs),
                ConstraintSense::GreaterEqual => problem.add_row(rhs..),
                ConstraintSense::Equal => problem.add_row(rhs..=rhs),
            };
            rows.push(row);
        }

        // For each column, collect its row entries
        let mut col_data: Vec<Vec<(usize, f64)>> = vec![Vec::new(); self.variables.len()];
        for (row_idx, constraint) in self.constraints.iter().enumerate() {
            for (var, coeff) in constraint.expr.terms() {
                col_data[var.index()].push((row_idx, *coeff));
            }
        }

        let mut obj_coeffs = vec![0.0; self.variables.len()];
        for (var, coeff) in objective.expr.terms() {
            obj_coeffs[var.index()] += coeff;
        }

        for (col_idx, variable) in self.variables.iter().enumerate() {
            let row_factors: Vec<_> = col_data[col_idx]
                .iter()
                .map(|(row_idx, val)| (rows[*row_idx], *val))
                .collect();
            let obj_coeff = obj_coeffs[col_idx];

            match variable.kind {
                VarKind::Binary => {
                    problem.add_integer_column(obj_coeff, 0.0..=1.0, &row_factors);
                }
                VarKind::Continuous if variable.upper.is_infinite() => {
                    problem.add_column(obj_coeff, variable.lower.., &row_factors);
                }
                VarKind::Continuous => {
                    problem.add_column(obj_coeff, variable.lower..=variable.upper, &row_factors);
                }
            }
        }

        let mut model = problem.optimise(sense);
        model.set_option("output_flag", false);
        model.set_option("time_limit", config.time_limit.as_secs_f64());
        model.set_option("threads", config.threads as i32);
        let solved = model.solve();

        let status = Self::convert_status(solved.status());

        self.values = match status {
            BackendStatus::Optimal | BackendStatus::Suboptimal | BackendStatus::TimeLimit => {
                let columns = solved.get_solution().columns().to_vec();
                (columns.len() == self.variables.len()).then_some(columns)
            }
            _ => None,
        };

        Ok(status)
    }

    fn value_of(&self, var: VarId) -> Option<f64> {
        self.values.as_ref().and_then(|v| v.get(var.index()).copied())
    }

    fn name(&self) -> &str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_status_given_time_limit_should_keep_incumbent_state() {
        assert_eq!(
            HighsBackend::convert_status(HighsModelStatus::ReachedTimeLimit),
            BackendStatus::TimeLimit
        );
        assert_eq!(
            HighsBackend::convert_status(HighsModelStatus::Infeasible),
            BackendStatus::Infeasible
        );
    }
}
