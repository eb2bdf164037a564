use crate::config::SolverConfig;
use crate::domain::backend::{handle_at, BackendError, BackendStatus, OptimizationBackend};
use crate::domain::problem::{
    Constraint, ConstraintSense, Objective, ObjectiveSense, VarId, VarKind, Variable,
};

use grb::prelude::*;

const NAME: &str = "Gurobi";

fn failure(action: &str, e: grb::Error) -> BackendError {
    BackendError::new(NAME, format!("Failed to {}: {}", action, e))
}

/// Gurobi backend
pub struct GurobiBackend {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Option<Objective>,
    values: Option<Vec<f64>>,
}

impl GurobiBackend {
    pub fn new() -> Self {
        GurobiBackend {
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: None,
            values: None,
        }
    }

    /// Convert Gurobi status to a backend status
    fn convert_status(status: grb::Status) -> BackendStatus {
        match status {
            grb::Status::Optimal => BackendStatus::Optimal,
            grb::Status::SubOptimal => BackendStatus::Suboptimal,
            grb::Status::TimeLimit => BackendStatus::TimeLimit,
            grb::Status::Infeasible => BackendStatus::Infeasible,
            grb::Status::InfOrUnbd | grb::Status::Unbounded => BackendStatus::Unbounded,
            other => BackendStatus::Other(format!("{:?}", other)),
        }
    }

    fn linear(expr: &crate::domain::problem::LinearExpr, vars: &[Var]) -> Expr {
        expr.terms()
            .iter()
            .fold(Expr::Constant(0.0), |acc, (var, coeff)| {
                acc + *coeff * vars[var.index()]
            })
    }
}

impl Default for GurobiBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizationBackend for GurobiBackend {
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

        let mut env = Env::new("").map_err(|e| failure("create Gurobi environment", e))?;

        // Disable Gurobi console output
        env.set(param::OutputFlag, 0)
            .map_err(|e| failure("set Gurobi output flag", e))?;
        env.set(param::Threads, config.threads as i32)
            .map_err(|e| failure("set Gurobi thread count", e))?;
        env.set(param::TimeLimit, config.time_limit.as_secs_f64())
            .map_err(|e| failure("set Gurobi time limit", e))?;

        let mut model =
            Model::with_env("p-center", &env).map_err(|e| failure("create Gurobi model", e))?;

        let mut vars: Vec<Var> = Vec::with_capacity(self.variables.len());
        for variable in &self.variables {
            let var = match variable.kind {
                VarKind::Binary => add_binvar!(model, name: &variable.name)
                    .map_err(|e| failure("add binary variable", e))?,
                VarKind::Continuous => add_ctsvar!(
                    model,
                    name: &variable.name,
                    bounds: variable.lower..variable.upper
                )
                .map_err(|e| failure("add continuous variable", e))?,
            };
            vars.push(var);
        }

        model
            .update()
            .map_err(|e| failure("update model after adding variables", e))?;

        for constraint in &self.constraints {
            let expr = Self::linear(&constraint.expr, &vars);
            let rhs = constraint.rhs;
            let constr = match constraint.sense {
                ConstraintSense::LessEqual => c!(expr <= rhs),
                ConstraintSense::GreaterEqual => c!(expr >= rhs),
                ConstraintSense::Equal => c!(expr == rhs),
            };
            model
                .add_constr(&constraint.name, constr)
                .map_err(|e| failure("add constraint", e))?;
        }

        let sense = match objective.sense {
            ObjectiveSense::Maximize => ModelSense::Maximize,
            ObjectiveSense::Minimize => ModelSense::Minimize,
        };
        model
            .set_objective(Self::linear(&objective.expr, &vars), sense)
            .map_err(|e| failure("set objective", e))?;

        model.optimize().map_err(|e| failure("optimize", e))?;

        let status = Self::convert_status(
            model
                .status()
                .map_err(|e| failure("get model status", e))?,
        );

        let solution_count = model
            .get_attr(attr::SolCount)
            .map_err(|e| failure("get solution count", e))?;

        self.values = if solution_count > 0 {
            let values = vars
                .iter()
                .map(|var| model.get_obj_attr(attr::X, var))
                .collect::<grb::Result<Vec<f64>>>()
                .map_err(|e| failure("read solution values", e))?;
            Some(values)
        } else {
            None
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
