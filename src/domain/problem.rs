//! Backend-neutral mixed-integer linear problem.
//!
//! Model builders emit a `Problem`; backends consume it through the
//! `OptimizationBackend` protocol.

use std::fmt;

/// Handle of a decision variable inside one `Problem`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    pub(crate) fn from_index(index: usize) -> Self {
        VarId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    Continuous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    pub upper: f64,
}

/// Sparse linear expression `sum(coeff * var)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(var: VarId, coeff: f64) -> Self {
        LinearExpr {
            terms: vec![(var, coeff)],
        }
    }

    /// Append a term. Zero coefficients are dropped.
    pub fn add(&mut self, var: VarId, coeff: f64) -> &mut Self {
        if coeff != 0.0 {
            self.terms.push((var, coeff));
        }
        self
    }

    pub fn with(mut self, var: VarId, coeff: f64) -> Self {
        self.add(var, coeff);
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coeff)| coeff * values[var.index()])
            .sum()
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        let mut expr = LinearExpr::new();
        for (var, coeff) in iter {
            expr.add(var, coeff);
        }
        expr
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    LessEqual,
    Equal,
    GreaterEqual,
}

impl fmt::Display for ConstraintSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstraintSense::LessEqual => "<=",
            ConstraintSense::Equal => "=",
            ConstraintSense::GreaterEqual => ">=",
        })
    }
}

/// Linear constraint `expr (<=|=|>=) rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

impl Constraint {
    pub fn is_satisfied_by(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            ConstraintSense::LessEqual => lhs <= self.rhs + tolerance,
            ConstraintSense::Equal => (lhs - self.rhs).abs() <= tolerance,
            ConstraintSense::GreaterEqual => lhs >= self.rhs - tolerance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub expr: LinearExpr,
    pub sense: ObjectiveSense,
}

/// A complete mixed-integer linear problem
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Objective,
}

impl Problem {
    pub fn new(name: impl Into<String>) -> Self {
        Problem {
            name: name.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: Objective {
                expr: LinearExpr::new(),
                sense: ObjectiveSense::Minimize,
            },
        }
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(Variable {
            name: name.into(),
            kind: VarKind::Binary,
            lower: 0.0,
            upper: 1.0,
        })
    }

    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_variable(Variable {
            name: name.into(),
            kind: VarKind::Continuous,
            lower,
            upper,
        })
    }

    fn add_variable(&mut self, variable: Variable) -> VarId {
        self.variables.push(variable);
        VarId(self.variables.len() - 1)
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        sense: ConstraintSense,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            expr,
            sense,
            rhs,
        });
    }

    pub fn set_objective(&mut self, expr: LinearExpr, sense: ObjectiveSense) {
        self.objective = Objective { expr, sense };
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, var: VarId) -> &Variable {
        &self.variables[var.index()]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.expr.evaluate(values)
    }

    /// Names of the constraints and bounds violated by `values`
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<String> {
        let mut violated = Vec::new();

        if values.len() != self.variables.len() {
            violated.push(format!(
                "expected {} values, got {}",
                self.variables.len(),
                values.len()
            ));
            return violated;
        }

        for (variable, &value) in self.variables.iter().zip(values) {
            let in_bounds = value >= variable.lower - tolerance && value <= variable.upper + tolerance;
            let integral = variable.kind == VarKind::Continuous || (value - value.round()).abs() <= tolerance;
            if !in_bounds || !integral {
                violated.push(variable.name.clone());
            }
        }

        for constraint in &self.constraints {
            if !constraint.is_satisfied_by(values, tolerance) {
                violated.push(constraint.name.clone());
            }
        }

        violated
    }

    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        self.violations(values, tolerance).is_empty()
    }
}
