//! One model builder per p-center variant.
//!
//! Every model opens centers through binary `y[j]` variables and minimizes a
//! continuous epigraph variable `max_distance` that every realized
//! client-to-center distance is bounded by.

pub mod capacitated;
pub mod classical;
pub mod failure;
pub mod stratified;

pub use capacitated::CapacitatedModel;
pub use classical::ClassicalModel;
pub use failure::FailureModel;
pub use stratified::StratifiedModel;

use crate::domain::indexer::{TripleIndex, VariableIndexer};
use crate::domain::instance::Instance;
use crate::domain::problem::{ConstraintSense, LinearExpr, ObjectiveSense, Problem, VarId};
use crate::domain::variant::Variant;
use crate::error::Result;

/// Compiles an instance into a `Problem` for one variant
pub trait ModelBuilder {
    fn build(&self, instance: &Instance) -> Result<CompiledModel>;

    fn variant(&self) -> Variant;
}

/// Create a model builder for the specified variant
pub fn create_builder(variant: Variant) -> Box<dyn ModelBuilder> {
    match variant {
        Variant::Classical => Box::new(ClassicalModel),
        Variant::Capacitated => Box::new(CapacitatedModel),
        Variant::Failure => Box::new(FailureModel),
        Variant::Stratified => Box::new(StratifiedModel),
    }
}

/// A built problem together with the handles needed to decode its solution
#[derive(Debug, Clone)]
pub struct CompiledModel {
    pub variant: Variant,
    pub problem: Problem,
    /// `y[j]`, one per node
    pub open: Vec<VarId>,
    pub max_distance: VarId,
    pub layout: Layout,
}

#[derive(Debug, Clone)]
pub enum Layout {
    /// Classical and capacitated models: one assignment per client
    Single { primary: AssignmentVars },
    /// Failure model: primary and backup assignment per client
    Resilient {
        primary: AssignmentVars,
        backup: AssignmentVars,
    },
    /// Stratified model: assignments exist only for admissible triples
    Stratified(StratifiedVars),
}

/// Dense `client x center` grid of binary assignment variables
#[derive(Debug, Clone)]
pub struct AssignmentVars {
    n: usize,
    vars: Vec<VarId>,
}

impl AssignmentVars {
    pub fn get(&self, client: usize, center: usize) -> VarId {
        self.vars[client * self.n + center]
    }

    /// Assignment variables of one client, in center order
    pub fn row(&self, client: usize) -> &[VarId] {
        &self.vars[client * self.n..(client + 1) * self.n]
    }

    pub fn num_clients(&self) -> usize {
        self.n
    }
}

/// Sparse assignment variables of the stratified model, addressed through the indexer
#[derive(Debug, Clone)]
pub struct StratifiedVars {
    pub indexer: VariableIndexer,
    pub primary: Vec<VarId>,
    pub backup: Vec<VarId>,
    /// `A[s]`: bound on primary distances within stratum `s`
    pub primary_bounds: Vec<VarId>,
    /// `B[s]`: bound on backup distances within stratum `s`
    pub backup_bounds: Vec<VarId>,
}

impl StratifiedVars {
    pub fn primary(&self, idx: TripleIndex) -> VarId {
        self.primary[idx.get()]
    }

    pub fn backup(&self, idx: TripleIndex) -> VarId {
        self.backup[idx.get()]
    }
}

/// `y[j]` for every node plus `sum(y) = p`
pub(crate) fn add_centers(problem: &mut Problem, instance: &Instance) -> Vec<VarId> {
    let open: Vec<VarId> = (0..instance.num_nodes())
        .map(|j| problem.add_binary(format!("y[{}]", j)))
        .collect();
    let count: LinearExpr = open.iter().map(|&y| (y, 1.0)).collect();
    problem.add_constraint(
        "num_centers",
        count,
        ConstraintSense::Equal,
        instance.num_centers() as f64,
    );
    open
}

pub(crate) fn add_epigraph(problem: &mut Problem, name: &str) -> VarId {
    problem.add_continuous(name, 0.0, f64::INFINITY)
}

pub(crate) fn minimize(problem: &mut Problem, var: VarId) {
    problem.set_objective(LinearExpr::term(var, 1.0), ObjectiveSense::Minimize);
}

/// Declare `prefix[i,j]` for every pair and add the assignment rows:
/// each client to exactly one center, only to opened centers, never across
/// an infinite distance.
pub(crate) fn add_assignment(
    problem: &mut Problem,
    instance: &Instance,
    open: &[VarId],
    prefix: &str,
) -> AssignmentVars {
    let n = instance.num_nodes();
    let vars: Vec<VarId> = (0..n * n)
        .map(|k| problem.add_binary(format!("{}[{},{}]", prefix, k / n, k % n)))
        .collect();
    let grid = AssignmentVars { n, vars };

    for i in 0..n {
        let row: LinearExpr = grid.row(i).iter().map(|&x| (x, 1.0)).collect();
        problem.add_constraint(
            format!("assign_{}[{}]", prefix, i),
            row,
            ConstraintSense::Equal,
            1.0,
        );
    }

    for i in 0..n {
        for j in 0..n {
            let x = grid.get(i, j);
            problem.add_constraint(
                format!("open_{}[{},{}]", prefix, i, j),
                LinearExpr::new().with(x, 1.0).with(open[j], -1.0),
                ConstraintSense::LessEqual,
                0.0,
            );
            if instance.distance(i, j).is_infinite() {
                forbid(problem, format!("unreachable_{}[{},{}]", prefix, i, j), x);
            }
        }
    }

    grid
}

/// `var <= 0`, used instead of an infinite distance coefficient
pub(crate) fn forbid(problem: &mut Problem, name: String, var: VarId) {
    problem.add_constraint(name, LinearExpr::term(var, 1.0), ConstraintSense::LessEqual, 0.0);
}

/// `sum_j d[i][j] * x[i,j] - bound <= 0` for every client.
pub(crate) fn add_distance_limit(
    problem: &mut Problem,
    instance: &Instance,
    grid: &AssignmentVars,
    bound: VarId,
    name: &str,
) {
    for i in 0..grid.num_clients() {
        let expr = distance_expr(instance, i, grid.row(i).iter().copied().enumerate()).with(bound, -1.0);
        problem.add_constraint(
            format!("{}[{}]", name, i),
            expr,
            ConstraintSense::LessEqual,
            0.0,
        );
    }
}

/// `sum_i demand[i] * x[i,j] <= capacity[j]` for every center.
pub(crate) fn add_capacity_limit(
    problem: &mut Problem,
    instance: &Instance,
    grid: &AssignmentVars,
    name: &str,
) -> Result<()> {
    let data = instance.capacity_data()?;
    for j in 0..instance.num_nodes() {
        let load: LinearExpr = (0..instance.num_nodes())
            .map(|i| (grid.get(i, j), data.demands[i] as f64))
            .collect();
        problem.add_constraint(
            format!("{}[{}]", name, j),
            load,
            ConstraintSense::LessEqual,
            data.capacities[j],
        );
    }
    Ok(())
}

/// `sum d[client][center] * var` over finite distances.
///
/// Pairs at infinite distance are forbidden separately, so leaving them out
/// keeps every coefficient finite.
pub(crate) fn distance_expr(
    instance: &Instance,
    client: usize,
    vars: impl Iterator<Item = (usize, VarId)>,
) -> LinearExpr {
    vars.filter_map(|(center, var)| {
        let d = instance.distance(client, center);
        d.is_finite().then_some((var, d))
    })
    .collect()
}
