use crate::domain::instance::Instance;
use crate::domain::models::{
    add_assignment, add_capacity_limit, add_centers, add_distance_limit, add_epigraph,
    distance_expr, minimize, AssignmentVars, CompiledModel, Layout, ModelBuilder,
};
use crate::domain::problem::{ConstraintSense, LinearExpr, Problem};
use crate::domain::variant::Variant;
use crate::error::Result;

/// Capacitated p-center with failure foresight.
///
/// Every client gets a primary center `x` and a distinct backup center `w`
/// that is never closer than the primary. A center must carry its primary
/// load within capacity, and its primary plus backup load within
/// `(1 + alpha) * capacity`, the headroom it needs when a neighbouring center
/// fails and its clients fall back.
pub struct FailureModel;

impl ModelBuilder for FailureModel {
    fn build(&self, instance: &Instance) -> Result<CompiledModel> {
        let data = instance.capacity_data()?;
        let alpha = instance.alpha()?;
        let n = instance.num_nodes();

        let mut problem = Problem::new(format!("p-center with failure foresight {}", instance.name()));

        let open = add_centers(&mut problem, instance);
        let max_distance = add_epigraph(&mut problem, "max_distance");
        let primary = add_assignment(&mut problem, instance, &open, "x");
        let backup = add_assignment(&mut problem, instance, &open, "w");

        for i in 0..n {
            for j in 0..n {
                problem.add_constraint(
                    format!("primary_backup_different[{},{}]", i, j),
                    LinearExpr::new()
                        .with(primary.get(i, j), 1.0)
                        .with(backup.get(i, j), 1.0),
                    ConstraintSense::LessEqual,
                    1.0,
                );
            }
        }

        for i in 0..n {
            add_backup_farther(&mut problem, instance, i, &primary, &backup);
        }

        add_capacity_limit(&mut problem, instance, &primary, "capacity_limit_primary")?;
        for j in 0..n {
            let load: LinearExpr = (0..n)
                .flat_map(|i| {
                    let demand = data.demands[i] as f64;
                    [(primary.get(i, j), demand), (backup.get(i, j), demand)]
                })
                .collect();
            problem.add_constraint(
                format!("capacity_limit_backup[{}]", j),
                load,
                ConstraintSense::LessEqual,
                (1.0 + alpha) * data.capacities[j],
            );
        }

        add_distance_limit(&mut problem, instance, &primary, max_distance, "primary_distance_limit");
        add_distance_limit(&mut problem, instance, &backup, max_distance, "backup_distance_limit");
        minimize(&mut problem, max_distance);

        Ok(CompiledModel {
            variant: Variant::Failure,
            problem,
            open,
            max_distance,
            layout: Layout::Resilient { primary, backup },
        })
    }

    fn variant(&self) -> Variant {
        Variant::Failure
    }
}

/// `sum_j d[i][j] * w[i,j] - sum_j d[i][j] * x[i,j] >= 0`
fn add_backup_farther(
    problem: &mut Problem,
    instance: &Instance,
    client: usize,
    primary: &AssignmentVars,
    backup: &AssignmentVars,
) {
    let mut expr = distance_expr(instance, client, backup.row(client).iter().copied().enumerate());
    for &(var, d) in distance_expr(instance, client, primary.row(client).iter().copied().enumerate()).terms() {
        expr.add(var, -d);
    }
    problem.add_constraint(
        format!("backup_distance_greater_than_primary[{}]", client),
        expr,
        ConstraintSense::GreaterEqual,
        0.0,
    );
}
