use crate::domain::indexer::VariableIndexer;
use crate::domain::instance::Instance;
use crate::domain::models::{
    add_centers, add_epigraph, distance_expr, forbid, minimize, CompiledModel, Layout,
    ModelBuilder, StratifiedVars,
};
use crate::domain::problem::{ConstraintSense, LinearExpr, Problem, VarId};
use crate::domain::variant::Variant;
use crate::error::Result;

/// Stratified p-center with failure foresight.
///
/// Several strata share one set of opened centers. Within each stratum the
/// failure model's constraints apply, but only over admissible
/// `(stratum, center, client)` triples. `A[s]` and `B[s]` bound the primary
/// and backup distances of stratum `s`, and both are linked to the global
/// `max_distance` that is minimized.
pub struct StratifiedModel;

impl ModelBuilder for StratifiedModel {
    fn build(&self, instance: &Instance) -> Result<CompiledModel> {
        let strata = instance.strata()?;
        let n = instance.num_nodes();
        let num_strata = strata.num_strata();
        let indexer = VariableIndexer::new(strata, n);

        log::debug!(
            "stratified model for '{}': {} admissible triples out of {}",
            instance.name(),
            indexer.count(),
            num_strata * n * n
        );

        let mut problem = Problem::new(format!("stratified p-center {}", instance.name()));

        let open = add_centers(&mut problem, instance);
        let max_distance = add_epigraph(&mut problem, "max_distance");
        let primary_bounds: Vec<VarId> = (0..num_strata)
            .map(|s| add_epigraph(&mut problem, &format!("A[{}]", s)))
            .collect();
        let backup_bounds: Vec<VarId> = (0..num_strata)
            .map(|s| add_epigraph(&mut problem, &format!("B[{}]", s)))
            .collect();

        let mut primary = Vec::with_capacity(indexer.count());
        let mut backup = Vec::with_capacity(indexer.count());
        for (s, j, i, _) in indexer.iter() {
            primary.push(problem.add_binary(format!("x[{},{},{}]", s, j, i)));
        }
        for (s, j, i, _) in indexer.iter() {
            backup.push(problem.add_binary(format!("w[{},{},{}]", s, j, i)));
        }
        let vars = StratifiedVars {
            indexer,
            primary,
            backup,
            primary_bounds,
            backup_bounds,
        };
        let indexer = &vars.indexer;

        for s in 0..num_strata {
            let members: Vec<usize> = (0..n).filter(|&i| strata.is_member(i, s)).collect();

            for &i in &members {
                // exactly one primary and one backup among the admissible centers
                let x_row: LinearExpr = indexer
                    .centers_for(s, i)
                    .map(|(_, idx)| (vars.primary(idx), 1.0))
                    .collect();
                let w_row: LinearExpr = indexer
                    .centers_for(s, i)
                    .map(|(_, idx)| (vars.backup(idx), 1.0))
                    .collect();
                problem.add_constraint(format!("assign_x[{},{}]", s, i), x_row, ConstraintSense::Equal, 1.0);
                problem.add_constraint(format!("assign_w[{},{}]", s, i), w_row, ConstraintSense::Equal, 1.0);

                for (j, idx) in indexer.centers_for(s, i) {
                    let x = vars.primary(idx);
                    let w = vars.backup(idx);
                    problem.add_constraint(
                        format!("open_x[{},{},{}]", s, i, j),
                        LinearExpr::new().with(x, 1.0).with(open[j], -1.0),
                        ConstraintSense::LessEqual,
                        0.0,
                    );
                    problem.add_constraint(
                        format!("open_w[{},{},{}]", s, i, j),
                        LinearExpr::new().with(w, 1.0).with(open[j], -1.0),
                        ConstraintSense::LessEqual,
                        0.0,
                    );
                    problem.add_constraint(
                        format!("primary_backup_different[{},{},{}]", s, i, j),
                        LinearExpr::new().with(x, 1.0).with(w, 1.0),
                        ConstraintSense::LessEqual,
                        1.0,
                    );
                    if instance.distance(i, j).is_infinite() {
                        forbid(&mut problem, format!("unreachable_x[{},{},{}]", s, i, j), x);
                        forbid(&mut problem, format!("unreachable_w[{},{},{}]", s, i, j), w);
                    }
                }

                let primary_distance = distance_expr(
                    instance,
                    i,
                    indexer.centers_for(s, i).map(|(j, idx)| (j, vars.primary(idx))),
                );
                let backup_distance = distance_expr(
                    instance,
                    i,
                    indexer.centers_for(s, i).map(|(j, idx)| (j, vars.backup(idx))),
                );

                problem.add_constraint(
                    format!("max_distance_primary[{},{}]", s, i),
                    primary_distance.clone().with(vars.primary_bounds[s], -1.0),
                    ConstraintSense::LessEqual,
                    0.0,
                );
                problem.add_constraint(
                    format!("max_distance_backup[{},{}]", s, i),
                    backup_distance.clone().with(vars.backup_bounds[s], -1.0),
                    ConstraintSense::LessEqual,
                    0.0,
                );

                let mut farther = backup_distance;
                for &(var, d) in primary_distance.terms() {
                    farther.add(var, -d);
                }
                problem.add_constraint(
                    format!("backup_distance_constraint[{},{}]", s, i),
                    farther,
                    ConstraintSense::GreaterEqual,
                    0.0,
                );
            }

            for j in (0..n).filter(|&j| strata.is_eligible(j, s)) {
                let capacity = strata.capacity(j, s);
                let headroom = (1.0 + strata.alpha(s)) * capacity;

                let mut primary_load: LinearExpr = indexer
                    .clients_for(s, j)
                    .map(|(i, idx)| (vars.primary(idx), strata.demand(i, s) as f64))
                    .collect();
                primary_load.add(open[j], -capacity);
                problem.add_constraint(
                    format!("capacity_primary[{},{}]", s, j),
                    primary_load,
                    ConstraintSense::LessEqual,
                    0.0,
                );

                let mut total_load: LinearExpr = indexer
                    .clients_for(s, j)
                    .flat_map(|(i, idx)| {
                        let demand = strata.demand(i, s) as f64;
                        [(vars.primary(idx), demand), (vars.backup(idx), demand)]
                    })
                    .collect();
                total_load.add(open[j], -headroom);
                problem.add_constraint(
                    format!("capacity_total[{},{}]", s, j),
                    total_load,
                    ConstraintSense::LessEqual,
                    0.0,
                );
            }

            problem.add_constraint(
                format!("link_primary[{}]", s),
                LinearExpr::new()
                    .with(vars.primary_bounds[s], 1.0)
                    .with(max_distance, -1.0),
                ConstraintSense::LessEqual,
                0.0,
            );
            problem.add_constraint(
                format!("link_backup[{}]", s),
                LinearExpr::new()
                    .with(vars.backup_bounds[s], 1.0)
                    .with(max_distance, -1.0),
                ConstraintSense::LessEqual,
                0.0,
            );
        }

        minimize(&mut problem, max_distance);

        Ok(CompiledModel {
            variant: Variant::Stratified,
            problem,
            open,
            max_distance,
            layout: Layout::Stratified(vars),
        })
    }

    fn variant(&self) -> Variant {
        Variant::Stratified
    }
}
