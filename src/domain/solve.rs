use crate::config::SolverConfig;
use crate::domain::backend::{run_backend, BackendError, OptimizationBackend};
use crate::domain::extract::extract;
use crate::domain::instance::Instance;
use crate::domain::models::{create_builder, CompiledModel};
use crate::domain::solution::Solution;
use crate::domain::variant::Variant;
use crate::error::{PCenterError, Result};

/// Build the model of `variant` for `instance` without solving it
pub fn compile(instance: &Instance, variant: Variant) -> Result<CompiledModel> {
    create_builder(variant).build(instance)
}

/// Compile, optimize and decode one instance.
///
/// Instance errors are reported before the backend is touched. Backend
/// failures are wrapped with the variant and instance name.
pub fn solve_instance(
    instance: &Instance,
    variant: Variant,
    backend: &mut dyn OptimizationBackend,
    config: &SolverConfig,
) -> Result<Solution> {
    let model = compile(instance, variant)?;

    let with_context = |source: BackendError| {
        log::error!(
            "{} model of '{}' failed: {}",
            variant,
            instance.name(),
            source
        );
        PCenterError::BackendFailure {
            variant: variant.to_string(),
            instance: instance.name().to_string(),
            source,
        }
    };

    let raw = run_backend(backend, &model.problem, config).map_err(with_context)?;
    let solution = extract(&model, instance, &raw).map_err(with_context)?;

    log::info!(
        "Solved '{}' ({}) with {}: {:?}, objective {:?}",
        instance.name(),
        variant,
        backend.name(),
        solution.status,
        solution.objective_value
    );

    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backend::scripted::ScriptedBackend;
    use crate::domain::backend::BackendStatus;
    use crate::domain::models::test_support::four_nodes;
    use crate::domain::solution::SolveStatus;
    use std::collections::{BTreeMap, BTreeSet};
    use std::time::Duration;

    fn classical_optimum() -> ScriptedBackend {
        ScriptedBackend::new(BackendStatus::Optimal)
            .set("y[1]", 1.0)
            .set("y[3]", 1.0)
            .set("max_distance", 3.0)
            .set("x[0,1]", 1.0)
            .set("x[1,1]", 1.0)
            .set("x[2,1]", 1.0)
            .set("x[3,3]", 1.0)
    }

    #[test]
    fn test_solve_instance_given_optimal_incumbent_should_decode_solution() {
        let instance = four_nodes(2);
        let mut backend = classical_optimum();
        let config = SolverConfig::default().with_time_limit(Duration::from_secs(5));

        let solution =
            solve_instance(&instance, Variant::Classical, &mut backend, &config).unwrap();

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective_value, Some(3.0));
        assert_eq!(solution.centers, BTreeSet::from([1, 3]));
        assert_eq!(
            solution.assignments,
            BTreeMap::from([(0, 1), (1, 1), (2, 1), (3, 3)])
        );
        assert_eq!(backend.config_seen, Some(config));
    }

    #[test]
    fn test_solve_instance_given_infeasible_should_return_empty_solution() {
        let instance = four_nodes(2);
        let mut backend = ScriptedBackend::new(BackendStatus::Infeasible);

        let solution = solve_instance(
            &instance,
            Variant::Capacitated,
            &mut backend,
            &SolverConfig::default(),
        )
        .unwrap();

        assert_eq!(solution.status, SolveStatus::NoSolution);
        assert!(solution.centers.is_empty());
        assert_eq!(solution.objective_value, None);
    }

    #[test]
    fn test_solve_instance_given_backend_failure_should_wrap_context() {
        let instance = four_nodes(2);
        let mut backend = ScriptedBackend::new(BackendStatus::Optimal).failing("out of memory");

        let err = solve_instance(
            &instance,
            Variant::Failure,
            &mut backend,
            &SolverConfig::default(),
        )
        .unwrap_err();

        match &err {
            PCenterError::BackendFailure {
                variant, instance, ..
            } => {
                assert_eq!(variant, "failure");
                assert_eq!(instance, "four");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("out of memory"));
    }

    #[test]
    fn test_solve_instance_given_unassigned_client_should_report_error_status() {
        let instance = four_nodes(2);
        let mut backend = ScriptedBackend::new(BackendStatus::Optimal)
            .set("y[1]", 1.0)
            .set("y[3]", 1.0)
            .set("x[0,1]", 1.0);

        let solution = solve_instance(
            &instance,
            Variant::Classical,
            &mut backend,
            &SolverConfig::default(),
        )
        .unwrap();

        assert_eq!(solution.status, SolveStatus::Error);
        assert_eq!(solution.objective_value, None);
        assert!(solution.assignments.is_empty());
        assert!(solution.backend_status.contains("assign_x[1]"), "{}", solution.backend_status);
    }

    #[test]
    fn test_solve_instance_given_backup_closer_than_primary_should_not_return_plan() {
        let instance = four_nodes(2);
        // client 0 keeps the far center 3 as primary and the near center 1 as backup
        let mut backend = ScriptedBackend::new(BackendStatus::Optimal)
            .set("y[1]", 1.0)
            .set("y[3]", 1.0)
            .set("max_distance", 9.0)
            .set("x[0,3]", 1.0)
            .set("w[0,1]", 1.0)
            .set("x[1,1]", 1.0)
            .set("w[1,3]", 1.0)
            .set("x[2,1]", 1.0)
            .set("w[2,3]", 1.0)
            .set("x[3,3]", 1.0)
            .set("w[3,1]", 1.0);

        let solution = solve_instance(
            &instance,
            Variant::Failure,
            &mut backend,
            &SolverConfig::default(),
        )
        .unwrap();

        assert_eq!(solution.status, SolveStatus::Error);
        assert!(solution.backup_assignments.is_none());
        assert!(
            solution
                .backend_status
                .contains("backup_distance_greater_than_primary[0]"),
            "{}",
            solution.backend_status
        );
    }

    #[test]
    fn test_solve_instance_given_invalid_instance_should_not_reach_backend() {
        use crate::domain::metric::DistanceMatrix;
        let distances = DistanceMatrix::from_points(&[[0.0, 0.0], [3.0, 4.0]]).unwrap();
        let instance = Instance::builder("bare", distances, 1).build().unwrap();
        let mut backend = classical_optimum();

        let err = solve_instance(
            &instance,
            Variant::Stratified,
            &mut backend,
            &SolverConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, PCenterError::MalformedInstance(_)));
        assert_eq!(backend.config_seen, None);
    }
}
