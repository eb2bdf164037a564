use std::time::Duration;

use crate::config::SolverConfig;
use crate::domain::backend_factory::BackendType;
use crate::domain::instance::{Instance, StrataTables};
use crate::domain::metric::DistanceMatrix;
use crate::domain::pmed::parse_pmed;
use crate::domain::variant::Variant;
use crate::error::{PCenterError, Result};
use crate::models::{ApiInstance, ApiStrata, InstanceSource, SolveRequest};

const DEFAULT_SOLVER: &str = "glpk";

/// A validated solve request, ready for the pipeline
#[derive(Debug, Clone)]
pub struct SolveJob {
    pub instance: Instance,
    pub variant: Variant,
    pub backend: BackendType,
    pub config: SolverConfig,
}

impl SolveJob {
    /// The time limit the backend will actually stop at
    pub fn enforced_time_limit(&self) -> Option<Duration> {
        self.backend
            .enforces_time_limit()
            .then_some(self.config.time_limit)
    }
}

/// Validate a wire request. Selectors are checked before the instance data,
/// and instances above `max_nodes` are rejected before any matrix is built.
pub fn to_solve_job(
    request: &SolveRequest,
    defaults: &SolverConfig,
    max_nodes: usize,
) -> Result<SolveJob> {
    let variant = Variant::parse(&request.variant)?;
    let solver = request.solver.as_deref().unwrap_or(DEFAULT_SOLVER);
    let backend = BackendType::parse(solver)?;

    let config = match request.time_limit_secs {
        Some(0) => return Err(PCenterError::malformed("time_limit_secs must be positive")),
        Some(_) if !backend.enforces_time_limit() => {
            return Err(PCenterError::UnsupportedOption(format!(
                "time_limit_secs is not enforced by solver '{}', which runs until optimal",
                solver
            )))
        }
        Some(secs) => defaults.with_time_limit(Duration::from_secs(secs)),
        None => *defaults,
    };

    let instance = to_instance(&request.instance, max_nodes)?;

    Ok(SolveJob {
        instance,
        variant,
        backend,
        config,
    })
}

/// Convert a wire instance into a validated `Instance`
pub fn to_instance(api: &ApiInstance, max_nodes: usize) -> Result<Instance> {
    let (distances, header_centers) = match &api.source {
        InstanceSource::Edges { num_nodes, edges } => {
            check_node_count(*num_nodes, max_nodes)?;
            (DistanceMatrix::from_edges(*num_nodes, edges)?, None)
        }
        InstanceSource::Pmed { text } => {
            let graph = parse_pmed(text)?;
            check_node_count(graph.num_nodes, max_nodes)?;
            (graph.distances()?, Some(graph.num_centers))
        }
        InstanceSource::Coordinates { points } => {
            check_node_count(points.len(), max_nodes)?;
            (DistanceMatrix::from_points(points)?, None)
        }
        InstanceSource::Matrix { distances } => {
            check_node_count(distances.len(), max_nodes)?;
            (DistanceMatrix::from_dense(distances)?, None)
        }
    };

    let num_centers = api
        .num_centers
        .or(header_centers)
        .ok_or_else(|| PCenterError::malformed("num_centers is required for this source"))?;

    let mut builder = Instance::builder(api.name.as_str(), distances, num_centers);
    if let Some(demands) = &api.demands {
        builder = builder.demands(demands.clone());
    }
    if let Some(capacities) = &api.capacities {
        builder = builder.capacities(capacities.clone());
    }
    if let Some(alpha) = api.alpha {
        builder = builder.alpha(alpha);
    }
    if let Some(strata) = &api.strata {
        builder = builder.strata(to_strata_tables(strata));
    }
    builder.build()
}

fn check_node_count(num_nodes: usize, max_nodes: usize) -> Result<()> {
    if num_nodes > max_nodes {
        return Err(PCenterError::malformed(format!(
            "instance has {} nodes, the limit is {}",
            num_nodes, max_nodes
        )));
    }
    Ok(())
}

fn to_strata_tables(api: &ApiStrata) -> StrataTables {
    StrataTables {
        num_strata: api.num_strata,
        membership: api.membership.clone(),
        eligibility: api.eligibility.clone(),
        demands: api.demands.clone(),
        capacities: api.capacities.clone(),
        alpha: api.alpha.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_NODES;
    use serde_json::json;

    fn request(body: serde_json::Value) -> SolveRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_to_solve_job_given_pmed_without_num_centers_should_use_header() {
        let req = request(json!({
            "instance": {
                "name": "pmed-small",
                "source": { "kind": "pmed", "text": "4 6 2\n1 2 2\n1 3 5\n1 4 9\n2 3 3\n2 4 7\n3 4 4\n" }
            },
            "variant": "Classical"
        }));
        let job = to_solve_job(&req, &SolverConfig::default(), DEFAULT_MAX_NODES).unwrap();
        assert_eq!(job.variant, Variant::Classical);
        assert_eq!(job.backend, BackendType::Glpk);
        assert_eq!(job.config, SolverConfig::default());
        assert_eq!(job.enforced_time_limit(), None);
        assert_eq!(job.instance.num_centers(), 2);
        assert_eq!(job.instance.name(), "pmed-small");
        assert_eq!(job.instance.distance(0, 3), 9.0);
    }

    #[test]
    fn test_to_solve_job_given_explicit_num_centers_should_override_header() {
        let req = request(json!({
            "instance": {
                "num_centers": 1,
                "source": { "kind": "pmed", "text": "2 1 2\n1 2 3\n" }
            },
            "variant": "classical"
        }));
        let job = to_solve_job(&req, &SolverConfig::default(), DEFAULT_MAX_NODES).unwrap();
        assert_eq!(job.instance.num_centers(), 1);
        assert_eq!(job.config, SolverConfig::default());
    }

    #[test]
    fn test_to_solve_job_given_bad_selectors_should_fail_before_instance() {
        let bad_instance = json!({ "source": { "kind": "matrix", "distances": [[1.0]] } });

        let req = request(json!({ "instance": bad_instance, "variant": "median" }));
        assert!(matches!(
            to_solve_job(&req, &SolverConfig::default(), DEFAULT_MAX_NODES),
            Err(PCenterError::UnknownVariant(_))
        ));

        let req = request(json!({ "instance": bad_instance, "variant": "classical", "solver": "cplex" }));
        assert!(matches!(
            to_solve_job(&req, &SolverConfig::default(), DEFAULT_MAX_NODES),
            Err(PCenterError::UnknownSolver(_))
        ));

        let req = request(json!({ "instance": bad_instance, "variant": "classical" }));
        assert!(matches!(
            to_solve_job(&req, &SolverConfig::default(), DEFAULT_MAX_NODES),
            Err(PCenterError::MalformedInstance(_))
        ));
    }

    #[test]
    fn test_to_solve_job_given_zero_time_limit_should_fail() {
        let req = request(json!({
            "instance": { "num_centers": 1, "source": { "kind": "coordinates", "points": [[0.0, 0.0]] } },
            "variant": "classical",
            "time_limit_secs": 0
        }));
        assert!(to_solve_job(&req, &SolverConfig::default(), DEFAULT_MAX_NODES).is_err());
    }

    #[test]
    fn test_to_instance_should_carry_capacities_and_strata() {
        let api: ApiInstance = serde_json::from_value(json!({
            "name": "strat",
            "num_centers": 1,
            "source": { "kind": "coordinates", "points": [[0.0, 0.0], [3.0, 4.0]] },
            "demands": [1, 2],
            "capacities": [3.0, 3.0],
            "alpha": 0.5,
            "strata": {
                "num_strata": 1,
                "membership": [[true], [true]],
                "eligibility": [[true], [false]],
                "demands": [[1], [2]],
                "capacities": [[3.0], [0.0]],
                "alpha": [0.5]
            }
        }))
        .unwrap();
        let instance = to_instance(&api, DEFAULT_MAX_NODES).unwrap();
        assert_eq!(instance.distance(0, 1), 5.0);
        assert_eq!(instance.capacity_data().unwrap().demands, vec![1, 2]);
        assert_eq!(instance.alpha().unwrap(), 0.5);
        let strata = instance.strata().unwrap();
        assert!(strata.is_eligible(0, 0));
        assert!(!strata.is_eligible(1, 0));
        assert_eq!(strata.demand(1, 0), 2);
    }

    #[test]
    fn test_to_instance_given_missing_num_centers_should_fail() {
        let api: ApiInstance = serde_json::from_value(json!({
            "source": { "kind": "edges", "num_nodes": 2, "edges": [[0, 1, 1.0]] }
        }))
        .unwrap();
        assert!(matches!(to_instance(&api, DEFAULT_MAX_NODES), Err(PCenterError::MalformedInstance(_))));
    }

    #[test]
    fn test_to_solve_job_given_time_limit_for_glpk_should_reject_option() {
        let req = request(json!({
            "instance": { "num_centers": 1, "source": { "kind": "coordinates", "points": [[0.0, 0.0]] } },
            "variant": "classical",
            "solver": "glpk",
            "time_limit_secs": 30
        }));
        let err = to_solve_job(&req, &SolverConfig::default(), DEFAULT_MAX_NODES).unwrap_err();
        assert!(matches!(err, PCenterError::UnsupportedOption(_)));
        assert!(err.is_client_error());
        assert!(err.to_string().contains("glpk"));
    }

    #[cfg(feature = "highs-solver")]
    #[test]
    fn test_to_solve_job_given_time_limit_for_highs_should_enforce_it() {
        let req = request(json!({
            "instance": { "num_centers": 1, "source": { "kind": "coordinates", "points": [[0.0, 0.0]] } },
            "variant": "classical",
            "solver": "highs",
            "time_limit_secs": 30
        }));
        let job = to_solve_job(&req, &SolverConfig::default(), DEFAULT_MAX_NODES).unwrap();
        assert_eq!(job.config.time_limit, Duration::from_secs(30));
        assert_eq!(job.enforced_time_limit(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_to_instance_given_more_nodes_than_limit_should_fail_before_building() {
        let pmed: ApiInstance = serde_json::from_value(json!({
            "source": { "kind": "pmed", "text": "4294967296 0 1" }
        }))
        .unwrap();
        assert!(matches!(
            to_instance(&pmed, DEFAULT_MAX_NODES),
            Err(PCenterError::MalformedInstance(_))
        ));

        let edges: ApiInstance = serde_json::from_value(json!({
            "num_centers": 1,
            "source": { "kind": "edges", "num_nodes": 3, "edges": [[0, 1, 1.0], [1, 2, 1.0]] }
        }))
        .unwrap();
        assert!(to_instance(&edges, 2).is_err());
        assert_eq!(to_instance(&edges, 3).unwrap().num_nodes(), 3);
    }
}
