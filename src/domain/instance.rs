use crate::domain::metric::DistanceMatrix;
use crate::domain::validate::{
    flatten_table, validate_alpha, validate_length, validate_non_negative, validate_num_centers,
};
use crate::error::{PCenterError, Result};

/// Demands and capacities used by the capacitated and failure models
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityData {
    pub demands: Vec<u64>,
    pub capacities: Vec<f64>,
}

/// Stratum membership, eligibility and per-stratum load data.
///
/// Tables are stored row-major by node: entry `(i, s)` lives at `i * num_strata + s`.
#[derive(Debug, Clone, PartialEq)]
pub struct StrataData {
    num_strata: usize,
    membership: Vec<bool>,
    eligibility: Vec<bool>,
    demands: Vec<u64>,
    capacities: Vec<f64>,
    alpha: Vec<f64>,
}

impl StrataData {
    pub fn num_strata(&self) -> usize {
        self.num_strata
    }

    /// Whether client `i` belongs to stratum `s`
    pub fn is_member(&self, i: usize, s: usize) -> bool {
        self.membership[i * self.num_strata + s]
    }

    /// Whether node `j` may serve as a center in stratum `s`
    pub fn is_eligible(&self, j: usize, s: usize) -> bool {
        self.eligibility[j * self.num_strata + s]
    }

    pub fn demand(&self, i: usize, s: usize) -> u64 {
        self.demands[i * self.num_strata + s]
    }

    pub fn capacity(&self, j: usize, s: usize) -> f64 {
        self.capacities[j * self.num_strata + s]
    }

    pub fn alpha(&self, s: usize) -> f64 {
        self.alpha[s]
    }
}

/// Raw per-stratum tables, indexed `[node][stratum]`
#[derive(Debug, Clone, Default)]
pub struct StrataTables {
    pub num_strata: usize,
    pub membership: Vec<Vec<bool>>,
    pub eligibility: Vec<Vec<bool>>,
    pub demands: Vec<Vec<u64>>,
    pub capacities: Vec<Vec<f64>>,
    pub alpha: Vec<f64>,
}

/// A validated, immutable p-center instance
#[derive(Debug, Clone)]
pub struct Instance {
    name: String,
    num_centers: usize,
    distances: DistanceMatrix,
    capacity: Option<CapacityData>,
    alpha: Option<f64>,
    strata: Option<StrataData>,
}

impl Instance {
    pub fn builder(name: impl Into<String>, distances: DistanceMatrix, num_centers: usize) -> InstanceBuilder {
        InstanceBuilder::new(name, distances, num_centers)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_nodes(&self) -> usize {
        self.distances.len()
    }

    pub fn num_centers(&self) -> usize {
        self.num_centers
    }

    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distances.get(i, j)
    }

    /// Demands and capacities, required by the capacitated and failure models
    pub fn capacity_data(&self) -> Result<&CapacityData> {
        self.capacity.as_ref().ok_or_else(|| {
            PCenterError::malformed(format!(
                "Instance '{}' has no demands/capacities",
                self.name
            ))
        })
    }

    /// Failure foresight headroom, required by the failure model
    pub fn alpha(&self) -> Result<f64> {
        self.alpha.ok_or_else(|| {
            PCenterError::malformed(format!("Instance '{}' has no alpha", self.name))
        })
    }

    /// Stratum tables, required by the stratified model
    pub fn strata(&self) -> Result<&StrataData> {
        self.strata.as_ref().ok_or_else(|| {
            PCenterError::malformed(format!("Instance '{}' has no strata", self.name))
        })
    }
}

/// Builder for `Instance`. All consistency checks run in `build`.
#[derive(Debug, Clone)]
pub struct InstanceBuilder {
    name: String,
    distances: DistanceMatrix,
    num_centers: usize,
    demands: Option<Vec<u64>>,
    capacities: Option<Vec<f64>>,
    alpha: Option<f64>,
    strata: Option<StrataTables>,
}

impl InstanceBuilder {
    pub fn new(name: impl Into<String>, distances: DistanceMatrix, num_centers: usize) -> Self {
        InstanceBuilder {
            name: name.into(),
            distances,
            num_centers,
            demands: None,
            capacities: None,
            alpha: None,
            strata: None,
        }
    }

    pub fn demands(mut self, demands: Vec<u64>) -> Self {
        self.demands = Some(demands);
        self
    }

    pub fn capacities(mut self, capacities: Vec<f64>) -> Self {
        self.capacities = Some(capacities);
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn strata(mut self, strata: StrataTables) -> Self {
        self.strata = Some(strata);
        self
    }

    pub fn build(self) -> Result<Instance> {
        let n = self.distances.len();
        validate_num_centers(n, self.num_centers)?;

        let capacity = match (self.demands, self.capacities) {
            (Some(demands), Some(capacities)) => {
                validate_length("demands", &demands, n)?;
                validate_length("capacities", &capacities, n)?;
                validate_non_negative("capacities", &capacities)?;
                Some(CapacityData { demands, capacities })
            }
            (None, None) => None,
            (Some(_), None) => {
                return Err(PCenterError::malformed("Demands given without capacities"))
            }
            (None, Some(_)) => {
                return Err(PCenterError::malformed("Capacities given without demands"))
            }
        };

        if let Some(alpha) = self.alpha {
            validate_alpha("alpha", alpha)?;
        }

        let strata = self.strata.map(|t| build_strata(t, n)).transpose()?;

        Ok(Instance {
            name: self.name,
            num_centers: self.num_centers,
            distances: self.distances,
            capacity,
            alpha: self.alpha,
            strata,
        })
    }
}

fn build_strata(tables: StrataTables, n: usize) -> Result<StrataData> {
    let s = tables.num_strata;
    if s == 0 {
        return Err(PCenterError::malformed("Stratified instance needs at least one stratum"));
    }
    let membership = flatten_table("strata.membership", &tables.membership, n, s)?;
    let eligibility = flatten_table("strata.eligibility", &tables.eligibility, n, s)?;
    let demands = flatten_table("strata.demands", &tables.demands, n, s)?;
    let capacities = flatten_table("strata.capacities", &tables.capacities, n, s)?;
    validate_non_negative("strata.capacities", &capacities)?;
    validate_length("strata.alpha", &tables.alpha, s)?;
    validate_non_negative("strata.alpha", &tables.alpha)?;

    Ok(StrataData {
        num_strata: s,
        membership,
        eligibility,
        demands,
        capacities,
        alpha: tables.alpha,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> DistanceMatrix {
        let edges: Vec<_> = (1..n).map(|i| (i - 1, i, 1.0)).collect();
        DistanceMatrix::from_edges(n, &edges).unwrap()
    }

    #[test]
    fn test_build_given_plain_instance_should_have_no_optional_data() {
        let instance = Instance::builder("line", line(3), 1).build().unwrap();
        assert_eq!(instance.num_nodes(), 3);
        assert_eq!(instance.distance(0, 2), 2.0);
        assert!(instance.capacity_data().is_err());
        assert!(instance.alpha().is_err());
        assert!(instance.strata().is_err());
    }

    #[test]
    fn test_build_given_too_many_centers_should_return_error() {
        let result = Instance::builder("line", line(3), 4).build();
        assert!(matches!(result, Err(PCenterError::MalformedInstance(_))));
    }

    #[test]
    fn test_build_given_demands_without_capacities_should_return_error() {
        let result = Instance::builder("line", line(3), 1)
            .demands(vec![1, 1, 1])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_given_short_capacities_should_return_error() {
        let result = Instance::builder("line", line(3), 1)
            .demands(vec![1, 1, 1])
            .capacities(vec![1.0, 1.0])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_given_negative_alpha_should_return_error() {
        let result = Instance::builder("line", line(3), 1).alpha(-0.1).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_given_strata_should_index_by_node_then_stratum() {
        let tables = StrataTables {
            num_strata: 2,
            membership: vec![vec![true, false], vec![false, true], vec![true, true]],
            eligibility: vec![vec![true, true], vec![false, true], vec![true, false]],
            demands: vec![vec![1, 0], vec![0, 2], vec![3, 4]],
            capacities: vec![vec![5.0, 6.0], vec![0.0, 7.0], vec![8.0, 0.0]],
            alpha: vec![0.5, 0.0],
        };
        let instance = Instance::builder("strata", line(3), 2)
            .strata(tables)
            .build()
            .unwrap();
        let strata = instance.strata().unwrap();
        assert_eq!(strata.num_strata(), 2);
        assert!(strata.is_member(2, 1));
        assert!(!strata.is_member(1, 0));
        assert!(!strata.is_eligible(2, 1));
        assert_eq!(strata.demand(2, 1), 4);
        assert_eq!(strata.capacity(1, 1), 7.0);
        assert_eq!(strata.alpha(0), 0.5);
    }

    #[test]
    fn test_build_given_wrong_alpha_count_should_return_error() {
        let tables = StrataTables {
            num_strata: 1,
            membership: vec![vec![true]; 2],
            eligibility: vec![vec![true]; 2],
            demands: vec![vec![1]; 2],
            capacities: vec![vec![1.0]; 2],
            alpha: vec![],
        };
        let result = Instance::builder("strata", line(2), 1).strata(tables).build();
        assert!(result.is_err());
    }
}
