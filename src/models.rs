use serde::{Deserialize, Serialize};

use crate::domain::solution::Solution;
use crate::domain::variant::Variant;

// ---------- API (wire) types: owned & serde-friendly ----------

/// Where the distances of an instance come from
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InstanceSource {
    /// Undirected weighted edges `[u, v, w]`, 0-indexed
    Edges {
        num_nodes: usize,
        edges: Vec<(usize, usize, f64)>,
    },
    /// Body of an OR-Library `pmed` file
    Pmed { text: String },
    /// Planar points; distances are Euclidean
    Coordinates { points: Vec<[f64; 2]> },
    /// Dense symmetric distance matrix
    Matrix { distances: Vec<Vec<f64>> },
}

/// Per-stratum tables, indexed `[node][stratum]`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ApiStrata {
    pub num_strata: usize,
    pub membership: Vec<Vec<bool>>,
    pub eligibility: Vec<Vec<bool>>,
    pub demands: Vec<Vec<u64>>,
    pub capacities: Vec<Vec<f64>>,
    pub alpha: Vec<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ApiInstance {
    #[serde(default = "default_instance_name")]
    pub name: String,
    /// Required unless the source is `pmed`, whose header carries `p`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_centers: Option<usize>,
    pub source: InstanceSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demands: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacities: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strata: Option<ApiStrata>,
}

fn default_instance_name() -> String {
    "instance".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SolveRequest {
    pub instance: ApiInstance,
    pub variant: String,
    /// Backend name, `glpk` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_secs: Option<u64>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SolveResponse {
    pub solver: String,
    pub variant: Variant,
    /// Wall-clock limit the backend enforced, `None` when it runs unbounded
    pub time_limit_secs: Option<u64>,
    pub solution: Solution,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
