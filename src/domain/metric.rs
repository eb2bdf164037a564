use std::collections::HashSet;

use crate::error::{PCenterError, Result};

/// An undirected weighted edge `(u, v, weight)`
pub type Edge = (usize, usize, f64);

/// Dense, symmetric node-to-node distance matrix.
///
/// Entries are `+inf` for unreachable pairs. There are no mutable accessors:
/// once built, a matrix is shared read-only by every downstream stage.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Build the metric closure of a sparse undirected graph.
    ///
    /// Edges are validated first: endpoints must be in range, self-loops and
    /// duplicate edges are rejected, and weights must be finite and non-negative.
    pub fn from_edges(n: usize, edges: &[Edge]) -> Result<Self> {
        validate_edges(n, edges)?;

        let mut data = filled(n, f64::INFINITY)?;
        for i in 0..n {
            data[i * n + i] = 0.0;
        }
        for &(u, v, w) in edges {
            data[u * n + v] = w;
            data[v * n + u] = w;
        }

        let mut matrix = DistanceMatrix { n, data };
        matrix.relax_all_pairs();
        Ok(matrix)
    }

    /// Build the metric closure of a dense matrix.
    ///
    /// The input must be square, symmetric, with a zero diagonal and
    /// non-negative entries (`+inf` allowed for "no direct link").
    pub fn from_dense(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n) {
            return Err(PCenterError::malformed(format!(
                "Distance row {} has {} entries, expected {}",
                i,
                row.len(),
                n
            )));
        }
        let mut data = filled(n, 0.0)?;
        for (i, row) in rows.iter().enumerate() {
            data[i * n..(i + 1) * n].copy_from_slice(row);
        }

        for i in 0..n {
            for j in 0..n {
                let d = data[i * n + j];
                if d.is_nan() || d < 0.0 {
                    return Err(PCenterError::malformed(format!(
                        "Distance ({}, {}) must be non-negative, got {}",
                        i, j, d
                    )));
                }
                if i == j && d != 0.0 {
                    return Err(PCenterError::malformed(format!(
                        "Distance ({}, {}) on the diagonal must be zero",
                        i, j
                    )));
                }
                if d != data[j * n + i] {
                    return Err(PCenterError::malformed(format!(
                        "Distance matrix is not symmetric at ({}, {})",
                        i, j
                    )));
                }
            }
        }

        let mut matrix = DistanceMatrix { n, data };
        matrix.relax_all_pairs();
        Ok(matrix)
    }

    /// Euclidean distances between planar points. Already a metric, so no
    /// relaxation pass is needed.
    pub fn from_points(points: &[[f64; 2]]) -> Result<Self> {
        if let Some(i) = points
            .iter()
            .position(|p| !p[0].is_finite() || !p[1].is_finite())
        {
            return Err(PCenterError::malformed(format!(
                "Point {} has a non-finite coordinate",
                i
            )));
        }

        let n = points.len();
        let mut data = filled(n, 0.0)?;
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = points[i][0] - points[j][0];
                let dy = points[i][1] - points[j][1];
                let d = (dx * dx + dy * dy).sqrt();
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }
        Ok(DistanceMatrix { n, data })
    }

    /// Return a re-closed copy. On a matrix that is already a metric closure
    /// this is the identity.
    pub fn closed(&self) -> Self {
        let mut copy = self.clone();
        copy.relax_all_pairs();
        copy
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Floyd-Warshall relaxation over every intermediate node `k`
    fn relax_all_pairs(&mut self) {
        let n = self.n;
        for k in 0..n {
            for i in 0..n {
                let d_ik = self.data[i * n + k];
                if d_ik.is_infinite() {
                    continue;
                }
                for j in 0..n {
                    let through_k = d_ik + self.data[k * n + j];
                    if through_k < self.data[i * n + j] {
                        self.data[i * n + j] = through_k;
                    }
                }
            }
        }
    }
}

/// Storage for an `n x n` matrix, or an error when it cannot be addressed
/// or allocated.
fn filled(n: usize, value: f64) -> Result<Vec<f64>> {
    let cells = n.checked_mul(n).ok_or_else(|| {
        PCenterError::malformed(format!("{} nodes overflow the distance matrix size", n))
    })?;
    let mut data = Vec::new();
    data.try_reserve_exact(cells).map_err(|_| {
        PCenterError::malformed(format!("cannot allocate a {} x {} distance matrix", n, n))
    })?;
    data.resize(cells, value);
    Ok(data)
}

fn validate_edges(n: usize, edges: &[Edge]) -> Result<()> {
    let mut seen: HashSet<(usize, usize)> = HashSet::with_capacity(edges.len());
    for (idx, &(u, v, w)) in edges.iter().enumerate() {
        if u >= n || v >= n {
            return Err(PCenterError::malformed(format!(
                "Edge {} ({}, {}) references a node outside 0..{}",
                idx, u, v, n
            )));
        }
        if u == v {
            return Err(PCenterError::malformed(format!(
                "Edge {} is a self-loop on node {}",
                idx, u
            )));
        }
        if !w.is_finite() || w < 0.0 {
            return Err(PCenterError::malformed(format!(
                "Edge {} ({}, {}) has invalid weight {}",
                idx, u, v, w
            )));
        }
        if !seen.insert((u.min(v), u.max(v))) {
            return Err(PCenterError::malformed(format!(
                "Duplicate edge ({}, {})",
                u, v
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_node_edges() -> Vec<Edge> {
        vec![
            (0, 1, 2.0),
            (0, 2, 5.0),
            (0, 3, 9.0),
            (1, 2, 3.0),
            (1, 3, 7.0),
            (2, 3, 4.0),
        ]
    }

    fn assert_metric(d: &DistanceMatrix) {
        let n = d.len();
        for i in 0..n {
            assert_eq!(d.get(i, i), 0.0);
            for j in 0..n {
                assert_eq!(d.get(i, j), d.get(j, i));
                for k in 0..n {
                    assert!(d.get(i, j) <= d.get(i, k) + d.get(k, j));
                }
            }
        }
    }

    #[test]
    fn test_from_edges_given_complete_graph_should_keep_shortest_paths() {
        let d = DistanceMatrix::from_edges(4, &four_node_edges()).unwrap();
        // 0-1-3 costs 9 as does the direct edge
        assert_eq!(d.get(0, 3), 9.0);
        assert_eq!(d.get(0, 2), 5.0);
        assert_eq!(d.get(1, 3), 7.0);
        assert_metric(&d);
    }

    #[test]
    fn test_from_edges_given_shortcut_should_replace_direct_edge() {
        let edges = vec![(0, 1, 1.0), (1, 2, 1.0), (0, 2, 10.0)];
        let d = DistanceMatrix::from_edges(3, &edges).unwrap();
        assert_eq!(d.get(0, 2), 2.0);
        assert_eq!(d.get(2, 0), 2.0);
    }

    #[test]
    fn test_from_edges_given_disconnected_graph_should_leave_infinity() {
        let d = DistanceMatrix::from_edges(4, &[(0, 1, 3.0), (2, 3, 1.0)]).unwrap();
        assert!(d.get(0, 2).is_infinite());
        assert!(d.get(3, 1).is_infinite());
        assert_eq!(d.get(0, 1), 3.0);
        assert_metric(&d);
    }

    #[test]
    fn test_closed_given_closed_matrix_should_be_fixed_point() {
        let d = DistanceMatrix::from_edges(4, &[(0, 1, 2.0), (1, 2, 2.5), (2, 3, 1.0)]).unwrap();
        assert_eq!(d.closed(), d);
        assert_eq!(d.closed().closed(), d);
    }

    #[test]
    fn test_from_dense_given_non_metric_should_close_it() {
        let inf = f64::INFINITY;
        let rows = vec![
            vec![0.0, 1.0, inf],
            vec![1.0, 0.0, 4.0],
            vec![inf, 4.0, 0.0],
        ];
        let d = DistanceMatrix::from_dense(&rows).unwrap();
        assert_eq!(d.get(0, 2), 5.0);
        assert_metric(&d);
    }

    #[test]
    fn test_from_dense_given_asymmetric_matrix_should_return_error() {
        let rows = vec![vec![0.0, 1.0], vec![2.0, 0.0]];
        assert!(DistanceMatrix::from_dense(&rows).is_err());
    }

    #[test]
    fn test_from_dense_given_ragged_rows_should_return_error() {
        let rows = vec![vec![0.0, 1.0], vec![1.0]];
        assert!(DistanceMatrix::from_dense(&rows).is_err());
    }

    #[test]
    fn test_from_edges_given_invalid_edges_should_return_error() {
        assert!(DistanceMatrix::from_edges(2, &[(0, 2, 1.0)]).is_err());
        assert!(DistanceMatrix::from_edges(2, &[(1, 1, 1.0)]).is_err());
        assert!(DistanceMatrix::from_edges(2, &[(0, 1, -1.0)]).is_err());
        assert!(DistanceMatrix::from_edges(2, &[(0, 1, f64::NAN)]).is_err());
        assert!(DistanceMatrix::from_edges(2, &[(0, 1, 1.0), (1, 0, 2.0)]).is_err());
    }

    #[test]
    fn test_from_points_should_produce_euclidean_metric() {
        let d = DistanceMatrix::from_points(&[[0.0, 0.0], [3.0, 4.0], [6.0, 8.0]]).unwrap();
        assert_eq!(d.get(0, 1), 5.0);
        assert_eq!(d.get(0, 2), 10.0);
        assert_metric(&d);
    }

    #[test]
    fn test_from_edges_given_unaddressable_node_count_should_return_error() {
        let err = DistanceMatrix::from_edges(1 << 32, &[]).unwrap_err();
        assert!(matches!(err, PCenterError::MalformedInstance(_)));

        let ragged_and_huge = vec![Vec::new(); 1 << 20];
        assert!(DistanceMatrix::from_dense(&ragged_and_huge).is_err());
    }
}
