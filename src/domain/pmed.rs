//! Reader for OR-Library `pmed` instance files.
//!
//! The first line holds `n m p`: node count, edge count and number of
//! centers. It is followed by `m` lines `u v w` with 1-indexed endpoints.
//! When an edge appears twice the later weight wins.

use std::collections::BTreeMap;

use crate::domain::metric::{DistanceMatrix, Edge};
use crate::error::{PCenterError, Result};

/// A parsed `pmed` file
#[derive(Debug, Clone, PartialEq)]
pub struct PmedGraph {
    pub num_nodes: usize,
    pub num_centers: usize,
    /// 0-indexed, deduplicated edges
    pub edges: Vec<Edge>,
}

impl PmedGraph {
    pub fn distances(&self) -> Result<DistanceMatrix> {
        DistanceMatrix::from_edges(self.num_nodes, &self.edges)
    }
}

pub fn parse_pmed(text: &str) -> Result<PmedGraph> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty());

    let (_, header) = lines
        .next()
        .ok_or_else(|| PCenterError::malformed("pmed: empty input"))?;
    let header: Vec<usize> = parse_fields(header, 1)?;
    let [num_nodes, num_edges, num_centers] = header[..] else {
        return Err(PCenterError::malformed(format!(
            "pmed line 1: expected 'n m p', found {} fields",
            header.len()
        )));
    };

    // keyed by (min, max) endpoint so a later duplicate replaces the earlier weight
    let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for _ in 0..num_edges {
        let (idx, line) = lines.next().ok_or_else(|| {
            PCenterError::malformed(format!(
                "pmed: header announces {} edges but the input ends early",
                num_edges
            ))
        })?;
        let line_no = idx + 1;
        let fields: Vec<f64> = parse_fields(line, line_no)?;
        let [u, v, w] = fields[..] else {
            return Err(PCenterError::malformed(format!(
                "pmed line {}: expected 'u v w', found {} fields",
                line_no,
                fields.len()
            )));
        };
        let u = node_index(u, num_nodes, line_no)?;
        let v = node_index(v, num_nodes, line_no)?;
        weights.insert((u.min(v), u.max(v)), w);
    }

    log::debug!(
        "pmed: {} nodes, {} edge lines, {} distinct edges, p = {}",
        num_nodes,
        num_edges,
        weights.len(),
        num_centers
    );

    Ok(PmedGraph {
        num_nodes,
        num_centers,
        edges: weights.into_iter().map(|((u, v), w)| (u, v, w)).collect(),
    })
}

fn parse_fields<T: std::str::FromStr>(line: &str, line_no: usize) -> Result<Vec<T>> {
    line.split_whitespace()
        .map(|field| {
            field.parse::<T>().map_err(|_| {
                PCenterError::malformed(format!("pmed line {}: invalid number '{}'", line_no, field))
            })
        })
        .collect()
}

/// 1-indexed file endpoint to 0-indexed node
fn node_index(value: f64, num_nodes: usize, line_no: usize) -> Result<usize> {
    if value.fract() != 0.0 || value < 1.0 || value > num_nodes as f64 {
        return Err(PCenterError::malformed(format!(
            "pmed line {}: node {} outside 1..={}",
            line_no, value, num_nodes
        )));
    }
    Ok(value as usize - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "4 6 2\n1 2 2\n1 3 5\n1 4 9\n2 3 3\n2 4 7\n3 4 4\n";

    #[test]
    fn test_parse_pmed_should_read_header_and_shift_indices() {
        let graph = parse_pmed(SMALL).unwrap();
        assert_eq!(graph.num_nodes, 4);
        assert_eq!(graph.num_centers, 2);
        assert_eq!(graph.edges.len(), 6);
        assert_eq!(graph.edges[0], (0, 1, 2.0));
        assert_eq!(graph.edges[5], (2, 3, 4.0));

        let d = graph.distances().unwrap();
        assert_eq!(d.get(0, 3), 9.0);
        assert_eq!(d.get(3, 0), 9.0);
    }

    #[test]
    fn test_parse_pmed_given_duplicate_edge_should_keep_later_weight() {
        let graph = parse_pmed("3 3 1\n1 2 10\n2 3 1\n2 1 4\n").unwrap();
        assert_eq!(graph.edges, vec![(0, 1, 4.0), (1, 2, 1.0)]);
    }

    #[test]
    fn test_parse_pmed_should_tolerate_blank_lines_and_ignore_trailing_content() {
        let graph = parse_pmed("\n  2 1 1  \n\n 1 2 3 \n garbage").unwrap();
        assert_eq!(graph.edges, vec![(0, 1, 3.0)]);
    }

    #[test]
    fn test_parse_pmed_given_bad_input_should_return_malformed() {
        let cases = [
            "",
            "4 6\n",
            "3 2 1\n1 2 1\n",
            "3 1 1\n1 4 1\n",
            "3 1 1\n0 2 1\n",
            "3 1 1\n1 x 1\n",
            "3 1 1\n1 2\n",
        ];
        for text in cases {
            assert!(
                matches!(parse_pmed(text), Err(PCenterError::MalformedInstance(_))),
                "accepted {:?}",
                text
            );
        }
    }
}
