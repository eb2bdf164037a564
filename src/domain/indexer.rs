use crate::domain::instance::StrataData;

/// Dense index of an admissible `(stratum, center, client)` triple.
///
/// Only `VariableIndexer` hands these out, so holding one proves the triple
/// was admissible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TripleIndex(usize);

impl TripleIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

/// Sparse mapping from `(stratum, center, client)` to a dense variable index.
///
/// A triple is admissible when the client belongs to the stratum and the
/// center is eligible in it. Admissible triples are numbered `0..count`
/// stratum-major, then by center, then by client. Every other triple maps
/// to `None`.
#[derive(Debug, Clone)]
pub struct VariableIndexer {
    num_strata: usize,
    num_nodes: usize,
    slots: Vec<Option<TripleIndex>>,
    count: usize,
}

impl VariableIndexer {
    pub fn new(strata: &StrataData, num_nodes: usize) -> Self {
        let num_strata = strata.num_strata();
        let mut slots = Vec::with_capacity(num_strata * num_nodes * num_nodes);
        let mut count = 0;

        for s in 0..num_strata {
            for center in 0..num_nodes {
                let eligible = strata.is_eligible(center, s);
                for client in 0..num_nodes {
                    if eligible && strata.is_member(client, s) {
                        slots.push(Some(TripleIndex(count)));
                        count += 1;
                    } else {
                        slots.push(None);
                    }
                }
            }
        }

        VariableIndexer {
            num_strata,
            num_nodes,
            slots,
            count,
        }
    }

    /// Number of admissible triples
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn num_strata(&self) -> usize {
        self.num_strata
    }

    /// Index of `(stratum, center, client)`, or `None` when it is not admissible
    pub fn index(&self, stratum: usize, center: usize, client: usize) -> Option<TripleIndex> {
        if stratum >= self.num_strata || center >= self.num_nodes || client >= self.num_nodes {
            return None;
        }
        self.slots[(stratum * self.num_nodes + center) * self.num_nodes + client]
    }

    /// Admissible `(center, index)` pairs for a client within a stratum, in center order
    pub fn centers_for(&self, stratum: usize, client: usize) -> impl Iterator<Item = (usize, TripleIndex)> + '_ {
        (0..self.num_nodes)
            .filter_map(move |center| self.index(stratum, center, client).map(|idx| (center, idx)))
    }

    /// Admissible `(client, index)` pairs served by a center within a stratum, in client order
    pub fn clients_for(&self, stratum: usize, center: usize) -> impl Iterator<Item = (usize, TripleIndex)> + '_ {
        (0..self.num_nodes)
            .filter_map(move |client| self.index(stratum, center, client).map(|idx| (client, idx)))
    }

    /// All admissible triples with their index, in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize, TripleIndex)> + '_ {
        let n = self.num_nodes;
        self.slots.iter().enumerate().filter_map(move |(slot, idx)| {
            idx.map(|idx| (slot / (n * n), (slot / n) % n, slot % n, idx))
        })
    }
}
