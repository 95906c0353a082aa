//! Greedy modularity agglomeration (Clauset–Newman–Moore).
//!
//! # Algorithm
//!
//! Start with one community per node. Keep, for every pair of adjacent
//! communities `(i, j)`, the modularity gain `ΔQ_ij` of merging them:
//!
//! ```text
//! initial:  ΔQ_ij = 2 · (w_ij / 2m − a_i · a_j),   a_i = k_i / 2m
//! merge j into i, for every neighbor k of either:
//!   k adjacent to both:  ΔQ_ik ← ΔQ_ik + ΔQ_jk
//!   k adjacent to i:     ΔQ_ik ← ΔQ_ik − 2 · a_j · a_k
//!   k adjacent to j:     ΔQ_ik ← ΔQ_jk − 2 · a_i · a_k
//!   a_i ← a_i + a_j
//! ```
//!
//! Repeatedly apply the best merge while its gain is positive. Merging
//! non-adjacent communities never increases modularity, so only adjacent
//! pairs are candidates.
//!
//! # Tie-break
//!
//! Nodes are indexed by ascending name and a merged community keeps the
//! lower index. Candidates are scanned in ascending `(i, j)` order and only
//! a strictly larger gain replaces the current best, so among equal gains
//! the lowest `(i, j)` pair merges first. Gains within [`MIN_GAIN`] of zero
//! count as no improvement.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use tracing::debug;

use super::{Partitioner, sort_communities, universe};
use crate::model::EdgeSet;

/// Gains at or below this are treated as "no improvement".
pub const MIN_GAIN: f64 = 1e-12;

/// Weighted greedy modularity maximization.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyModularity;

impl Partitioner for GreedyModularity {
    fn partition(&self, nodes: &BTreeSet<String>, edges: &EdgeSet) -> Vec<BTreeSet<String>> {
        let names: Vec<String> = universe(nodes, edges).into_iter().collect();
        if names.is_empty() {
            return Vec::new();
        }

        let graph = build_graph(&names, edges);
        let mut state = MergeState::new(&graph);
        let mut merges = 0usize;
        while let Some((i, j)) = state.best_merge() {
            state.merge(i, j);
            merges += 1;
        }

        let mut communities: Vec<BTreeSet<String>> = state
            .members
            .into_iter()
            .flatten()
            .map(|members| members.into_iter().map(|i| names[i].clone()).collect())
            .collect();
        sort_communities(&mut communities);

        debug!(
            nodes = names.len(),
            edges = edges.len(),
            merges,
            communities = communities.len(),
            "greedy modularity partition"
        );
        communities
    }
}

/// Undirected graph with node `i` holding `names[i]`'s index.
fn build_graph(names: &[String], edges: &EdgeSet) -> UnGraph<usize, f64> {
    let mut graph = UnGraph::with_capacity(names.len(), edges.len());
    for i in 0..names.len() {
        graph.add_node(i);
    }
    let index_of = |name: &str| {
        names
            .binary_search_by(|probe| probe.as_str().cmp(name))
            .ok()
            .map(NodeIndex::new)
    };
    for (edge, weight) in edges.iter() {
        if let (Some(a), Some(b)) = (index_of(edge.source()), index_of(edge.target())) {
            graph.add_edge(a, b, f64::from(weight));
        }
    }
    graph
}

struct MergeState {
    /// `gains[i][j]` = ΔQ of merging communities i and j (adjacent only).
    gains: Vec<BTreeMap<usize, f64>>,
    /// Fraction of edge endpoints in each community.
    share: Vec<f64>,
    /// Members of each live community; `None` once merged away.
    members: Vec<Option<Vec<usize>>>,
}

impl MergeState {
    fn new(graph: &UnGraph<usize, f64>) -> Self {
        let n = graph.node_count();
        let two_m: f64 = 2.0 * graph.edge_weights().sum::<f64>();
        let mut gains = vec![BTreeMap::new(); n];
        let mut share = vec![0.0; n];

        if two_m > 0.0 {
            for node in graph.node_indices() {
                let k: f64 = graph.edges(node).map(|e| *e.weight()).sum();
                share[node.index()] = k / two_m;
            }
            for edge in graph.edge_references() {
                let (i, j) = (edge.source().index(), edge.target().index());
                let gain = 2.0 * (edge.weight() / two_m - share[i] * share[j]);
                gains[i].insert(j, gain);
                gains[j].insert(i, gain);
            }
        }

        Self {
            gains,
            share,
            members: (0..n).map(|i| Some(vec![i])).collect(),
        }
    }

    /// Best positive-gain merge `(i, j)` with `i < j`, lowest pair on ties.
    fn best_merge(&self) -> Option<(usize, usize)> {
        let mut best: Option<(f64, usize, usize)> = None;
        for (i, row) in self.gains.iter().enumerate() {
            for (&j, &gain) in row.range(i + 1..) {
                if best.is_none_or(|(g, _, _)| gain > g) {
                    best = Some((gain, i, j));
                }
            }
        }
        best.filter(|(g, _, _)| *g > MIN_GAIN).map(|(_, i, j)| (i, j))
    }

    /// Merge community `j` into community `i` (`i < j`).
    fn merge(&mut self, i: usize, j: usize) {
        let row_i = std::mem::take(&mut self.gains[i]);
        let row_j = std::mem::take(&mut self.gains[j]);
        let (a_i, a_j) = (self.share[i], self.share[j]);

        let neighbors: BTreeSet<usize> = row_i
            .keys()
            .chain(row_j.keys())
            .copied()
            .filter(|&k| k != i && k != j)
            .collect();

        for k in neighbors {
            let a_k = self.share[k];
            let gain = match (row_i.get(&k), row_j.get(&k)) {
                (Some(ik), Some(jk)) => ik + jk,
                (Some(ik), None) => ik - 2.0 * a_j * a_k,
                (None, Some(jk)) => jk - 2.0 * a_i * a_k,
                (None, None) => continue,
            };
            self.gains[k].remove(&j);
            self.gains[k].insert(i, gain);
            self.gains[i].insert(k, gain);
        }

        self.share[i] += a_j;
        self.share[j] = 0.0;
        let moved = self.members[j].take().unwrap_or_default();
        if let Some(target) = self.members[i].as_mut() {
            target.extend(moved);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
