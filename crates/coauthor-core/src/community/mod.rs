//! Community partitioning and palette coloring for the bounded subgraph.
//!
//! # Overview
//!
//! A [`Partitioner`] splits the subgraph's nodes into disjoint communities.
//! The production variant is [`GreedyModularity`]; [`SingleCommunity`] and
//! [`Singletons`] are trivial variants that keep the rest of the pipeline
//! testable without depending on the heuristic's output.
//!
//! Every partitioner returns a disjoint cover of `nodes ∪ endpoints(edges)`
//! with communities sorted by size descending, then by smallest member.
//! Community `i` is colored `palette[i mod P]`.

pub mod greedy;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::model::EdgeSet;

pub use greedy::GreedyModularity;

/// Default community palette (9 colors, reused cyclically).
pub const DEFAULT_PALETTE: [&str; 9] = [
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33", "#a65628", "#f781bf",
    "#999999",
];

/// Color for a node that is not in any community.
pub const FALLBACK_COLOR: &str = "#bbbbbb";

/// Splits a weighted graph into disjoint communities.
pub trait Partitioner {
    fn partition(&self, nodes: &BTreeSet<String>, edges: &EdgeSet) -> Vec<BTreeSet<String>>;
}

/// Every node in one community.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleCommunity;

impl Partitioner for SingleCommunity {
    fn partition(&self, nodes: &BTreeSet<String>, edges: &EdgeSet) -> Vec<BTreeSet<String>> {
        let all = universe(nodes, edges);
        if all.is_empty() { Vec::new() } else { vec![all] }
    }
}

/// Every node in its own community.
#[derive(Debug, Clone, Copy, Default)]
pub struct Singletons;

impl Partitioner for Singletons {
    fn partition(&self, nodes: &BTreeSet<String>, edges: &EdgeSet) -> Vec<BTreeSet<String>> {
        universe(nodes, edges)
            .into_iter()
            .map(|n| BTreeSet::from([n]))
            .collect()
    }
}

/// `nodes` plus every edge endpoint.
pub(crate) fn universe(nodes: &BTreeSet<String>, edges: &EdgeSet) -> BTreeSet<String> {
    let mut all = nodes.clone();
    for endpoint in edges.nodes() {
        if !all.contains(endpoint) {
            all.insert(endpoint.to_string());
        }
    }
    all
}

/// Sort communities by size descending, then by smallest member ascending.
pub(crate) fn sort_communities(communities: &mut [BTreeSet<String>]) {
    communities.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| a.iter().next().cmp(&b.iter().next()))
    });
}

/// Map each node to its community index.
#[must_use]
pub fn membership(communities: &[BTreeSet<String>]) -> HashMap<&str, usize> {
    communities
        .iter()
        .enumerate()
        .flat_map(|(i, c)| c.iter().map(move |n| (n.as_str(), i)))
        .collect()
}

/// Color for community `index`, cycling through `palette`.
#[must_use]
pub fn community_color<'a>(palette: &'a [String], index: usize) -> &'a str {
    if palette.is_empty() {
        FALLBACK_COLOR
    } else {
        &palette[index % palette.len()]
    }
}

/// [`DEFAULT_PALETTE`] as owned strings.
#[must_use]
pub fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|c| (*c).to_string()).collect()
}

/// Weighted modularity of `communities` over `edges`.
///
/// `Q = Σ_c [ W_c / m − (D_c / 2m)² ]` where `W_c` is the edge weight inside
/// `c`, `D_c` the summed weighted degree of its members and `m` the total
/// edge weight. Zero for an edgeless graph.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn modularity(communities: &[BTreeSet<String>], edges: &EdgeSet) -> f64 {
    let m: f64 = edges.iter().map(|(_, w)| f64::from(w)).sum();
    if m <= 0.0 {
        return 0.0;
    }
    let of = membership(communities);
    let mut inside: BTreeMap<usize, f64> = BTreeMap::new();
    let mut degree: BTreeMap<usize, f64> = BTreeMap::new();
    for (edge, w) in edges.iter() {
        let w = f64::from(w);
        let (cs, ct) = (of.get(edge.source()), of.get(edge.target()));
        if let Some(&c) = cs {
            *degree.entry(c).or_insert(0.0) += w;
        }
        if let Some(&c) = ct {
            *degree.entry(c).or_insert(0.0) += w;
        }
        if let (Some(a), Some(b)) = (cs, ct) {
            if a == b {
                *inside.entry(*a).or_insert(0.0) += w;
            }
        }
    }
    degree
        .iter()
        .map(|(c, d)| {
            let w = inside.get(c).copied().unwrap_or(0.0);
            w / m - (d / (2.0 * m)).powi(2)
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
