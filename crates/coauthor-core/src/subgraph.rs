//! Bounded subgraph extraction around the selected top authors.
//!
//! # Policies
//!
//! - **Policy A** ([`neighborhood`]): every edge with at least one selected
//!   endpoint. This is the reusable "top authors and their immediate
//!   co-authors" export.
//! - **Policy B** ([`bounded_fan_out`]): edges with *both* endpoints
//!   selected, then each selected author keeps only its `m` heaviest
//!   incident edges. The per-author lists are unioned and deduplicated.
//!
//! Policy B is deliberately asymmetric: an edge survives if it is in either
//! endpoint's top-`m` list, so the result can hold more than `m` edges at a
//! popular author. The candidate count before deduplication is bounded by
//! `K·m`.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::unionfind::UnionFind;
use serde::Serialize;
use tracing::debug;

use crate::model::{Edge, EdgeSet};

/// Nodes and weighted edges handed to the partitioner and renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subgraph {
    /// Endpoints of the retained edges; isolated authors are not included.
    pub nodes: BTreeSet<String>,
    pub edges: EdgeSet,
    /// Per-author picks before deduplication (Policy B), or the retained
    /// edge count (Policy A).
    pub candidate_edges: usize,
}

impl Subgraph {
    fn from_edges(edges: EdgeSet, candidate_edges: usize) -> Self {
        let nodes = edges.nodes().into_iter().map(str::to_string).collect();
        Self {
            nodes,
            edges,
            candidate_edges,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of connected components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        let index: HashMap<&str, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();
        let mut components = UnionFind::<usize>::new(self.nodes.len());
        for (edge, _) in self.edges.iter() {
            if let (Some(&a), Some(&b)) = (index.get(edge.source()), index.get(edge.target())) {
                components.union(a, b);
            }
        }
        components.into_labeling().into_iter().collect::<HashSet<_>>().len()
    }
}

/// Summary counters for logs and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubgraphSummary {
    pub nodes: usize,
    pub edges: usize,
    pub candidate_edges: usize,
    pub components: usize,
}

impl From<&Subgraph> for SubgraphSummary {
    fn from(sg: &Subgraph) -> Self {
        Self {
            nodes: sg.node_count(),
            edges: sg.edge_count(),
            candidate_edges: sg.candidate_edges,
            components: sg.component_count(),
        }
    }
}

/// True when at least one endpoint is selected (Policy A membership).
#[must_use]
pub fn touches_selection(selected: &HashSet<String>, a: &str, b: &str) -> bool {
    selected.contains(a) || selected.contains(b)
}

/// Policy A: keep every edge with at least one endpoint in `selected`.
#[must_use]
pub fn neighborhood(edges: &EdgeSet, selected: &HashSet<String>) -> Subgraph {
    let kept = edges.filtered(|e, _| touches_selection(selected, e.source(), e.target()));
    let count = kept.len();
    Subgraph::from_edges(kept, count)
}

/// Policy B: both endpoints selected, then each selected author's `m`
/// heaviest incident edges, unioned and deduplicated.
///
/// Authors are visited in `selected` order. Within one author, edges are
/// ranked by weight descending with ties in canonical edge order, so the
/// result is reproducible.
#[must_use]
pub fn bounded_fan_out<S: AsRef<str>>(edges: &EdgeSet, selected: &[S], m: usize) -> Subgraph {
    let order: Vec<&str> = selected.iter().map(|s| s.as_ref()).collect();
    let selected_set: HashSet<&str> = order.iter().copied().collect();

    let mut incident: HashMap<&str, Vec<(&Edge, u32)>> = HashMap::new();
    for (edge, weight) in edges.iter() {
        if selected_set.contains(edge.source()) && selected_set.contains(edge.target()) {
            incident.entry(edge.source()).or_default().push((edge, weight));
            incident.entry(edge.target()).or_default().push((edge, weight));
        }
    }

    let mut kept = EdgeSet::new(edges.is_weighted());
    let mut candidates = 0usize;
    let mut visited: HashSet<&str> = HashSet::new();

    for author in order {
        if !visited.insert(author) {
            continue;
        }
        let Some(list) = incident.get_mut(author) else {
            continue;
        };
        // Incident lists are built in canonical order; a stable sort keeps
        // it as the tie-break.
        list.sort_by(|a, b| b.1.cmp(&a.1));
        for (edge, weight) in list.iter().take(m) {
            candidates += 1;
            if !kept.contains(edge) {
                kept.add((*edge).clone(), *weight);
            }
        }
    }

    debug!(
        selected = selected_set.len(),
        fan_out = m,
        candidates,
        edges = kept.len(),
        "bounded fan-out subgraph extracted"
    );
    Subgraph::from_edges(kept, candidates)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
