//! Rendering hand-off: the bounded subgraph with visual attributes.
//!
//! The renderer (a force-directed layout engine) is external; this module
//! only decides what it is given:
//!
//! - node size from the dense degree rank among the selected authors,
//!   `10 + (max_rank + 1 − rank) · 0.6`, so the best-connected author is
//!   largest;
//! - node color from its community;
//! - edge width `1 + min(weight, 4)`;
//! - tooltips naming co-author and shared-paper counts.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::Serialize;

use crate::community::{FALLBACK_COLOR, community_color, membership, modularity};
use crate::error::PipelineError;
use crate::select::{RankedAuthor, dense_ranks};
use crate::subgraph::Subgraph;

const BASE_NODE_SIZE: f64 = 10.0;
const SIZE_PER_RANK: f64 = 0.6;
const MAX_EXTRA_WIDTH: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewNode {
    pub id: String,
    pub label: String,
    pub degree: usize,
    pub community: Option<usize>,
    pub color: String,
    pub size: f64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewEdge {
    pub source: String,
    pub target: String,
    pub weight: u32,
    pub width: u32,
    pub title: String,
}

/// Everything the renderer needs to draw the collaboration network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkView {
    pub nodes: Vec<ViewNode>,
    pub edges: Vec<ViewEdge>,
    pub communities: usize,
    pub modularity: f64,
}

impl NetworkView {
    /// Attach visual attributes to `subgraph`.
    ///
    /// `selected` supplies degrees and ranks; a subgraph node outside the
    /// selection gets degree 0 and the smallest size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(
        subgraph: &Subgraph,
        selected: &[RankedAuthor],
        communities: &[BTreeSet<String>],
        palette: &[String],
    ) -> Self {
        let ranks = dense_ranks(selected);
        let max_rank = ranks.iter().copied().max().unwrap_or(0);
        let ranked: HashMap<&str, (usize, usize)> = selected
            .iter()
            .zip(&ranks)
            .map(|(r, rank)| (r.author.as_str(), (r.degree, *rank)))
            .collect();
        let community_of = membership(communities);

        let nodes = subgraph
            .nodes
            .iter()
            .map(|name| {
                let (degree, rank) = ranked
                    .get(name.as_str())
                    .copied()
                    .unwrap_or((0, max_rank + 1));
                let community = community_of.get(name.as_str()).copied();
                let color = community
                    .map_or(FALLBACK_COLOR, |c| community_color(palette, c))
                    .to_string();
                ViewNode {
                    id: name.clone(),
                    label: name.clone(),
                    degree,
                    community,
                    color,
                    size: BASE_NODE_SIZE + (max_rank + 1 - rank) as f64 * SIZE_PER_RANK,
                    title: format!("{name}<br>Co-authors: {degree}"),
                }
            })
            .collect();

        let edges = subgraph
            .edges
            .iter()
            .map(|(edge, weight)| ViewEdge {
                source: edge.source().to_string(),
                target: edge.target().to_string(),
                weight,
                width: 1 + weight.min(MAX_EXTRA_WIDTH),
                title: format!("{weight} shared paper(s)"),
            })
            .collect();

        Self {
            nodes,
            edges,
            communities: communities.len(),
            modularity: modularity(communities, &subgraph.edges),
        }
    }

    /// Write the view as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// File creation or serialization failure.
    pub fn write_json(&self, path: &Path) -> Result<(), PipelineError> {
        let file = std::fs::File::create(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self).map_err(|source| {
            PipelineError::Json {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}
