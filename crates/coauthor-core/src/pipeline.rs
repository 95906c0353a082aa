//! Batch stages over the artifacts in one output directory.
//!
//! ```text
//! edges:    papers CSV | Scopus JSON → author_edges.csv, author_nodes.csv
//! top:      author_edges.csv → author_degrees.csv, author_top_nodes.csv,
//!                              author_top_edges.csv (Policy A)
//! network:  author_degrees.csv + author_top_edges.csv
//!             → Policy B subgraph → communities → network.json
//! run:      edges, top, network in order
//! ```
//!
//! Each stage reads only what earlier stages wrote, so stages can be rerun
//! independently. The `top` stage streams the full edge table twice in
//! `chunk_size`-row batches and never holds it in memory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::aggregate::{AggregateStats, aggregate_chunked};
use crate::community::{GreedyModularity, Partitioner};
use crate::config::PipelineConfig;
use crate::degree::{DegreeAccumulator, DegreeStats};
use crate::model::{Edge, TrimNormalizer};
use crate::records::{PapersCsv, ScopusRecords};
use crate::select::{RankedAuthor, top_k};
use crate::subgraph::{SubgraphSummary, bounded_fan_out, touches_selection};
use crate::table::{
    EdgeTableReader, EdgeTableWriter, read_degrees, read_edge_set, write_degrees, write_edges,
    write_nodes,
};
use crate::view::NetworkView;

pub const EDGES_FILE: &str = "author_edges.csv";
pub const NODES_FILE: &str = "author_nodes.csv";
pub const DEGREES_FILE: &str = "author_degrees.csv";
pub const TOP_EDGES_FILE: &str = "author_top_edges.csv";
pub const TOP_NODES_FILE: &str = "author_top_nodes.csv";
pub const NETWORK_FILE: &str = "network.json";

/// Artifact paths under one output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    root: PathBuf,
}

impl Artifacts {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn edges(&self) -> PathBuf {
        self.root.join(EDGES_FILE)
    }

    #[must_use]
    pub fn nodes(&self) -> PathBuf {
        self.root.join(NODES_FILE)
    }

    #[must_use]
    pub fn degrees(&self) -> PathBuf {
        self.root.join(DEGREES_FILE)
    }

    #[must_use]
    pub fn top_edges(&self) -> PathBuf {
        self.root.join(TOP_EDGES_FILE)
    }

    #[must_use]
    pub fn top_nodes(&self) -> PathBuf {
        self.root.join(TOP_NODES_FILE)
    }

    #[must_use]
    pub fn network(&self) -> PathBuf {
        self.root.join(NETWORK_FILE)
    }

    fn ensure_root(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("create output directory {}", self.root.display()))
    }
}

/// Where the `edges` stage reads paper records from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    /// Table with a semicolon-joined `authors_str` column.
    PapersCsv(PathBuf),
    /// Directory tree of Scopus abstract-retrieval JSON files.
    Scopus(PathBuf),
}

impl RecordSource {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PapersCsv(path) | Self::Scopus(path) => path,
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgesReport {
    pub source: PathBuf,
    pub records: AggregateStats,
    pub edges: usize,
    pub nodes: usize,
    pub weighted: bool,
    pub content_hash: String,
    pub edges_path: PathBuf,
    pub nodes_path: PathBuf,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopReport {
    pub degree: DegreeStats,
    pub authors: usize,
    pub top: Vec<RankedAuthor>,
    pub top_edges: usize,
    pub degrees_path: PathBuf,
    pub top_nodes_path: PathBuf,
    pub top_edges_path: PathBuf,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkReport {
    pub selected: usize,
    pub fan_out: usize,
    pub malformed_rows: usize,
    pub subgraph: SubgraphSummary,
    pub communities: usize,
    pub modularity: f64,
    pub network_path: PathBuf,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub edges: EdgesReport,
    pub top: TopReport,
    pub network: NetworkReport,
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Aggregate paper records into the full edge and node tables.
///
/// # Errors
///
/// Unreadable source, or a failure writing either table.
#[instrument(skip(config), fields(out_dir = %config.paths.out_dir.display()))]
pub fn run_edges(source: &RecordSource, config: &PipelineConfig) -> Result<EdgesReport> {
    let start = Instant::now();
    let artifacts = Artifacts::new(&config.paths.out_dir);
    artifacts.ensure_root()?;

    let chunk_size = config.aggregate.chunk_size;
    let mode = config.aggregate.weight_mode();
    let (edges, stats) = match source {
        RecordSource::PapersCsv(path) => {
            let records = PapersCsv::open(path).context("open papers table")?;
            aggregate_chunked(records, chunk_size, mode, TrimNormalizer)
        }
        RecordSource::Scopus(root) => {
            let records = ScopusRecords::open(root).context("open Scopus directory")?;
            aggregate_chunked(records, chunk_size, mode, TrimNormalizer)
        }
    };
    if stats.records_skipped > 0 {
        warn!(
            skipped = stats.records_skipped,
            seen = stats.records_seen,
            "malformed paper records skipped"
        );
    }

    let edges_path = artifacts.edges();
    let nodes_path = artifacts.nodes();
    write_edges(&edges_path, &edges).context("write edge table")?;
    let nodes = write_nodes(&nodes_path, edges.nodes()).context("write node table")?;

    let report = EdgesReport {
        source: source.path().to_path_buf(),
        records: stats,
        edges: edges.len(),
        nodes,
        weighted: edges.is_weighted(),
        content_hash: edges.content_hash(),
        edges_path,
        nodes_path,
        elapsed_ms: start.elapsed().as_millis(),
    };
    info!(
        edges = report.edges,
        nodes = report.nodes,
        hash = %report.content_hash,
        elapsed_ms = report.elapsed_ms,
        "edge aggregation complete"
    );
    Ok(report)
}

/// Build the degree table, select the top authors and export their
/// neighborhood (every edge touching a selected author).
///
/// # Errors
///
/// Missing or malformed edge table, or a failure writing any output.
#[instrument(skip(config), fields(top_n = config.select.top_n))]
pub fn run_top(config: &PipelineConfig) -> Result<TopReport> {
    let start = Instant::now();
    let artifacts = Artifacts::new(&config.paths.out_dir);
    artifacts.ensure_root()?;
    let chunk_size = config.aggregate.chunk_size;
    let edges_path = artifacts.edges();

    let mut acc = DegreeAccumulator::new();
    for chunk in EdgeTableReader::open(&edges_path)?.chunks(chunk_size) {
        acc.add_chunk(&chunk.context("read edge table chunk")?);
    }
    let (index, degree) = acc.finish();

    let degrees_path = artifacts.degrees();
    write_degrees(&degrees_path, &index.sorted()).context("write degree table")?;

    let top = top_k(&index, config.select.top_n);
    let top_nodes_path = artifacts.top_nodes();
    write_nodes(&top_nodes_path, top.iter().map(|r| r.author.as_str()))
        .context("write top-author node table")?;

    let selected: HashSet<String> = top.iter().map(|r| r.author.clone()).collect();
    let top_edges_path = artifacts.top_edges();
    let reader = EdgeTableReader::open(&edges_path)?;
    let mut writer = EdgeTableWriter::create(&top_edges_path, reader.has_weights())?;
    let mut written: HashSet<Edge> = HashSet::new();
    for chunk in reader.chunks(chunk_size) {
        for row in chunk.context("read edge table chunk")? {
            let Some((source, target)) = row.endpoints() else {
                continue;
            };
            if !touches_selection(&selected, source, target) {
                continue;
            }
            if let Some(edge) = Edge::new(source, target)
                && written.insert(edge)
            {
                writer.write(source, target, row.weight_or_default())?;
            }
        }
    }
    let top_edges = writer.finish().context("write top-author edge table")?;

    let report = TopReport {
        degree,
        authors: index.len(),
        top,
        top_edges,
        degrees_path,
        top_nodes_path,
        top_edges_path,
        elapsed_ms: start.elapsed().as_millis(),
    };
    info!(
        authors = report.authors,
        selected = report.top.len(),
        top_edges,
        elapsed_ms = report.elapsed_ms,
        "top-author selection complete"
    );
    Ok(report)
}

/// Bound the top-author graph, partition it and write the network view.
///
/// # Errors
///
/// Missing or malformed degree/top-edge tables, or a failure writing the
/// view.
#[instrument(skip(config), fields(top_n = config.select.top_n, fan_out = config.network.fan_out))]
pub fn run_network(config: &PipelineConfig) -> Result<NetworkReport> {
    run_network_with(config, &GreedyModularity)
}

/// [`run_network`] with a caller-chosen partitioner.
///
/// # Errors
///
/// See [`run_network`].
pub fn run_network_with<P: Partitioner>(
    config: &PipelineConfig,
    partitioner: &P,
) -> Result<NetworkReport> {
    let start = Instant::now();
    let artifacts = Artifacts::new(&config.paths.out_dir);

    let (index, malformed_degrees) =
        read_degrees(&artifacts.degrees()).context("read degree table")?;
    let selected = top_k(&index, config.select.top_n);
    let names: Vec<&str> = selected.iter().map(|r| r.author.as_str()).collect();

    let (edges, malformed_edges) = read_edge_set(&artifacts.top_edges(), config.aggregate.chunk_size)
        .context("read top-author edge table")?;
    let malformed_rows = malformed_degrees + malformed_edges;
    if malformed_rows > 0 {
        warn!(malformed_rows, "malformed rows skipped");
    }

    let subgraph = bounded_fan_out(&edges, &names, config.network.fan_out);
    let communities = partitioner.partition(&subgraph.nodes, &subgraph.edges);
    let view = NetworkView::build(&subgraph, &selected, &communities, &config.network.palette);

    let network_path = artifacts.network();
    view.write_json(&network_path).context("write network view")?;

    let report = NetworkReport {
        selected: selected.len(),
        fan_out: config.network.fan_out,
        malformed_rows,
        subgraph: SubgraphSummary::from(&subgraph),
        communities: view.communities,
        modularity: view.modularity,
        network_path,
        elapsed_ms: start.elapsed().as_millis(),
    };
    info!(
        nodes = report.subgraph.nodes,
        edges = report.subgraph.edges,
        communities = report.communities,
        modularity = report.modularity,
        elapsed_ms = report.elapsed_ms,
        "network view written"
    );
    Ok(report)
}

/// Run `edges`, `top` and `network` in order.
///
/// # Errors
///
/// The first stage failure.
pub fn run_all(source: &RecordSource, config: &PipelineConfig) -> Result<RunReport> {
    let edges = run_edges(source, config).context("edges stage")?;
    let top = run_top(config).context("top stage")?;
    let network = run_network(config).context("network stage")?;
    Ok(RunReport { edges, top, network })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
