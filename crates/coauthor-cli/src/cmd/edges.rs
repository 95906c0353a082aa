//! `coauthor edges` — aggregate paper records into the full edge and node tables.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use coauthor_core::PipelineConfig;
use coauthor_core::pipeline::{self, EdgesReport, RecordSource};

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Where paper records come from. Exactly one is required.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Papers table with a semicolon-joined `authors_str` column.
    #[arg(long, value_name = "CSV")]
    pub papers: Option<PathBuf>,

    /// Directory of Scopus abstract-retrieval JSON files (searched recursively).
    #[arg(long, value_name = "DIR")]
    pub scopus: Option<PathBuf>,
}

impl SourceArgs {
    pub fn record_source(&self) -> Result<RecordSource> {
        match (&self.papers, &self.scopus) {
            (Some(path), None) => Ok(RecordSource::PapersCsv(path.clone())),
            (None, Some(dir)) => Ok(RecordSource::Scopus(dir.clone())),
            _ => anyhow::bail!("pass exactly one of --papers or --scopus"),
        }
    }
}

/// Aggregation settings shared by `edges` and `run`.
#[derive(Args, Debug, Clone, Default)]
pub struct AggregateArgs {
    /// Records (or edge rows) processed per batch.
    #[arg(long, value_name = "N")]
    pub chunk_size: Option<usize>,

    /// Record co-authorship presence only; every edge gets weight 1.
    #[arg(long)]
    pub presence: bool,
}

impl AggregateArgs {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(chunk_size) = self.chunk_size {
            config.aggregate.chunk_size = chunk_size;
        }
        if self.presence {
            config.aggregate.track_weights = false;
        }
    }
}

#[derive(Args, Debug)]
pub struct EdgesArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub aggregate: AggregateArgs,
}

/// Run `coauthor edges`.
///
/// # Errors
///
/// Unreadable record source or a failure writing the tables.
pub fn run_edges(args: &EdgesArgs, config: &PipelineConfig, output: OutputMode) -> Result<()> {
    let mut config = config.clone();
    args.aggregate.apply(&mut config);
    let report = pipeline::run_edges(&args.source.record_source()?, &config)?;
    render_mode(output, &report, write_text, write_pretty)
}

pub fn write_text(report: &EdgesReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "edges records={} skipped={} edges={} nodes={} hash={} path={}",
        report.records.records_seen,
        report.records.records_skipped,
        report.edges,
        report.nodes,
        report.content_hash,
        report.edges_path.display()
    )
}

pub fn write_pretty(report: &EdgesReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Edge aggregation")?;
    pretty_kv(w, "Source", report.source.display().to_string())?;
    pretty_kv(
        w,
        "Records",
        format!(
            "{} read, {} skipped, {} with co-authors",
            report.records.records_seen,
            report.records.records_skipped,
            report.records.papers_with_pairs
        ),
    )?;
    pretty_kv(
        w,
        "Edges",
        format!(
            "{} ({})",
            report.edges,
            if report.weighted { "paper-count weights" } else { "presence" }
        ),
    )?;
    pretty_kv(w, "Authors", report.nodes.to_string())?;
    pretty_kv(w, "Content hash", &report.content_hash)?;
    pretty_kv(w, "Edge table", report.edges_path.display().to_string())?;
    pretty_kv(w, "Node table", report.nodes_path.display().to_string())?;
    writeln!(w)
}
