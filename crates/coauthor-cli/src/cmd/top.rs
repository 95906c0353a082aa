//! `coauthor top` — degree table, top-author selection and neighborhood export.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use coauthor_core::PipelineConfig;
use coauthor_core::pipeline::{self, TopReport};

use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};

#[derive(Args, Debug, Clone, Default)]
pub struct TopArgs {
    /// Number of top authors to select.
    #[arg(long, short = 'k', value_name = "K")]
    pub top_n: Option<usize>,

    /// Edge rows read per batch.
    #[arg(long, value_name = "N")]
    pub chunk_size: Option<usize>,
}

impl TopArgs {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(top_n) = self.top_n {
            config.select.top_n = top_n;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.aggregate.chunk_size = chunk_size;
        }
    }
}

/// Run `coauthor top`.
///
/// # Errors
///
/// Missing or malformed edge table, or a failure writing the outputs.
pub fn run_top(args: &TopArgs, config: &PipelineConfig, output: OutputMode) -> Result<()> {
    let mut config = config.clone();
    args.apply(&mut config);
    let report = pipeline::run_top(&config)?;
    render_mode(output, &report, write_text, write_pretty)
}

pub fn write_text(report: &TopReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "top authors={} selected={} top_edges={} malformed_rows={} duplicate_rows={} path={}",
        report.authors,
        report.top.len(),
        report.top_edges,
        report.degree.malformed_rows,
        report.degree.duplicate_rows,
        report.top_edges_path.display()
    )
}

pub fn write_pretty(report: &TopReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Top authors")?;
    pretty_kv(w, "Authors", report.authors.to_string())?;
    pretty_kv(w, "Edge rows", report.degree.rows.to_string())?;
    if report.degree.malformed_rows > 0 {
        pretty_kv(w, "Malformed rows", report.degree.malformed_rows.to_string())?;
    }
    if report.degree.duplicate_rows > 0 {
        pretty_kv(w, "Repeated rows", report.degree.duplicate_rows.to_string())?;
    }
    pretty_kv(w, "Selected", report.top.len().to_string())?;
    pretty_kv(w, "Top edges", report.top_edges.to_string())?;
    pretty_kv(w, "Degree table", report.degrees_path.display().to_string())?;
    pretty_rule(w)?;
    for (i, ranked) in report.top.iter().take(10).enumerate() {
        writeln!(w, "{:>4}. {:<40} {:>6}", i + 1, ranked.author, ranked.degree)?;
    }
    if report.top.len() > 10 {
        writeln!(w, "      … {} more", report.top.len() - 10)?;
    }
    writeln!(w)
}
