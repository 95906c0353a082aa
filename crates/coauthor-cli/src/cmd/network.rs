//! `coauthor network` — bounded subgraph, communities and the network view.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use coauthor_core::PipelineConfig;
use coauthor_core::pipeline::{self, NetworkReport};

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Clone, Default)]
pub struct NetworkArgs {
    /// Number of top authors in the network.
    #[arg(long, short = 'k', value_name = "K")]
    pub top_n: Option<usize>,

    /// Heaviest edges kept per author.
    #[arg(long, short = 'm', value_name = "M")]
    pub fan_out: Option<usize>,
}

impl NetworkArgs {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(top_n) = self.top_n {
            config.select.top_n = top_n;
        }
        if let Some(fan_out) = self.fan_out {
            config.network.fan_out = fan_out;
        }
    }
}

/// Run `coauthor network`.
///
/// # Errors
///
/// Missing or malformed degree/top-edge tables, or a failure writing the view.
pub fn run_network(args: &NetworkArgs, config: &PipelineConfig, output: OutputMode) -> Result<()> {
    let mut config = config.clone();
    args.apply(&mut config);
    let report = pipeline::run_network(&config)?;
    render_mode(output, &report, write_text, write_pretty)
}

pub fn write_text(report: &NetworkReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "network nodes={} edges={} candidates={} communities={} modularity={:.4} path={}",
        report.subgraph.nodes,
        report.subgraph.edges,
        report.subgraph.candidate_edges,
        report.communities,
        report.modularity,
        report.network_path.display()
    )
}

pub fn write_pretty(report: &NetworkReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Collaboration network")?;
    pretty_kv(
        w,
        "Selection",
        format!("top {} authors, {} edges each", report.selected, report.fan_out),
    )?;
    pretty_kv(
        w,
        "Subgraph",
        format!(
            "{} nodes, {} edges ({} picked before dedup), {} components",
            report.subgraph.nodes,
            report.subgraph.edges,
            report.subgraph.candidate_edges,
            report.subgraph.components
        ),
    )?;
    pretty_kv(w, "Communities", report.communities.to_string())?;
    pretty_kv(w, "Modularity", format!("{:.4}", report.modularity))?;
    pretty_kv(w, "View", report.network_path.display().to_string())?;
    writeln!(w)
}
