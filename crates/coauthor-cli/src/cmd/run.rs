//! `coauthor run` — every stage in order.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use coauthor_core::PipelineConfig;
use coauthor_core::pipeline::{self, RunReport};

use super::edges::{AggregateArgs, SourceArgs};
use super::{edges, network, top};
use crate::output::{OutputMode, render_mode};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub aggregate: AggregateArgs,

    /// Number of top authors to select.
    #[arg(long, short = 'k', value_name = "K")]
    pub top_n: Option<usize>,

    /// Heaviest edges kept per author in the network view.
    #[arg(long, short = 'm', value_name = "M")]
    pub fan_out: Option<usize>,
}

/// Run `coauthor run`.
///
/// # Errors
///
/// The first failing stage.
pub fn run_all(args: &RunArgs, config: &PipelineConfig, output: OutputMode) -> Result<()> {
    let mut config = config.clone();
    args.aggregate.apply(&mut config);
    network::NetworkArgs {
        top_n: args.top_n,
        fan_out: args.fan_out,
    }
    .apply(&mut config);

    let report = pipeline::run_all(&args.source.record_source()?, &config)?;
    render_mode(output, &report, write_text, write_pretty)
}

fn write_text(report: &RunReport, w: &mut dyn Write) -> std::io::Result<()> {
    edges::write_text(&report.edges, w)?;
    top::write_text(&report.top, w)?;
    network::write_text(&report.network, w)
}

fn write_pretty(report: &RunReport, w: &mut dyn Write) -> std::io::Result<()> {
    edges::write_pretty(&report.edges, w)?;
    top::write_pretty(&report.top, w)?;
    network::write_pretty(&report.network, w)
}
