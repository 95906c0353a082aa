#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use coauthor_core::{PipelineConfig, load_config};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "coauthor: co-authorship networks from bibliographic records",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Emit JSON output (alias for `--format json`).
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Config file (default: ./coauthor.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding the stage artifacts (overrides `[paths] out_dir`).
    #[arg(long, global = true, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }

    /// Load the config file and apply global overrides.
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let cwd = env::current_dir()?;
        let mut config = load_config(&cwd, self.config.as_deref())?;
        if let Some(out_dir) = &self.out_dir {
            config.paths.out_dir.clone_from(out_dir);
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Build the full co-authorship edge and node tables",
        long_about = "Aggregate per-paper author lists into unique co-authorship pairs and write \
                      author_edges.csv and author_nodes.csv.",
        after_help = "EXAMPLES:\n    # From a papers table\n    coauthor edges --papers papers.csv\n\n    # From a Scopus JSON dump, presence-only edges\n    coauthor edges --scopus raw/ --presence"
    )]
    Edges(cmd::edges::EdgesArgs),

    #[command(
        about = "Rank authors by degree and export the top-author neighborhood",
        long_about = "Stream author_edges.csv to build author_degrees.csv, select the top K authors \
                      and write every edge touching them to author_top_edges.csv.",
        after_help = "EXAMPLES:\n    # Default top 100\n    coauthor top\n\n    # Top 50, JSON report\n    coauthor top -k 50 --json"
    )]
    Top(cmd::top::TopArgs),

    #[command(
        about = "Partition the top-author graph and write the network view",
        long_about = "Keep each top author's heaviest co-authorships, find communities by greedy \
                      modularity and write network.json for the renderer.",
        after_help = "EXAMPLES:\n    # Three edges per author (default)\n    coauthor network\n\n    # Denser view\n    coauthor network -m 5"
    )]
    Network(cmd::network::NetworkArgs),

    #[command(
        about = "Run edges, top and network in order",
        after_help = "EXAMPLES:\n    coauthor run --papers papers.csv --out-dir artifacts/"
    )]
    Run(cmd::run::RunArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("COAUTHOR_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "coauthor=debug,info"
        } else {
            "coauthor=info,warn"
        })
    });

    let format = env::var("COAUTHOR_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    let config = cli.pipeline_config()?;
    debug!(?config, "resolved pipeline config");

    match &cli.command {
        Commands::Edges(args) => cmd::edges::run_edges(args, &config, output),
        Commands::Top(args) => cmd::top::run_top(args, &config, output),
        Commands::Network(args) => cmd::network::run_network(args, &config, output),
        Commands::Run(args) => cmd::run::run_all(args, &config, output),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let cli_error = CliError::from(&err);
            if render_error(output, &cli_error).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_before_or_after_subcommand() {
        let cli = Cli::parse_from(["coauthor", "--json", "top"]);
        assert!(cli.json);
        let cli = Cli::parse_from(["coauthor", "top", "--json"]);
        assert!(cli.json);
        assert_eq!(cli.output_mode(), OutputMode::Json);
    }

    #[test]
    fn format_flag_parses() {
        let cli = Cli::parse_from(["coauthor", "network", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
    }

    #[test]
    fn edges_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["coauthor", "edges"]).is_err());
        assert!(
            Cli::try_parse_from(["coauthor", "edges", "--papers", "a.csv", "--scopus", "raw"])
                .is_err()
        );
        let cli = Cli::parse_from(["coauthor", "edges", "--scopus", "raw", "--presence"]);
        match cli.command {
            Commands::Edges(args) => {
                assert_eq!(args.source.scopus, Some(PathBuf::from("raw")));
                assert!(args.aggregate.presence);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn stage_overrides_apply_to_config() {
        let cli = Cli::parse_from(["coauthor", "network", "-k", "20", "-m", "5"]);
        let Commands::Network(args) = cli.command else {
            panic!("expected network");
        };
        let mut config = PipelineConfig::default();
        args.apply(&mut config);
        assert_eq!(config.select.top_n, 20);
        assert_eq!(config.network.fan_out, 5);
    }

    #[test]
    fn run_accepts_all_stage_flags() {
        let cli = Cli::parse_from([
            "coauthor",
            "--out-dir",
            "artifacts",
            "run",
            "--papers",
            "papers.csv",
            "--chunk-size",
            "1000",
            "-k",
            "10",
            "-m",
            "2",
        ]);
        assert_eq!(cli.out_dir, Some(PathBuf::from("artifacts")));
        assert!(matches!(cli.command, Commands::Run(_)));
    }
}
