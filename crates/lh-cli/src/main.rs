//! lihe CLI

mod run;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lh_analysis::RunSummary;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lihe")]
#[command(about = "lihe - cut-and-fill event analysis")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one pass over the configured source
    Run {
        /// Run config (YAML, or JSON by extension)
        #[arg(short, long)]
        config: PathBuf,

        /// Override the source's input file (single-file sources only)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Disable a cut by name (repeatable)
        #[arg(long, value_name = "NAME")]
        disable: Vec<String>,

        /// Enable a cut by name (repeatable, applied after --disable)
        #[arg(long, value_name = "NAME")]
        enable: Vec<String>,

        /// Directory for per-fill `.dat` and migration JSON files
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Output file for the run summary (pretty JSON). Defaults to stdout.
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// List the configured cuts and whether they start enabled
    Cuts {
        /// Run config (YAML, or JSON by extension)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { config, input, disable, enable, output_dir, summary } => cmd_run(
            &config,
            input.as_deref(),
            &disable,
            &enable,
            output_dir.as_deref(),
            summary.as_ref(),
        ),
        Commands::Cuts { config } => cmd_cuts(&config),
        Commands::Version => {
            println!("lihe {}", lh_core::VERSION);
            Ok(())
        }
    }
}

fn cmd_run(
    config: &Path,
    input: Option<&Path>,
    disable: &[String],
    enable: &[String],
    output_dir: Option<&Path>,
    summary: Option<&PathBuf>,
) -> Result<()> {
    let mut cfg = run::read_run_config(config)?;
    if let Some(input) = input {
        // relative to the working directory, not the config file
        let input = std::path::absolute(input)?;
        cfg.source.set_input(input)?;
    }

    let mut analysis = cfg.analysis.build_run().context("building run from config")?;
    for (names, enabled) in [(disable, false), (enable, true)] {
        for name in names {
            analysis.set_cut_enabled(name, enabled)?;
        }
    }
    tracing::info!(
        fills = analysis.fills().len(),
        cuts = analysis.pipeline().len(),
        enabled = analysis.pipeline().enabled_count(),
        "run configured"
    );

    let mut source = cfg.open_source()?;
    let result = analysis.execute(&mut source)?;
    tracing::info!(
        events = result.events_seen(),
        passed = result.events_passed(),
        without_reconstruction = result.events_without_reconstruction(),
        "pass complete"
    );

    if let Some(dir) = output_dir {
        run::write_artifacts(dir, &result)?;
    }
    write_json(summary, serde_json::to_value(RunSummary::from(&result))?)
}

fn cmd_cuts(config: &Path) -> Result<()> {
    let cfg = run::read_run_config(config)?;
    let analysis = cfg.analysis.build_run()?;
    for (name, enabled) in analysis.pipeline().iter() {
        println!("[{}] {name}", if enabled { "x" } else { " " });
    }
    Ok(())
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
