//! SpecTrack CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod run;

use st_core::RunConfig;

#[derive(Parser)]
#[command(name = "spectrack")]
#[command(about = "SpecTrack - pixel spectrometer simulation and Kalman-filter track reconstruction")]
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
    /// Simulate events and reconstruct one track per event
    Run {
        /// Run configuration (YAML or JSON). Defaults to the reference setup.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of events (overrides the config)
        #[arg(long)]
        events: Option<u64>,

        /// Base RNG seed (overrides the config)
        #[arg(long)]
        seed: Option<u64>,

        /// Threads (0 = auto). Results do not depend on it. Overrides the config.
        #[arg(long)]
        threads: Option<usize>,

        /// Output file for the run artifact (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the default run configuration
    DefaultConfig {
        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print version information
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
        Commands::Run { config, events, seed, threads, output } => {
            cmd_run(config.as_ref(), events, seed, threads, output.as_ref())
        }
        Commands::DefaultConfig { output } => {
            write_json(output.as_ref(), serde_json::to_value(RunConfig::default())?)
        }
        Commands::Version => {
            println!("spectrack {}", st_core::VERSION);
            Ok(())
        }
    }
}

fn cmd_run(
    config: Option<&PathBuf>,
    events: Option<u64>,
    seed: Option<u64>,
    threads: Option<usize>,
    output: Option<&PathBuf>,
) -> Result<()> {
    let mut cfg = match config {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            RunConfig::from_path(path)?
        }
        None => RunConfig::default(),
    };
    if let Some(n) = events {
        cfg.run.events = n;
    }
    if let Some(s) = seed {
        cfg.run.seed = s;
    }
    if let Some(t) = threads {
        cfg.run.threads = t;
    }

    let run = run::run_events(&cfg, cfg.run.threads)?;
    let artifact = st_hist::run_artifact(&cfg, &run.results, run.threads)?;
    write_json(output, serde_json::to_value(&artifact)?)?;

    // stdout carries the artifact when no output file is given
    if output.is_some() {
        println!("{}", run.results.summary);
    } else {
        eprintln!("{}", run.results.summary);
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
