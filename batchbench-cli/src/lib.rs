#![warn(missing_docs)]
//! BatchBench CLI Library
//!
//! Command-line front end for batched benchmark campaigns:
//! - `run` drives a campaign to completion, resuming from the checkpoint
//! - `status` reports the checkpoint position without touching data
//! - `export` turns finished batches into per-test CSV statistics
//! - `dump` writes every raw measurement as a JSON snapshot

mod config;

pub use config::{CampaignConfig, ConfigError};

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use batchbench_core::{plan_batches, ProgressError, ProgressStore, TestBatch};
use batchbench_engine::{DataCollector, ExperimentCampaign};
use batchbench_report::{batch_rows, build_snapshot, generate_csv_report, generate_json_snapshot};

/// BatchBench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "batchbench")]
#[command(
    author,
    version,
    about = "BatchBench - batched benchmark campaigns over JUnit test suites"
)]
pub struct Cli {
    /// Subcommand (run, status, export, dump)
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the campaign to completion, resuming from the last checkpoint
    Run {
        /// Campaign config file (TOML, or JSON)
        config: PathBuf,
    },
    /// Show the checkpoint position without touching campaign data
    Status {
        /// Campaign config file (TOML, or JSON)
        config: PathBuf,
    },
    /// Export per-test statistics of every finished batch as CSV
    Export {
        /// Campaign config file (TOML, or JSON)
        config: PathBuf,

        /// Merge each batch's repetitions into one sample set per test
        #[arg(long)]
        combine_repetitions: bool,

        /// Output file; defaults to statistics.csv in the output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Dump every raw measurement of the finished batches as JSON
    Dump {
        /// Campaign config file (TOML, or JSON)
        config: PathBuf,

        /// Output file; defaults to snapshot.json in the output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run the BatchBench CLI with the given arguments.
/// This is the main entry point for the `batchbench` binary.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the BatchBench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("batchbench=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("batchbench=info")
            .init();
    }

    match cli.command {
        Commands::Run { ref config } => run_campaign(config),
        Commands::Status { ref config } => show_status(config),
        Commands::Export {
            ref config,
            combine_repetitions,
            ref output,
        } => export_statistics(config, combine_repetitions, output.as_deref()),
        Commands::Dump {
            ref config,
            ref output,
        } => dump_snapshot(config, output.as_deref()),
    }
}

/// Load the config and plan the batches every command starts from.
fn load_campaign(config_path: &Path) -> anyhow::Result<(CampaignConfig, Vec<TestBatch>)> {
    let config = CampaignConfig::load(config_path)?;
    let tests = config.load_tests()?;
    let batches = plan_batches(&tests, config.batch_size);
    Ok((config, batches))
}

fn run_campaign(config_path: &Path) -> anyhow::Result<()> {
    let (config, batches) = load_campaign(config_path)?;
    let test_count: usize = batches.iter().map(|batch| batch.tests.len()).sum();
    let total_batches = batches.len();
    info!(
        "campaign: {} tests in {} batches, {} repetitions, {} runners",
        test_count,
        total_batches,
        config.repetitions,
        config.runners.len()
    );

    let campaign = ExperimentCampaign::new(
        config.layout(),
        batches,
        config.repetitions,
        config.build_runners(),
    );
    campaign.run()?;

    println!(
        "Campaign complete: {} batches, {} repetitions each.",
        total_batches, config.repetitions
    );
    Ok(())
}

fn show_status(config_path: &Path) -> anyhow::Result<()> {
    let (config, batches) = load_campaign(config_path)?;
    let store = ProgressStore::new(&config.layout());
    let total_steps = batches.len() * config.repetitions;

    match store.peek() {
        Ok(progress) => {
            let done = progress.steps_done(config.repetitions);
            println!(
                "Batch {}/{}, repetition {}/{}: {}/{} steps ({:.1}%).",
                progress.batch,
                batches.len(),
                progress.repetition,
                config.repetitions,
                done,
                total_steps,
                100.0 * done as f64 / total_steps as f64
            );
            if progress.is_complete(batches.len()) {
                println!("Campaign complete.");
            }
        }
        Err(ProgressError::NoCheckpoint { .. }) => {
            println!(
                "No checkpoint found; the campaign has not started (0/{} steps).",
                total_steps
            );
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn export_statistics(
    config_path: &Path,
    combine_repetitions: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let (config, batches) = load_campaign(config_path)?;
    let collector = DataCollector::open(
        config.layout(),
        batches,
        config.repetitions,
        config.build_runners(),
    )?;

    let pb = ProgressBar::new(collector.finished_batches() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut rows = Vec::new();
    for batch in 0..collector.finished_batches() {
        pb.set_message(format!("batch {}", batch));
        rows.extend(batch_rows(&collector, batch, combine_repetitions)?);
        pb.inc(1);
    }
    pb.finish_with_message("Collected");

    let csv = generate_csv_report(&rows, combine_repetitions);
    let path = resolve_output(output, &config, "statistics.csv");
    let mut file = File::create(&path)?;
    file.write_all(csv.as_bytes())?;
    println!("Statistics written to: {}", path.display());
    Ok(())
}

fn dump_snapshot(config_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let (config, batches) = load_campaign(config_path)?;
    let collector = DataCollector::open(
        config.layout(),
        batches,
        config.repetitions,
        config.build_runners(),
    )?;

    let snapshot = build_snapshot(&collector)?;
    let json = generate_json_snapshot(&snapshot)?;
    let path = resolve_output(output, &config, "snapshot.json");
    let mut file = File::create(&path)?;
    file.write_all(json.as_bytes())?;
    println!(
        "Snapshot written to: {} ({} records from {} finished batches)",
        path.display(),
        snapshot.records.len(),
        snapshot.meta.finished_batches
    );
    Ok(())
}

/// Resolve an export path: explicit `--output` wins, otherwise `default_name`
/// inside the campaign output directory.
fn resolve_output(output: Option<&Path>, config: &CampaignConfig, default_name: &str) -> PathBuf {
    output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output_dir.join(default_name))
}
