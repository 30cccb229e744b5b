//! Command-line parsing for the goal tracker.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! command dispatch (`app`) and from the tracker math.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::domain::timestamp::parse_timestamp;
use crate::domain::{DataSource, FetchLimits, OutputMode, SimMode};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "goals", version, about = "Grid decarbonization net-zero goal tracker")]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute the goal-tracker indicators and print them.
    Track(TrackArgs),
    /// Print dataset summaries and KPI cards.
    Summary(SummaryArgs),
    /// Generate synthetic readings into CSV files and/or the hosted tables.
    Simulate(SimulateArgs),
    /// Print a previously exported tracker JSON.
    Show(ShowArgs),
    /// Launch the live terminal dashboard.
    Dash(DashArgs),
}

/// Where to read the three series from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Data source. Defaults to supabase when credentials are configured, else csv.
    #[arg(long, value_enum)]
    pub source: Option<DataSource>,

    /// Directory with the CSV files (default: CSV_OUTPUT_DIR or `data`).
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Most recent intensity readings to use.
    #[arg(long, default_value_t = FetchLimits::default().intensity)]
    pub intensity_limit: usize,

    /// Most recent generation-mix readings to use.
    #[arg(long, default_value_t = FetchLimits::default().mix)]
    pub mix_limit: usize,

    /// Yearly targets to use.
    #[arg(long, default_value_t = FetchLimits::default().targets)]
    pub target_limit: usize,
}

impl SourceArgs {
    pub fn limits(&self) -> FetchLimits {
        FetchLimits {
            intensity: self.intensity_limit,
            mix: self.mix_limit,
            targets: self.target_limit,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct TrackArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Evaluate as of this instant (RFC 3339) instead of now.
    #[arg(long, value_parser = parse_timestamp)]
    pub at: Option<DateTime<Utc>>,

    /// Print the raw indicator JSON instead of the text report.
    #[arg(long)]
    pub json: bool,

    /// Render an ASCII plot of the intensity history.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Save the result (with provenance) to a JSON file.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Run mode.
    #[arg(value_enum, default_value_t = SimMode::Once)]
    pub mode: SimMode,

    /// Random seed for reproducible output (default: SIM_RANDOM_SEED or entropy).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Where generated rows go (default: OUTPUT_MODE or csv).
    #[arg(long, value_enum)]
    pub output: Option<OutputMode>,

    /// Wall-clock seconds between steps in continuous mode.
    #[arg(long, value_name = "SECONDS")]
    pub wall: Option<u64>,

    /// Simulated minutes per step.
    #[arg(long, value_name = "MINUTES")]
    pub step: Option<u32>,

    /// Steps to generate in `once` mode; in `continuous` mode, stop after this many.
    #[arg(long)]
    pub count: Option<usize>,

    /// Directory for the CSV files (default: CSV_OUTPUT_DIR or `data`).
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Tracker JSON produced by `goals track --export`.
    #[arg(value_name = "JSON")]
    pub file: PathBuf,

    /// Print the raw indicator JSON.
    #[arg(long)]
    pub json: bool,

    /// Render an ASCII plot of the pathway targets.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct DashArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Seconds between automatic refreshes (default: DASH_POLL_SECONDS or 10).
    #[arg(long, value_name = "SECONDS")]
    pub poll: Option<u64>,
}
