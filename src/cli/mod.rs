//! Command-line parsing for the BCI toolkit.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the scoring/validation code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bci", version, about = "Bias-Coherence Index for ensemble weather forecasts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score ensemble forecasts against observations and export per-event BCI.
    Compute(ComputeArgs),
    /// Validate scored output: correlations, per-storm stats, and baseline AUCs.
    Validate(ValidateArgs),
    /// Sweep the directional weight and report validation skill per grid point.
    Sweep(SweepArgs),
    /// Render PNG charts from scored output.
    Plot(PlotArgs),
    /// Generate a synthetic forecast/observation CSV pair.
    Sample(SampleArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct ComputeArgs {
    /// Ensemble forecast CSV (storm, valid_time, temperature per member row).
    #[arg(long, value_name = "CSV")]
    pub forecasts: PathBuf,

    /// Matched observation CSV (storm, valid_time, obs_temperature).
    #[arg(long, value_name = "CSV")]
    pub observations: PathBuf,

    /// Weight on directional agreement in phi (magnitude gets the remainder).
    #[arg(short = 'w', long, default_value_t = 0.7)]
    pub weight: f64,

    /// Write per-event scores to CSV.
    #[arg(long, value_name = "CSV")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ValidateArgs {
    /// Scores CSV produced by `bci compute`.
    #[arg(long, value_name = "CSV")]
    pub scores: PathBuf,

    /// Error quantile defining a high-error event.
    #[arg(short = 'q', long, default_value_t = 0.75)]
    pub quantile: f64,

    /// Export the baseline AUC table to CSV.
    #[arg(long = "export-baseline", value_name = "CSV")]
    pub export_baseline: Option<PathBuf>,

    /// Write the full run summary to JSON.
    #[arg(long = "summary-json", value_name = "JSON")]
    pub summary_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct SweepArgs {
    /// Ensemble forecast CSV.
    #[arg(long, value_name = "CSV")]
    pub forecasts: PathBuf,

    /// Matched observation CSV.
    #[arg(long, value_name = "CSV")]
    pub observations: PathBuf,

    /// Lowest directional weight on the grid.
    #[arg(long, default_value_t = 0.5)]
    pub weight_min: f64,

    /// Highest directional weight on the grid.
    #[arg(long, default_value_t = 0.9)]
    pub weight_max: f64,

    /// Number of grid points.
    #[arg(long, default_value_t = 9)]
    pub steps: usize,

    /// Error quantile defining a high-error event.
    #[arg(short = 'q', long, default_value_t = 0.75)]
    pub quantile: f64,

    /// Export the sweep table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct PlotArgs {
    /// Scores CSV produced by `bci compute`.
    #[arg(long, value_name = "CSV")]
    pub scores: PathBuf,

    /// Directory for the PNG output.
    #[arg(long = "out-dir", value_name = "DIR", default_value = "plots")]
    pub out_dir: PathBuf,

    /// Error quantile defining a high-error event.
    #[arg(short = 'q', long, default_value_t = 0.75)]
    pub quantile: f64,

    /// Chart width (pixels).
    #[arg(long, default_value_t = 900)]
    pub width: u32,

    /// Chart height (pixels).
    #[arg(long, default_value_t = 600)]
    pub height: u32,
}

#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Directory for the generated CSV pair.
    #[arg(long = "out-dir", value_name = "DIR", default_value = "sample-data")]
    pub out_dir: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of storms to generate (up to 14).
    #[arg(long, default_value_t = 8)]
    pub storms: usize,

    /// Verification times per storm.
    #[arg(long, default_value_t = 20)]
    pub timesteps: usize,

    /// Ensemble members per forecast.
    #[arg(long, default_value_t = 18)]
    pub members: usize,
}
