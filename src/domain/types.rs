//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during scoring and validation
//! - exported to CSV/JSON
//! - reloaded later for plotting or re-validation

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::index::{BciScore, BciWeights};

/// One ensemble forecast matched to one observation.
///
/// Members are kept in file order; the scoring formula is order-independent
/// but deterministic exports are easier to diff when the order is stable.
#[derive(Debug, Clone)]
pub struct ForecastRecord {
    pub storm: String,
    pub valid_time: NaiveDateTime,
    pub station: Option<String>,
    pub lead_hours: Option<f64>,

    pub members: Vec<f64>,
    pub observation: f64,
}

/// A forecast record with its computed BCI attached.
///
/// Records are immutable after creation: scoring produces a new
/// `ScoredRecord`, and re-scoring (e.g. during the sensitivity sweep)
/// produces fresh ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub storm: String,
    pub valid_time: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_hours: Option<f64>,

    pub observation: f64,
    pub score: BciScore,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

/// Summary stats about the records actually used for scoring.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetStats {
    pub n_records: usize,
    pub n_storms: usize,
    pub time_min: NaiveDateTime,
    pub time_max: NaiveDateTime,
    pub obs_min: f64,
    pub obs_max: f64,
}

/// `compute` run configuration.
#[derive(Debug, Clone)]
pub struct ComputeConfig {
    pub forecasts: PathBuf,
    pub observations: PathBuf,
    pub out: Option<PathBuf>,
    pub weights: BciWeights,
}

/// `validate` run configuration.
#[derive(Debug, Clone)]
pub struct ValidateConfig {
    pub scores: PathBuf,
    /// Error quantile above which a forecast counts as a high-error event.
    pub high_error_quantile: f64,
    pub export_baseline: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
}

/// `sweep` run configuration.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub forecasts: PathBuf,
    pub observations: PathBuf,
    pub weight_min: f64,
    pub weight_max: f64,
    pub steps: usize,
    pub high_error_quantile: f64,
    pub export: Option<PathBuf>,
}

/// `plot` run configuration.
#[derive(Debug, Clone)]
pub struct PlotConfig {
    pub scores: PathBuf,
    pub out_dir: PathBuf,
    pub high_error_quantile: f64,
    pub width: u32,
    pub height: u32,
}

/// `sample` run configuration.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub out_dir: PathBuf,
    pub seed: u64,
    pub n_storms: usize,
    pub timesteps_per_storm: usize,
    pub n_members: usize,
}
