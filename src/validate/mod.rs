//! Statistical validation of computed BCI scores.
//!
//! The pipeline mirrors the manuscript analysis:
//!
//! 1. raw Pearson correlations of spread and BCI against forecast error
//! 2. partial correlation of BCI vs. error controlling for spread
//! 3. per-storm summary statistics
//! 4. baseline AUC comparison for high-error detection

pub mod baseline;
pub mod partial;
pub mod roc;

pub use baseline::*;
pub use partial::*;
pub use roc::*;

use crate::domain::{DatasetStats, ScoredRecord};
use crate::error::AppError;
use crate::io::ingest::dataset_stats;
use crate::math::{Correlation, mean, pearson_test, std_pop};

/// Per-storm aggregate used in the validation report.
#[derive(Debug, Clone)]
pub struct StormStat {
    pub storm: String,
    pub n: usize,
    pub bci_mean: f64,
    pub bci_std: f64,
    pub spread_mean: f64,
    pub error_mean: f64,
}

/// Everything a validation run computes.
#[derive(Debug, Clone)]
pub struct ValidationOutput {
    pub stats: DatasetStats,
    pub corr_spread: Correlation,
    pub corr_bci: Correlation,
    pub partial: Correlation,
    pub storms: Vec<StormStat>,
    pub baseline: BaselineComparison,
}

/// Run the full validation pipeline over scored records.
pub fn run_validation(
    records: &[ScoredRecord],
    high_error_quantile: f64,
) -> Result<ValidationOutput, AppError> {
    let stats = dataset_stats(
        records
            .iter()
            .map(|r| (r.storm.as_str(), r.valid_time, r.observation)),
    )
    .ok_or_else(|| AppError::new(3, "No scored records to validate."))?;

    let spread: Vec<f64> = records.iter().map(|r| r.score.spread).collect();
    let bci: Vec<f64> = records.iter().map(|r| r.score.bci).collect();
    let errors: Vec<f64> = records.iter().map(|r| r.score.mean_error).collect();

    let corr_spread = pearson_test(&spread, &errors).ok_or_else(|| {
        AppError::new(4, "Spread/error correlation is undefined (degenerate series).")
    })?;
    let corr_bci = pearson_test(&bci, &errors).ok_or_else(|| {
        AppError::new(4, "BCI/error correlation is undefined (degenerate series).")
    })?;
    let partial = partial_correlation(&bci, &errors, &spread)?;

    let baseline = compare_baselines(&spread, &bci, &errors, high_error_quantile)?;

    Ok(ValidationOutput {
        stats,
        corr_spread,
        corr_bci,
        partial,
        storms: storm_stats(records),
        baseline,
    })
}

/// Aggregate scored records per storm, sorted by sample count (descending).
pub fn storm_stats(records: &[ScoredRecord]) -> Vec<StormStat> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: std::collections::HashMap<&str, Vec<&ScoredRecord>> =
        std::collections::HashMap::new();
    for r in records {
        if !grouped.contains_key(r.storm.as_str()) {
            order.push(r.storm.clone());
        }
        grouped.entry(r.storm.as_str()).or_default().push(r);
    }

    let mut stats: Vec<StormStat> = order
        .iter()
        .map(|storm| {
            let rs = &grouped[storm.as_str()];
            let bci: Vec<f64> = rs.iter().map(|r| r.score.bci).collect();
            let spread: Vec<f64> = rs.iter().map(|r| r.score.spread).collect();
            let errors: Vec<f64> = rs.iter().map(|r| r.score.mean_error).collect();
            StormStat {
                storm: storm.clone(),
                n: rs.len(),
                bci_mean: mean(&bci),
                bci_std: std_pop(&bci),
                spread_mean: mean(&spread),
                error_mean: mean(&errors),
            }
        })
        .collect();

    // Sort by n descending; tie-break on name for deterministic output.
    stats.sort_by(|a, b| b.n.cmp(&a.n).then_with(|| a.storm.cmp(&b.storm)));
    stats
}
