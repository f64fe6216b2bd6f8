//! Run summary JSON.
//!
//! The summary is the "portable" record of a validation run:
//! - dataset accounting (records, storms, time range)
//! - headline BCI/φ/ρ statistics
//! - correlation and baseline results
//!
//! It is meant for archiving next to the manuscript figures, not for
//! re-ingestion.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::{DatasetStats, ScoredRecord};
use crate::error::AppError;
use crate::math::Correlation;
use crate::report::{SummaryStats, summarize};
use crate::validate::{BaselineComparison, ValidationOutput};

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationSummary {
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

impl From<Correlation> for CorrelationSummary {
    fn from(c: Correlation) -> Self {
        Self {
            r: c.r,
            p_value: c.p_value,
            n: c.n,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub label: String,
    pub auc: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub version: String,
    pub generated: String,

    pub dataset: DatasetStats,

    pub bci: SummaryStats,
    pub phi: SummaryStats,
    pub rho: SummaryStats,

    pub correlation_spread_error: CorrelationSummary,
    pub correlation_bci_error: CorrelationSummary,
    pub partial_bci_given_spread: CorrelationSummary,

    pub high_error_threshold: f64,
    pub high_error_events: usize,
    pub models: Vec<ModelSummary>,
}

/// Assemble the summary from a validation run.
pub fn build_run_summary(records: &[ScoredRecord], validation: &ValidationOutput) -> RunSummary {
    let bci: Vec<f64> = records.iter().map(|r| r.score.bci).collect();
    let phi: Vec<f64> = records.iter().map(|r| r.score.phi).collect();
    let rho: Vec<f64> = records.iter().map(|r| r.score.rho).collect();

    RunSummary {
        tool: "bci".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        generated: chrono::Local::now().to_rfc3339(),
        dataset: validation.stats.clone(),
        bci: summarize(&bci),
        phi: summarize(&phi),
        rho: summarize(&rho),
        correlation_spread_error: validation.corr_spread.into(),
        correlation_bci_error: validation.corr_bci.into(),
        partial_bci_given_spread: validation.partial.into(),
        high_error_threshold: validation.baseline.threshold,
        high_error_events: validation.baseline.n_high,
        models: model_summaries(&validation.baseline),
    }
}

fn model_summaries(baseline: &BaselineComparison) -> Vec<ModelSummary> {
    baseline
        .models
        .iter()
        .map(|m| ModelSummary {
            label: m.label.clone(),
            auc: m.auc,
        })
        .collect()
}

/// Write the run summary JSON file.
pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create summary JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::new(2, format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}
