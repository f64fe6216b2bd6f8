//! Shared scoring pipeline used by the `compute` and `sweep` front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest forecasts -> join observations -> score each ensemble
//!
//! The subcommands then focus on presentation and exports.

use std::path::Path;

use crate::domain::ScoredRecord;
use crate::error::AppError;
use crate::index::{BciWeights, score_ensemble};
use crate::io::ingest::{IngestedData, load_forecast_records};

/// All computed outputs of a single scoring run.
#[derive(Debug, Clone)]
pub struct ScoringOutput {
    pub ingest: IngestedData,
    pub scored: Vec<ScoredRecord>,
}

/// Load the forecast/observation pair and score every ensemble.
pub fn run_scoring(
    forecasts: &Path,
    observations: &Path,
    weights: BciWeights,
) -> Result<ScoringOutput, AppError> {
    let ingest = load_forecast_records(forecasts, observations)?;

    let mut scored = Vec::with_capacity(ingest.records.len());
    for r in &ingest.records {
        let score = score_ensemble(&r.members, r.observation, weights)?;
        scored.push(ScoredRecord {
            storm: r.storm.clone(),
            valid_time: r.valid_time,
            station: r.station.clone(),
            lead_hours: r.lead_hours,
            observation: r.observation,
            score,
        });
    }

    Ok(ScoringOutput { ingest, scored })
}
