//! Export computed results to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! plotting scripts, and the scores CSV round-trips through
//! `ingest::read_scores_csv` for the `validate`/`plot` subcommands.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::ScoredRecord;
use crate::error::AppError;
use crate::sweep::SweepPoint;
use crate::validate::BaselineComparison;

/// Write per-timestep BCI scores to a CSV file.
pub fn write_scores_csv(path: &Path, records: &[ScoredRecord]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create scores CSV '{}': {e}", path.display()))
    })?;

    writeln!(
        file,
        "storm,valid_time,station,lead_hours,obs_temperature,model_mean,model_std,rmse,\
         mean_error,mean_bias,bias_cv,directional_agreement,magnitude_consistency,phi,rho,bci,n_members"
    )
    .map_err(|e| AppError::new(2, format!("Failed to write scores CSV header: {e}")))?;

    for r in records {
        let s = &r.score;
        writeln!(
            file,
            "{},{},{},{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{}",
            r.storm,
            r.valid_time.format("%Y-%m-%d %H:%M:%S"),
            r.station.as_deref().unwrap_or(""),
            r.lead_hours.map(|v| format!("{v}")).unwrap_or_default(),
            r.observation,
            s.ensemble_mean,
            s.spread,
            s.rmse,
            s.mean_error,
            s.mean_bias,
            s.bias_cv,
            s.directional_agreement,
            s.magnitude_consistency,
            s.phi,
            s.rho,
            s.bci,
            s.n_members,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write scores CSV row: {e}")))?;
    }

    Ok(())
}

/// Write the baseline AUC comparison table.
pub fn write_baseline_csv(path: &Path, baseline: &BaselineComparison) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create baseline CSV '{}': {e}", path.display()))
    })?;

    writeln!(file, "model,auc")
        .map_err(|e| AppError::new(2, format!("Failed to write baseline CSV header: {e}")))?;
    for model in &baseline.models {
        writeln!(file, "{},{:.6}", model.label, model.auc)
            .map_err(|e| AppError::new(2, format!("Failed to write baseline CSV row: {e}")))?;
    }

    Ok(())
}

/// Write the sensitivity sweep table.
pub fn write_sweep_csv(path: &Path, points: &[SweepPoint]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create sweep CSV '{}': {e}", path.display()))
    })?;

    writeln!(file, "directional_weight,partial_r,partial_p,auc_combined")
        .map_err(|e| AppError::new(2, format!("Failed to write sweep CSV header: {e}")))?;
    for p in points {
        writeln!(
            file,
            "{:.4},{:.6},{:.6},{:.6}",
            p.weight, p.partial_r, p.partial_p, p.auc
        )
        .map_err(|e| AppError::new(2, format!("Failed to write sweep CSV row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{BciWeights, score_ensemble};

    fn scored() -> ScoredRecord {
        let score = score_ensemble(&[10.5, 11.2, 10.8, 11.0], 12.5, BciWeights::default()).unwrap();
        ScoredRecord {
            storm: "eunice".to_string(),
            valid_time: chrono::NaiveDate::from_ymd_opt(2022, 2, 18)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            station: None,
            lead_hours: Some(24.0),
            observation: 12.5,
            score,
        }
    }

    #[test]
    fn scores_csv_roundtrips_through_ingest() {
        let dir = std::env::temp_dir().join("bci-export-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scores.csv");

        write_scores_csv(&path, &[scored()]).unwrap();

        let read = crate::io::read_scores_csv(&path).unwrap();
        assert_eq!(read.records.len(), 1);
        let r = &read.records[0];
        assert_eq!(r.storm, "eunice");
        assert_eq!(r.lead_hours, Some(24.0));
        assert!((r.score.bci - scored().score.bci).abs() < 1e-4);

        std::fs::remove_file(&path).ok();
    }
}
