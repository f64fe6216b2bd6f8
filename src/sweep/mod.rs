//! Directional-weight sweep.
//!
//! Design goals:
//! - deterministic: a fixed linear grid, no stochastic search
//! - parallel across grid points (each point re-scores the dataset)
//! - one headline number per point: partial correlation and combined AUC

use rayon::prelude::*;

use crate::domain::ForecastRecord;
use crate::error::AppError;
use crate::index::{BciWeights, score_ensemble};
use crate::validate::{compare_baselines, partial_correlation};

/// One grid point of the sweep.
#[derive(Debug, Clone, Copy)]
pub struct SweepPoint {
    pub weight: f64,
    pub partial_r: f64,
    pub partial_p: f64,
    /// AUC of the learned spread + BCI detector at this weight.
    pub auc: f64,
}

#[derive(Debug, Clone)]
pub struct SweepOutput {
    pub points: Vec<SweepPoint>,
    /// Index into `points` of the best grid point.
    pub best: usize,
}

/// Evenly spaced grid over `[min, max]` with `steps` points.
pub fn linear_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(AppError::new(2, "Sweep bounds must be finite."));
    }
    if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min >= max {
        return Err(AppError::new(
            2,
            format!("Sweep bounds must satisfy 0 <= min < max <= 1, got [{min}, {max}]."),
        ));
    }
    if steps < 2 {
        return Err(AppError::new(2, "Sweep needs at least 2 grid points."));
    }

    let step = (max - min) / (steps - 1) as f64;
    Ok((0..steps).map(|i| min + step * i as f64).collect())
}

/// Re-score the dataset at each grid weight and measure validation skill.
pub fn run_sweep(
    records: &[ForecastRecord],
    weight_min: f64,
    weight_max: f64,
    steps: usize,
    high_error_quantile: f64,
) -> Result<SweepOutput, AppError> {
    if records.is_empty() {
        return Err(AppError::new(3, "No forecast records to sweep over."));
    }
    let grid = linear_space(weight_min, weight_max, steps)?;

    let points: Vec<SweepPoint> = grid
        .par_iter()
        .map(|&weight| evaluate_weight(records, weight, high_error_quantile))
        .collect::<Result<Vec<_>, AppError>>()?;

    // Best by AUC, then |partial r|, then grid order. All deterministic.
    let mut best = 0usize;
    for (i, p) in points.iter().enumerate().skip(1) {
        let b = &points[best];
        let better = p.auc > b.auc
            || (p.auc == b.auc && p.partial_r.abs() > b.partial_r.abs());
        if better {
            best = i;
        }
    }

    Ok(SweepOutput { points, best })
}

fn evaluate_weight(
    records: &[ForecastRecord],
    weight: f64,
    high_error_quantile: f64,
) -> Result<SweepPoint, AppError> {
    let weights = BciWeights::new(weight)?;

    let mut spread = Vec::with_capacity(records.len());
    let mut bci = Vec::with_capacity(records.len());
    let mut errors = Vec::with_capacity(records.len());
    for r in records {
        let score = score_ensemble(&r.members, r.observation, weights)?;
        spread.push(score.spread);
        bci.push(score.bci);
        errors.push(score.mean_error);
    }

    let partial = partial_correlation(&bci, &errors, &spread)?;
    let baseline = compare_baselines(&spread, &bci, &errors, high_error_quantile)?;
    let learned = baseline
        .models
        .last()
        .ok_or_else(|| AppError::new(4, "Baseline comparison returned no models."))?;

    Ok(SweepPoint {
        weight,
        partial_r: partial.r,
        partial_p: partial.p_value,
        auc: learned.auc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn linear_space_endpoints() {
        let grid = linear_space(0.5, 0.9, 9).unwrap();
        assert_eq!(grid.len(), 9);
        assert!((grid[0] - 0.5).abs() < 1e-12);
        assert!((grid[8] - 0.9).abs() < 1e-12);
        assert!((grid[4] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn linear_space_rejects_bad_bounds() {
        assert_eq!(linear_space(0.9, 0.5, 5).unwrap_err().exit_code(), 2);
        assert_eq!(linear_space(-0.1, 0.5, 5).unwrap_err().exit_code(), 2);
        assert_eq!(linear_space(0.5, 0.9, 1).unwrap_err().exit_code(), 2);
    }

    fn record(storm: &str, hour: u32, members: Vec<f64>, obs: f64) -> ForecastRecord {
        ForecastRecord {
            storm: storm.to_string(),
            valid_time: NaiveDate::from_ymd_opt(2024, 2, 18)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            station: None,
            lead_hours: None,
            members,
            observation: obs,
        }
    }

    fn dataset() -> Vec<ForecastRecord> {
        // A mix of coherent and incoherent ensembles with varied errors.
        let mut records = Vec::new();
        for i in 0..16 {
            let shift = i as f64 * 0.4;
            let members = vec![8.0 + shift, 8.7 + shift, 9.5 + shift, 10.3 + shift];
            records.push(record("babet", i, members, 9.0));
        }
        for i in 0..8 {
            let w = (i as f64 * 1.1).sin();
            let members = vec![5.0 - w, 6.0 + w, 7.0 - w, 8.0 + w];
            records.push(record("henk", i, members, 6.5 + w));
        }
        records
    }

    #[test]
    fn sweep_is_deterministic() {
        let records = dataset();
        let a = run_sweep(&records, 0.5, 0.9, 5, 0.75).unwrap();
        let b = run_sweep(&records, 0.5, 0.9, 5, 0.75).unwrap();

        assert_eq!(a.points.len(), 5);
        assert_eq!(a.best, b.best);
        for (pa, pb) in a.points.iter().zip(b.points.iter()) {
            assert_eq!(pa.auc, pb.auc);
            assert_eq!(pa.partial_r, pb.partial_r);
        }
    }

    #[test]
    fn sweep_points_cover_the_grid() {
        let records = dataset();
        let out = run_sweep(&records, 0.5, 0.9, 5, 0.75).unwrap();
        let weights: Vec<f64> = out.points.iter().map(|p| p.weight).collect();
        assert!((weights[0] - 0.5).abs() < 1e-12);
        assert!((weights[4] - 0.9).abs() < 1e-12);
        assert!(out.best < out.points.len());
        for p in &out.points {
            assert!((0.0..=1.0).contains(&p.auc));
        }
    }

    #[test]
    fn empty_dataset_is_rejected() {
        assert_eq!(run_sweep(&[], 0.5, 0.9, 5, 0.75).unwrap_err().exit_code(), 3);
    }
}
