//! Baseline comparison: does BCI add skill over spread alone?
//!
//! High-error forecasts (top quartile by default) are treated as the event of
//! interest. We fit logistic detectors on four feature sets and compare their
//! AUC:
//!
//! - spread only (the operational baseline)
//! - BCI only
//! - spread + BCI, z-scored ("equal" weighting)
//! - spread + BCI, learned weights
//!
//! AUC is computed in-sample: the point is a like-for-like comparison of the
//! feature sets, not an out-of-sample skill estimate.

use crate::error::AppError;
use crate::math::{fit_logistic, zscore};
use crate::validate::roc::{auc, high_error_labels};

/// One fitted detector and its AUC.
#[derive(Debug, Clone)]
pub struct ModelAuc {
    pub label: String,
    pub auc: f64,
    /// Slope coefficients (intercept omitted), where informative for the report.
    pub coefficients: Option<Vec<f64>>,
}

/// The full baseline table.
#[derive(Debug, Clone)]
pub struct BaselineComparison {
    /// Error threshold defining a high-error event.
    pub threshold: f64,
    /// Number of high-error events.
    pub n_high: usize,
    pub n: usize,
    pub models: Vec<ModelAuc>,
}

/// Fit the four detectors and collect their AUCs.
pub fn compare_baselines(
    spread: &[f64],
    bci: &[f64],
    errors: &[f64],
    high_error_quantile: f64,
) -> Result<BaselineComparison, AppError> {
    if spread.len() != bci.len() || spread.len() != errors.len() {
        return Err(AppError::new(4, "Baseline inputs must have equal lengths."));
    }

    let (threshold, labels) = high_error_labels(errors, high_error_quantile)?;
    let n_high = labels.iter().filter(|&&l| l == 1).count();
    if n_high == 0 || n_high == labels.len() {
        return Err(AppError::new(
            3,
            format!(
                "High-error labeling at quantile {high_error_quantile} produced a single class \
                 ({n_high} of {} events); the error series has too little variation.",
                labels.len()
            ),
        ));
    }

    let mut models = Vec::with_capacity(4);

    models.push(fit_and_score("spread only", &[spread], &labels, false)?);
    models.push(fit_and_score("BCI only", &[bci], &labels, false)?);

    let spread_z = zscore(spread);
    let bci_z = zscore(bci);
    models.push(fit_and_score(
        "spread + BCI (equal)",
        &[&spread_z, &bci_z],
        &labels,
        false,
    )?);
    models.push(fit_and_score(
        "spread + BCI (learned)",
        &[spread, bci],
        &labels,
        true,
    )?);

    Ok(BaselineComparison {
        threshold,
        n_high,
        n: labels.len(),
        models,
    })
}

fn fit_and_score(
    label: &str,
    columns: &[&[f64]],
    labels: &[u8],
    keep_coefficients: bool,
) -> Result<ModelAuc, AppError> {
    let model = fit_logistic(columns, labels)?;
    let probs = model.predict_all(columns);
    Ok(ModelAuc {
        label: label.to_string(),
        auc: auc(&probs, labels),
        coefficients: keep_coefficients.then(|| model.coefficients[1..].to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Spread tracks error weakly, BCI (inverted) tracks it strongly.
    fn fixture() -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let n = 40;
        let errors: Vec<f64> = (0..n).map(|i| 0.2 + 0.1 * i as f64).collect();
        let spread: Vec<f64> = (0..n)
            .map(|i| 0.5 + 0.02 * i as f64 + ((i as f64) * 1.3).sin() * 0.4)
            .collect();
        let bci: Vec<f64> = errors.iter().map(|e| (1.0 - 0.15 * e).clamp(0.3, 1.0)).collect();
        (spread, bci, errors)
    }

    #[test]
    fn all_four_models_are_reported_in_order() {
        let (spread, bci, errors) = fixture();
        let cmp = compare_baselines(&spread, &bci, &errors, 0.75).unwrap();

        let labels: Vec<&str> = cmp.models.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "spread only",
                "BCI only",
                "spread + BCI (equal)",
                "spread + BCI (learned)"
            ]
        );
        for m in &cmp.models {
            assert!((0.0..=1.0).contains(&m.auc), "{} AUC {}", m.label, m.auc);
        }
        // Roughly a quarter of events are high-error.
        assert_eq!(cmp.n, 40);
        assert!(cmp.n_high >= 8 && cmp.n_high <= 12);
    }

    #[test]
    fn informative_feature_beats_chance() {
        let (spread, bci, errors) = fixture();
        let cmp = compare_baselines(&spread, &bci, &errors, 0.75).unwrap();

        // BCI is constructed to separate high errors cleanly here.
        let bci_only = &cmp.models[1];
        assert!(bci_only.auc > 0.9, "AUC was {}", bci_only.auc);
    }

    #[test]
    fn learned_model_exposes_coefficients() {
        let (spread, bci, errors) = fixture();
        let cmp = compare_baselines(&spread, &bci, &errors, 0.75).unwrap();

        let learned = &cmp.models[3];
        let coefs = learned.coefficients.as_ref().unwrap();
        assert_eq!(coefs.len(), 2);
        // High BCI should predict *low* error here.
        assert!(coefs[1] < 0.0);
    }

    #[test]
    fn flat_errors_are_rejected() {
        let spread = vec![1.0; 8];
        let bci = vec![0.5; 8];
        let errors = vec![2.0; 8];
        let err = compare_baselines(&spread, &bci, &errors, 0.75).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
