//! Logistic regression via iteratively reweighted least squares (IRLS).
//!
//! The baseline comparison fits tiny logistic models (1–2 predictors plus an
//! intercept) to flag high-error forecasts. IRLS reduces each Newton step to a
//! weighted least-squares solve, which we delegate to the same SVD solver used
//! for residualization. The fit is deterministic: no random initialization,
//! fixed iteration cap, fixed convergence tolerance.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;
use crate::math::solve_least_squares;

const MAX_ITERATIONS: usize = 50;
const CONVERGENCE_TOL: f64 = 1e-8;

/// Linear predictor clamp. Beyond this the sigmoid is saturated to machine
/// precision and IRLS weights underflow.
const ETA_CLAMP: f64 = 30.0;

/// Floor for IRLS weights `μ(1-μ)` to keep the working response finite.
const WEIGHT_FLOOR: f64 = 1e-10;

/// A fitted logistic model. Coefficients are `[intercept, β1, β2, ...]`.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub converged: bool,
    pub iterations: usize,
}

impl LogisticModel {
    /// Predicted probability for one observation (`features` excludes the intercept).
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let mut eta = self.coefficients[0];
        for (beta, x) in self.coefficients[1..].iter().zip(features.iter()) {
            eta += beta * x;
        }
        sigmoid(eta.clamp(-ETA_CLAMP, ETA_CLAMP))
    }

    /// Predicted probabilities for every row of the given feature columns.
    pub fn predict_all(&self, columns: &[&[f64]]) -> Vec<f64> {
        let n = columns.first().map_or(0, |c| c.len());
        (0..n)
            .map(|i| {
                let row: Vec<f64> = columns.iter().map(|c| c[i]).collect();
                self.predict_proba(&row)
            })
            .collect()
    }
}

/// Fit a logistic model of `labels` on the given feature columns.
///
/// `columns` holds one slice per predictor, all of length `n`; the intercept
/// is added internally. Labels must contain both classes — a single-class fit
/// has no finite maximum likelihood estimate.
pub fn fit_logistic(columns: &[&[f64]], labels: &[u8]) -> Result<LogisticModel, AppError> {
    let n = labels.len();
    if n < 4 {
        return Err(AppError::new(3, "Too few observations for a logistic fit."));
    }
    for col in columns {
        if col.len() != n {
            return Err(AppError::new(
                4,
                "Feature column length does not match label count.",
            ));
        }
    }
    let n_pos = labels.iter().filter(|&&l| l == 1).count();
    if n_pos == 0 || n_pos == n {
        return Err(AppError::new(
            3,
            "Labels contain a single class; logistic fit is undefined.",
        ));
    }

    let p = columns.len() + 1;
    let mut design = DMatrix::zeros(n, p);
    for i in 0..n {
        design[(i, 0)] = 1.0;
        for (j, col) in columns.iter().enumerate() {
            design[(i, j + 1)] = col[i];
        }
    }

    let y: Vec<f64> = labels.iter().map(|&l| f64::from(l)).collect();
    let mut beta = DVector::zeros(p);
    let mut converged = false;
    let mut iterations = 0;

    for iter in 0..MAX_ITERATIONS {
        iterations = iter + 1;

        // Working response and weights for the current beta.
        let mut xw = DMatrix::zeros(n, p);
        let mut zw = DVector::zeros(n);
        for i in 0..n {
            let mut eta: f64 = 0.0;
            for j in 0..p {
                eta += design[(i, j)] * beta[j];
            }
            let eta = eta.clamp(-ETA_CLAMP, ETA_CLAMP);
            let mu = sigmoid(eta);
            let w = (mu * (1.0 - mu)).max(WEIGHT_FLOOR);
            let z = eta + (y[i] - mu) / w;

            let sw = w.sqrt();
            for j in 0..p {
                xw[(i, j)] = design[(i, j)] * sw;
            }
            zw[i] = z * sw;
        }

        let next = solve_least_squares(&xw, &zw).ok_or_else(|| {
            AppError::new(4, "Logistic IRLS step failed: singular weighted design.")
        })?;

        let delta = (&next - &beta).amax();
        beta = next;
        if delta < CONVERGENCE_TOL {
            converged = true;
            break;
        }
    }

    Ok(LogisticModel {
        coefficients: beta.iter().copied().collect(),
        converged,
        iterations,
    })
}

/// Standard sigmoid `1 / (1 + exp(-x))`, computed without overflow for
/// large-magnitude inputs.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        let e = (-x).exp();
        1.0 / (1.0 + e)
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_basics() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!((sigmoid(100.0) - 1.0).abs() < 1e-12);
        assert!(sigmoid(-100.0) < 1e-12);
        // Symmetry: sigmoid(x) + sigmoid(-x) = 1.
        let x = 2.5;
        assert!((sigmoid(x) + sigmoid(-x) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn intercept_only_fit_matches_base_rate() {
        // With no predictors the MLE intercept is logit(mean(y)).
        let labels = [1u8, 0, 0, 0, 1, 0, 0, 0];
        let model = fit_logistic(&[], &labels).unwrap();
        assert!(model.converged);

        let p = model.predict_proba(&[]);
        assert!((p - 0.25).abs() < 1e-6, "base rate was {p}");
    }

    #[test]
    fn probabilities_increase_with_a_positive_predictor() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 / 10.0).collect();
        let labels: Vec<u8> = (0..20).map(|i| u8::from(i >= 8)).collect();

        let model = fit_logistic(&[&x], &labels).unwrap();
        assert!(model.coefficients[1] > 0.0);

        let p_low = model.predict_proba(&[0.1]);
        let p_high = model.predict_proba(&[1.8]);
        assert!(p_high > p_low);
        assert!(p_low < 0.5);
        assert!(p_high > 0.5);
    }

    #[test]
    fn single_class_labels_are_rejected() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let err = fit_logistic(&[&x], &[1, 1, 1, 1, 1]).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn mismatched_column_length_is_rejected() {
        let x = [1.0, 2.0];
        let err = fit_logistic(&[&x], &[0, 1, 0, 1]).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
