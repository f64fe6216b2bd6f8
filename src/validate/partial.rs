//! Linear-residual partial correlation.
//!
//! To test whether BCI carries information about forecast error beyond what
//! ensemble spread already explains, we residualize both BCI and error
//! against spread with a straight-line OLS fit and correlate the residuals.
//! This is the standard first-order partial correlation and is invariant to
//! affine rescaling of either variable.

use crate::error::AppError;
use crate::math::{Correlation, fit_line, pearson_test};

/// Partial correlation of `x` and `y` controlling for `control`.
pub fn partial_correlation(x: &[f64], y: &[f64], control: &[f64]) -> Result<Correlation, AppError> {
    if x.len() != y.len() || x.len() != control.len() {
        return Err(AppError::new(
            4,
            "Partial correlation inputs must have equal lengths.",
        ));
    }
    if x.len() < 4 {
        return Err(AppError::new(
            3,
            format!("Partial correlation needs at least 4 points, got {}.", x.len()),
        ));
    }

    let x_resid = residualize(x, control)?;
    let y_resid = residualize(y, control)?;

    pearson_test(&x_resid, &y_resid).ok_or_else(|| {
        AppError::new(
            4,
            "Partial correlation is undefined: residuals have zero variance.",
        )
    })
}

/// Residuals of `y` after removing the best straight-line fit on `control`.
pub fn residualize(y: &[f64], control: &[f64]) -> Result<Vec<f64>, AppError> {
    let (a, b) = fit_line(control, y)
        .ok_or_else(|| AppError::new(4, "Residualization failed: degenerate control variable."))?;
    Ok(y.iter()
        .zip(control.iter())
        .map(|(&yi, &ci)| yi - (a + b * ci))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Deterministic wiggle with no linear trend.
    fn noise(i: usize) -> f64 {
        ((i as f64) * 2.399).sin()
    }

    #[test]
    fn residuals_are_orthogonal_to_the_control() {
        let control: Vec<f64> = (0..40).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = control.iter().enumerate().map(|(i, c)| 3.0 * c + noise(i)).collect();

        let resid = residualize(&y, &control).unwrap();
        let dot: f64 = resid.iter().zip(control.iter()).map(|(r, c)| r * c).sum();
        assert!(dot.abs() < 1e-6, "residual/control dot product was {dot}");
    }

    #[test]
    fn shared_control_signal_is_removed() {
        // x and y both driven by the control plus *independent* wiggles:
        // the raw correlation is high, the partial correlation is not.
        let control: Vec<f64> = (0..60).map(|i| i as f64 * 0.25).collect();
        let x: Vec<f64> = control.iter().enumerate().map(|(i, c)| 2.0 * c + noise(i)).collect();
        let y: Vec<f64> = control
            .iter()
            .enumerate()
            .map(|(i, c)| -1.5 * c + noise(i * 7 + 3))
            .collect();

        let raw = pearson_test(&x, &y).unwrap();
        let partial = partial_correlation(&x, &y, &control).unwrap();
        assert!(raw.r.abs() > 0.9);
        assert!(partial.r.abs() < 0.35, "partial r was {}", partial.r);
    }

    #[test]
    fn direct_relationship_survives_the_control() {
        // y depends on x beyond the shared control.
        let control: Vec<f64> = (0..50).map(|i| (i as f64 * 0.7).cos()).collect();
        let x: Vec<f64> = control.iter().enumerate().map(|(i, c)| c + noise(i)).collect();
        let y: Vec<f64> = x.iter().zip(control.iter()).map(|(xi, ci)| 2.0 * xi + ci).collect();

        let partial = partial_correlation(&x, &y, &control).unwrap();
        assert!(partial.r > 0.99, "partial r was {}", partial.r);
        assert!(partial.p_value < 1e-6);
    }

    #[test]
    fn partial_correlation_is_affine_invariant_in_the_error() {
        let control: Vec<f64> = (0..30).map(|i| i as f64 * 0.3).collect();
        let x: Vec<f64> = control.iter().enumerate().map(|(i, c)| c * 0.5 + noise(i)).collect();
        let y: Vec<f64> = control
            .iter()
            .enumerate()
            .map(|(i, c)| c - 0.4 * noise(i) + noise(i + 11))
            .collect();
        let y_scaled: Vec<f64> = y.iter().map(|v| 100.0 * v + 42.0).collect();

        let p1 = partial_correlation(&x, &y, &control).unwrap();
        let p2 = partial_correlation(&x, &y_scaled, &control).unwrap();
        assert!((p1.r - p2.r).abs() < 1e-9);
        assert!((p1.p_value - p2.p_value).abs() < 1e-9);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = partial_correlation(&[1.0, 2.0], &[1.0, 2.0], &[1.0]).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
