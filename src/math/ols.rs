//! Least squares solver.
//!
//! In this project we repeatedly solve small linear regression problems:
//!
//! - residualizing BCI and forecast error against ensemble spread for the
//!   partial correlation
//! - the inner weighted step of the IRLS logistic fit used by the baseline
//!   comparison
//!
//! Implementation choices:
//! - Weighted problems are reduced to OLS by scaling rows with `sqrt(w_i)`.
//! - We use SVD to solve the least-squares problem robustly even when the
//!   design matrix is tall (thousands of timesteps, 2–3 columns).
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Because our parameter dimension is tiny, SVD performance is acceptable
//!   for batch validation runs.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    // SVD solve with a relaxed tolerance to handle near-singular matrices.
    // Spread and BCI can be nearly collinear on small storm subsets, so we use
    // a tolerance that balances numerical stability with solution acceptance.
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y = a + b·x` and return `(a, b)`.
///
/// Returns `None` when the inputs are empty, mismatched, or degenerate
/// (e.g. a constant `x` column that SVD cannot separate from the intercept).
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len();
    let mut design = DMatrix::zeros(n, 2);
    for (i, &xi) in x.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = xi;
    }
    let rhs = DVector::from_column_slice(y);

    let beta = solve_least_squares(&design, &rhs)?;
    Some((beta[0], beta[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_recovers_exact_coefficients() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y: Vec<f64> = x.iter().map(|v| 1.5 - 0.5 * v).collect();

        let (a, b) = fit_line(&x, &y).unwrap();
        assert!((a - 1.5).abs() < 1e-10);
        assert!((b + 0.5).abs() < 1e-10);
    }

    #[test]
    fn fit_line_rejects_mismatched_inputs() {
        assert!(fit_line(&[1.0, 2.0], &[1.0]).is_none());
        assert!(fit_line(&[], &[]).is_none());
    }
}
