//! Descriptive statistics and correlation tests.
//!
//! Conventions:
//! - Standard deviations are **population** standard deviations (divide by `n`),
//!   matching the numerics of the validation datasets this tool reproduces.
//! - Quantiles use linear interpolation between order statistics.
//! - Pearson p-values come from the two-sided Student-t test with `n - 2`
//!   degrees of freedom (via `statrs`).

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Pearson correlation with its two-sided p-value.
#[derive(Debug, Clone, Copy)]
pub struct Correlation {
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population variance (divide by `n`).
pub fn variance_pop(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64
}

/// Population standard deviation.
pub fn std_pop(xs: &[f64]) -> f64 {
    variance_pop(xs).sqrt()
}

/// Quantile with linear interpolation between closest ranks.
///
/// `q` is clamped to `[0, 1]`. Returns `None` for an empty slice.
pub fn quantile(xs: &[f64], q: f64) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] * (1.0 - frac) + sorted[hi] * frac)
}

/// Pearson correlation coefficient.
///
/// Returns `None` when either input is degenerate (fewer than 2 points,
/// mismatched lengths, or zero variance).
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x);
    let my = mean(y);

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mx;
        let dy = yi - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx <= 0.0 || vy <= 0.0 {
        return None;
    }
    let r = cov / (vx.sqrt() * vy.sqrt());
    // Floating error can push |r| a hair past 1.
    Some(r.clamp(-1.0, 1.0))
}

/// Pearson correlation with a two-sided significance test.
///
/// Requires at least 3 points (the t-test needs `n - 2 > 0`).
pub fn pearson_test(x: &[f64], y: &[f64]) -> Option<Correlation> {
    let n = x.len();
    if n < 3 {
        return None;
    }
    let r = pearson(x, y)?;
    let p_value = pearson_p_value(r, n)?;
    Some(Correlation { r, p_value, n })
}

fn pearson_p_value(r: f64, n: usize) -> Option<f64> {
    let df = (n - 2) as f64;
    let denom = 1.0 - r * r;
    if denom <= f64::EPSILON {
        // |r| = 1: the t statistic diverges.
        return Some(0.0);
    }
    let t = r * (df / denom).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

/// Z-score a series in place conventions: `(x - mean) / std`.
///
/// A zero-variance series maps to all zeros rather than NaN.
pub fn zscore(xs: &[f64]) -> Vec<f64> {
    let m = mean(xs);
    let s = std_pop(xs);
    if s <= 0.0 {
        return vec![0.0; xs.len()];
    }
    xs.iter().map(|x| (x - m) / s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std_basic() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&xs) - 5.0).abs() < 1e-12);
        // Known population std of this classic example is exactly 2.
        assert!((std_pop(&xs) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn quantile_interpolates() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&xs, 0.0).unwrap() - 1.0).abs() < 1e-12);
        assert!((quantile(&xs, 1.0).unwrap() - 4.0).abs() < 1e-12);
        assert!((quantile(&xs, 0.5).unwrap() - 2.5).abs() < 1e-12);
        assert!((quantile(&xs, 0.75).unwrap() - 3.25).abs() < 1e-12);
        assert!(quantile(&[], 0.5).is_none());
    }

    #[test]
    fn pearson_perfect_lines() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y_up: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
        let y_down: Vec<f64> = x.iter().map(|v| -2.0 * v + 7.0).collect();

        assert!((pearson(&x, &y_up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &y_down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_rejects_degenerate_inputs() {
        assert!(pearson(&[1.0], &[1.0]).is_none());
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn pearson_is_affine_invariant() {
        let x = [0.3, 1.7, 2.2, 4.8, 5.1, 6.9];
        let y = [2.0, 1.2, 3.4, 3.1, 5.6, 4.9];
        let y_scaled: Vec<f64> = y.iter().map(|v| 10.0 * v - 4.0).collect();

        let r1 = pearson(&x, &y).unwrap();
        let r2 = pearson(&x, &y_scaled).unwrap();
        assert!((r1 - r2).abs() < 1e-12);
    }

    #[test]
    fn pearson_test_strong_relationship_is_significant() {
        let x: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + (v * 0.7).sin()).collect();

        let corr = pearson_test(&x, &y).unwrap();
        assert!(corr.r > 0.99);
        assert!(corr.p_value < 1e-6);
    }

    #[test]
    fn pearson_test_noise_is_not_significant() {
        // Alternating series with no linear trend against an index.
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();

        let corr = pearson_test(&x, &y).unwrap();
        assert!(corr.r.abs() < 0.3);
        assert!(corr.p_value > 0.05);
    }

    #[test]
    fn zscore_handles_constant_series() {
        assert_eq!(zscore(&[5.0, 5.0, 5.0]), vec![0.0, 0.0, 0.0]);
        let z = zscore(&[1.0, 2.0, 3.0]);
        assert!(mean(&z).abs() < 1e-12);
        assert!((std_pop(&z) - 1.0).abs() < 1e-12);
    }
}
