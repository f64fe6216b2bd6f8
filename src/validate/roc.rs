//! ROC curves and AUC for high-error detection.
//!
//! High-error events are labeled by thresholding the forecast error at a
//! quantile (top 25% by default). AUC is computed by trapezoidal integration
//! over the ROC curve, with tied scores grouped so the result matches the
//! usual rank-statistic definition.

use crate::error::AppError;
use crate::math::quantile;

/// Label errors above the `q` quantile as high-error events.
///
/// Returns the threshold and the 0/1 labels.
pub fn high_error_labels(errors: &[f64], q: f64) -> Result<(f64, Vec<u8>), AppError> {
    let threshold = quantile(errors, q)
        .ok_or_else(|| AppError::new(3, "Cannot threshold an empty error series."))?;
    let labels = errors.iter().map(|&e| u8::from(e > threshold)).collect();
    Ok((threshold, labels))
}

/// ROC curve as `(false positive rate, true positive rate)` points.
///
/// The curve starts at `(0, 0)`, ends at `(1, 1)`, and adds one point per
/// distinct score value (descending). Degenerate label sets (all positive or
/// all negative) produce just the diagonal endpoints.
pub fn roc_curve(scores: &[f64], labels: &[u8]) -> Vec<(f64, f64)> {
    let total_pos = labels.iter().filter(|&&l| l == 1).count();
    let total_neg = labels.len() - total_pos;
    if total_pos == 0 || total_neg == 0 {
        return vec![(0.0, 0.0), (1.0, 1.0)];
    }

    // Sort by score descending; group ties so they move the curve diagonally.
    let mut sorted: Vec<(f64, u8)> = scores.iter().copied().zip(labels.iter().copied()).collect();
    sorted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut points = vec![(0.0, 0.0)];
    let mut tp = 0usize;
    let mut fp = 0usize;

    let mut i = 0usize;
    while i < sorted.len() {
        let current = sorted[i].0;
        while i < sorted.len() && sorted[i].0 == current {
            if sorted[i].1 == 1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push((fp as f64 / total_neg as f64, tp as f64 / total_pos as f64));
    }

    points
}

/// Area under the ROC curve via trapezoidal integration.
///
/// Single-class label sets return 0.5 (no discrimination is measurable).
pub fn auc(scores: &[f64], labels: &[u8]) -> f64 {
    let curve = roc_curve(scores, labels);
    let mut area = 0.0;
    for pair in curve.windows(2) {
        let (fpr0, tpr0) = pair[0];
        let (fpr1, tpr1) = pair[1];
        area += (fpr1 - fpr0) * (tpr1 + tpr0) / 2.0;
    }
    area
}
