//! PNG chart export.
//!
//! Charts are rendered with the bitmap backend only. We deliberately skip the
//! font stack (no `ttf`/`ab_glyph` features), so charts carry no text: axes
//! and mesh lines give the shape, the CSV/JSON outputs carry the numbers.
//! This keeps the build free of native font dependencies.

use std::path::Path;

use plotters::prelude::*;

use crate::domain::ScoredRecord;
use crate::error::AppError;

const SCATTER_POINT: RGBColor = RGBColor(70, 130, 180);
const SCATTER_HIGH: RGBColor = RGBColor(220, 50, 47);
const THRESHOLD_LINE: RGBColor = RGBColor(120, 120, 120);
const CURVE_PALETTE: [RGBColor; 4] = [
    RGBColor(38, 139, 210),
    RGBColor(220, 50, 47),
    RGBColor(133, 153, 0),
    RGBColor(108, 113, 196),
];

/// Scatter of BCI against forecast error, high-error events highlighted.
pub fn render_bci_error_scatter(
    path: &Path,
    records: &[ScoredRecord],
    threshold: f64,
    width: u32,
    height: u32,
) -> Result<(), AppError> {
    if records.is_empty() {
        return Err(AppError::new(3, "No scored records to plot."));
    }

    let errors: Vec<f64> = records.iter().map(|r| r.score.mean_error).collect();
    let (y0, y1) = padded_bounds(&errors)?;

    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(0.25..1.05, y0..y1)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .light_line_style(RGBColor(235, 235, 235))
        .bold_line_style(RGBColor(210, 210, 210))
        .axis_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(
            records
                .iter()
                .filter(|r| r.score.mean_error <= threshold)
                .map(|r| Circle::new((r.score.bci, r.score.mean_error), 3, SCATTER_POINT.filled())),
        )
        .map_err(plot_err)?;
    chart
        .draw_series(
            records
                .iter()
                .filter(|r| r.score.mean_error > threshold)
                .map(|r| Circle::new((r.score.bci, r.score.mean_error), 4, SCATTER_HIGH.filled())),
        )
        .map_err(plot_err)?;

    // High-error threshold as a horizontal reference line.
    chart
        .draw_series(LineSeries::new(
            [(0.25, threshold), (1.05, threshold)],
            THRESHOLD_LINE.stroke_width(1),
        ))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// One or more ROC curves plus the chance diagonal.
///
/// `curves` pairs a label with its `(fpr, tpr)` points; the label only picks
/// the palette slot since charts carry no text.
pub fn render_roc_curves(
    path: &Path,
    curves: &[(String, Vec<(f64, f64)>)],
    width: u32,
    height: u32,
) -> Result<(), AppError> {
    if curves.is_empty() {
        return Err(AppError::new(3, "No ROC curves to plot."));
    }

    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(0.0..1.0, 0.0..1.0)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .light_line_style(RGBColor(235, 235, 235))
        .bold_line_style(RGBColor(210, 210, 210))
        .axis_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    // Chance diagonal.
    chart
        .draw_series(LineSeries::new(
            [(0.0, 0.0), (1.0, 1.0)],
            THRESHOLD_LINE.stroke_width(1),
        ))
        .map_err(plot_err)?;

    for (i, (_, points)) in curves.iter().enumerate() {
        let color = CURVE_PALETTE[i % CURVE_PALETTE.len()];
        chart
            .draw_series(LineSeries::new(
                points.iter().copied(),
                color.stroke_width(2),
            ))
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    Ok(())
}

fn padded_bounds(values: &[f64]) -> Result<(f64, f64), AppError> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return Err(AppError::new(4, "Non-finite values in plot series."));
    }
    let pad = ((max - min) * 0.05).max(0.1);
    Ok((min - pad, max + pad))
}

fn plot_err<E: std::fmt::Display>(e: E) -> AppError {
    AppError::new(2, format!("Chart rendering failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_bounds_never_collapse() {
        let (lo, hi) = padded_bounds(&[2.0, 2.0, 2.0]).unwrap();
        assert!(hi > lo);
        assert!(lo < 2.0 && hi > 2.0);
    }

    #[test]
    fn padded_bounds_reject_nan() {
        assert!(padded_bounds(&[1.0, f64::NAN]).is_err());
    }
}
