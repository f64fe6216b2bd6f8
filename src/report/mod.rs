//! Reporting utilities: series summaries and formatted terminal output.

pub mod format;

pub use format::*;

use serde::Serialize;

use crate::math::{mean, std_pop};

/// Mean/std/min/max of one score series.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Summarize a series. Empty input yields NaNs, which serialize as null.
pub fn summarize(xs: &[f64]) -> SummaryStats {
    if xs.is_empty() {
        return SummaryStats {
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        };
    }
    SummaryStats {
        mean: mean(xs),
        std: std_pop(xs),
        min: xs.iter().copied().fold(f64::INFINITY, f64::min),
        max: xs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}
