//! Mathematical utilities: descriptive statistics, least squares, and logistic fits.

pub mod logit;
pub mod ols;
pub mod stats;

pub use logit::*;
pub use ols::*;
pub use stats::*;
