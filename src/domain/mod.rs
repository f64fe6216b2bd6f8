//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - normalized forecast records (`ForecastRecord`) and scored records
//! - run configurations derived from CLI flags
//! - dataset accounting (`DatasetStats`, `RowError`)

pub mod types;

pub use types::*;
