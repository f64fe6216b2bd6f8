//! `ensemble-bci` library crate.
//!
//! The binary (`bci`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., future batch runners, notebooks, etc.)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod index;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod sweep;
pub mod validate;
