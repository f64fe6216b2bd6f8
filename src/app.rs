//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - ingests forecast/observation CSVs
//! - scores ensembles and runs validation
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, ComputeArgs, PlotArgs, SampleArgs, SweepArgs, ValidateArgs};
use crate::domain::{ComputeConfig, PlotConfig, SampleConfig, SweepConfig, ValidateConfig};
use crate::error::AppError;
use crate::index::BciWeights;

pub mod pipeline;

const ROW_ERROR_LIMIT: usize = 10;

/// Entry point for the `bci` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Compute(args) => handle_compute(compute_config_from_args(&args)?),
        Command::Validate(args) => handle_validate(validate_config_from_args(&args)),
        Command::Sweep(args) => handle_sweep(sweep_config_from_args(&args)),
        Command::Plot(args) => handle_plot(plot_config_from_args(&args)),
        Command::Sample(args) => handle_sample(sample_config_from_args(&args)),
    }
}

fn handle_compute(config: ComputeConfig) -> Result<(), AppError> {
    let run = pipeline::run_scoring(&config.forecasts, &config.observations, config.weights)?;

    warn_row_errors(&run.ingest.row_errors);

    println!(
        "{}",
        crate::report::format_compute_summary(&run.ingest, &run.scored, config.weights)
    );

    if let Some(path) = &config.out {
        crate::io::export::write_scores_csv(path, &run.scored)?;
        println!("Wrote {} scored rows to {}", run.scored.len(), path.display());
    }

    Ok(())
}

fn handle_validate(config: ValidateConfig) -> Result<(), AppError> {
    let scores = crate::io::ingest::read_scores_csv(&config.scores)?;
    warn_row_errors(&scores.row_errors);

    let validation = crate::validate::run_validation(&scores.records, config.high_error_quantile)?;
    println!("{}", crate::report::format_validation_report(&validation));

    if let Some(path) = &config.export_baseline {
        crate::io::export::write_baseline_csv(path, &validation.baseline)?;
    }
    if let Some(path) = &config.summary_json {
        let summary = crate::io::summary::build_run_summary(&scores.records, &validation);
        crate::io::summary::write_summary_json(path, &summary)?;
    }

    Ok(())
}

fn handle_sweep(config: SweepConfig) -> Result<(), AppError> {
    let ingest = crate::io::ingest::load_forecast_records(&config.forecasts, &config.observations)?;
    warn_row_errors(&ingest.row_errors);

    let sweep = crate::sweep::run_sweep(
        &ingest.records,
        config.weight_min,
        config.weight_max,
        config.steps,
        config.high_error_quantile,
    )?;
    println!("{}", crate::report::format_sweep_table(&sweep));

    if let Some(path) = &config.export {
        crate::io::export::write_sweep_csv(path, &sweep.points)?;
    }

    Ok(())
}

fn handle_plot(config: PlotConfig) -> Result<(), AppError> {
    let scores = crate::io::ingest::read_scores_csv(&config.scores)?;
    warn_row_errors(&scores.row_errors);

    std::fs::create_dir_all(&config.out_dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create plot directory '{}': {e}", config.out_dir.display()),
        )
    })?;

    let spread: Vec<f64> = scores.records.iter().map(|r| r.score.spread).collect();
    let bci: Vec<f64> = scores.records.iter().map(|r| r.score.bci).collect();
    let errors: Vec<f64> = scores.records.iter().map(|r| r.score.mean_error).collect();
    let (threshold, labels) =
        crate::validate::high_error_labels(&errors, config.high_error_quantile)?;

    let scatter = config.out_dir.join("bci_vs_error.png");
    crate::plot::render_bci_error_scatter(
        &scatter,
        &scores.records,
        threshold,
        config.width,
        config.height,
    )?;

    // Low BCI should flag high errors, so the detector score is the negated index.
    let bci_inverted: Vec<f64> = bci.iter().map(|b| -b).collect();
    let curves = vec![
        ("spread".to_string(), crate::validate::roc_curve(&spread, &labels)),
        ("bci_inverted".to_string(), crate::validate::roc_curve(&bci_inverted, &labels)),
    ];
    let roc = config.out_dir.join("roc_curves.png");
    crate::plot::render_roc_curves(&roc, &curves, config.width, config.height)?;

    println!("Wrote {}", scatter.display());
    println!("Wrote {}", roc.display());
    Ok(())
}

fn handle_sample(config: SampleConfig) -> Result<(), AppError> {
    let records = crate::data::generate_sample(&config)?;
    let paths = crate::data::write_sample_csvs(&config, &records)?;

    println!(
        "Generated {} forecasts across {} storms ({} members each)",
        records.len(),
        config.n_storms,
        config.n_members
    );
    println!("Wrote {}", paths.forecasts.display());
    println!("Wrote {}", paths.observations.display());
    Ok(())
}

fn compute_config_from_args(args: &ComputeArgs) -> Result<ComputeConfig, AppError> {
    Ok(ComputeConfig {
        forecasts: args.forecasts.clone(),
        observations: args.observations.clone(),
        out: args.out.clone(),
        weights: BciWeights::new(args.weight)?,
    })
}

fn validate_config_from_args(args: &ValidateArgs) -> ValidateConfig {
    ValidateConfig {
        scores: args.scores.clone(),
        high_error_quantile: args.quantile,
        export_baseline: args.export_baseline.clone(),
        summary_json: args.summary_json.clone(),
    }
}

fn sweep_config_from_args(args: &SweepArgs) -> SweepConfig {
    SweepConfig {
        forecasts: args.forecasts.clone(),
        observations: args.observations.clone(),
        weight_min: args.weight_min,
        weight_max: args.weight_max,
        steps: args.steps,
        high_error_quantile: args.quantile,
        export: args.export.clone(),
    }
}

fn plot_config_from_args(args: &PlotArgs) -> PlotConfig {
    PlotConfig {
        scores: args.scores.clone(),
        out_dir: args.out_dir.clone(),
        high_error_quantile: args.quantile,
        width: args.width,
        height: args.height,
    }
}

fn sample_config_from_args(args: &SampleArgs) -> SampleConfig {
    SampleConfig {
        out_dir: args.out_dir.clone(),
        seed: args.seed,
        n_storms: args.storms,
        timesteps_per_storm: args.timesteps,
        n_members: args.members,
    }
}

fn warn_row_errors(errors: &[crate::domain::RowError]) {
    if !errors.is_empty() {
        eprint!("{}", crate::report::format_row_errors(errors, ROW_ERROR_LIMIT));
    }
}
