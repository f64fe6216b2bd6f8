//! Synthetic storm ensemble generation.
//!
//! The generator produces a matched forecast/observation pair of CSV files in
//! the same layout the `compute` command ingests. Storms cycle through three
//! regimes so the scored output exercises the full BCI range:
//!
//! - coherent warm bias (all members above the observation)
//! - coherent cold bias (all members below)
//! - incoherent (members split around the observation, low phi)

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{ForecastRecord, SampleConfig};
use crate::error::AppError;
use crate::index::MIN_MEMBERS;

/// Named UK/Ireland storms of recent seasons.
pub const STORMS: [&str; 14] = [
    "eunice", "ciaran", "babet", "henk", "isha", "jocelyn", "arwen", "malik", "dudley",
    "franklin", "noa", "debi", "fergus", "gerrit",
];

/// Paths of the generated CSV pair.
#[derive(Debug, Clone)]
pub struct SamplePaths {
    pub forecasts: PathBuf,
    pub observations: PathBuf,
}

/// Generate a deterministic synthetic dataset.
pub fn generate_sample(config: &SampleConfig) -> Result<Vec<ForecastRecord>, AppError> {
    if config.n_storms == 0 || config.n_storms > STORMS.len() {
        return Err(AppError::new(
            2,
            format!("Storm count must be in 1..={}, got {}.", STORMS.len(), config.n_storms),
        ));
    }
    if config.timesteps_per_storm == 0 {
        return Err(AppError::new(2, "Timesteps per storm must be > 0."));
    }
    if config.n_members < MIN_MEMBERS {
        return Err(AppError::new(
            2,
            format!("Ensembles need at least {MIN_MEMBERS} members, got {}.", config.n_members),
        ));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let season_start = NaiveDate::from_ymd_opt(2023, 10, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| AppError::new(4, "Invalid season start date."))?;

    let mut records = Vec::with_capacity(config.n_storms * config.timesteps_per_storm);
    for (storm_idx, storm) in STORMS.iter().take(config.n_storms).enumerate() {
        // Each storm occupies its own window; 6-hourly verification times.
        let storm_start = season_start + Duration::days(14 * storm_idx as i64);
        let baseline = 4.0 + rng.gen_range(0.0..8.0);
        let regime = storm_idx % 3;
        let bias = match regime {
            0 => rng.gen_range(0.8..2.5),
            1 => -rng.gen_range(0.8..2.5),
            _ => 0.0,
        };
        let spread_level = rng.gen_range(0.4..1.8);

        for step in 0..config.timesteps_per_storm {
            let valid_time = storm_start + Duration::hours(6 * step as i64);
            // Slow synoptic swing across the storm's lifetime.
            let swing = 2.0 * (step as f64 * 0.35).sin();
            let observation = baseline + swing + 0.3 * noise.sample(&mut rng);

            let members =
                draw_members(&mut rng, &noise, config.n_members, observation, bias, spread_level, regime);

            records.push(ForecastRecord {
                storm: (*storm).to_string(),
                valid_time,
                station: None,
                lead_hours: Some(6.0 * (step as f64 + 1.0)),
                members,
                observation,
            });
        }
    }

    Ok(records)
}

fn draw_members(
    rng: &mut StdRng,
    noise: &Normal<f64>,
    n_members: usize,
    observation: f64,
    bias: f64,
    spread_level: f64,
    regime: usize,
) -> Vec<f64> {
    (0..n_members)
        .map(|m| {
            let offset = if regime == 2 {
                // Incoherent: alternate members warm and cold of the truth.
                let side = if m % 2 == 0 { 1.0 } else { -1.0 };
                side * (0.5 + spread_level)
            } else {
                bias
            };
            observation + offset + spread_level * noise.sample(rng)
        })
        .collect()
}

/// Write the forecast/observation CSV pair under `out_dir`.
pub fn write_sample_csvs(
    config: &SampleConfig,
    records: &[ForecastRecord],
) -> Result<SamplePaths, AppError> {
    fs::create_dir_all(&config.out_dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create output directory '{}': {e}", config.out_dir.display()),
        )
    })?;

    let forecasts = config.out_dir.join("ensemble_forecasts.csv");
    let observations = config.out_dir.join("matched_observations.csv");

    let mut fw = open_writer(&forecasts)?;
    writeln!(fw, "storm,valid_time,member,temperature").map_err(write_err)?;
    for r in records {
        for (m, value) in r.members.iter().enumerate() {
            writeln!(fw, "{},{},{},{:.3}", r.storm, fmt_time(r.valid_time), m, value)
                .map_err(write_err)?;
        }
    }
    fw.flush().map_err(write_err)?;

    let mut ow = open_writer(&observations)?;
    writeln!(ow, "storm,valid_time,lead_hours,obs_temperature").map_err(write_err)?;
    for r in records {
        let lead = r.lead_hours.unwrap_or(0.0);
        writeln!(
            ow,
            "{},{},{:.1},{:.3}",
            r.storm,
            fmt_time(r.valid_time),
            lead,
            r.observation
        )
        .map_err(write_err)?;
    }
    ow.flush().map_err(write_err)?;

    Ok(SamplePaths {
        forecasts,
        observations,
    })
}

fn open_writer(path: &std::path::Path) -> Result<BufWriter<File>, AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    Ok(BufWriter::new(file))
}

fn write_err(e: std::io::Error) -> AppError {
    AppError::new(2, format!("Failed to write sample CSV: {e}"))
}

fn fmt_time(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}
