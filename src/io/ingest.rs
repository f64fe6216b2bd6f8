//! CSV ingest and normalization.
//!
//! This module turns the two raw input CSVs (per-member ensemble forecasts and
//! matched observations) into clean `ForecastRecord`s that are safe to score,
//! and reads back previously computed score CSVs for validation/plotting.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (records keep observation-file order)
//! - **Separation of concerns**: no scoring logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::domain::{DatasetStats, ForecastRecord, RowError, ScoredRecord};
use crate::error::AppError;
use crate::index::{BciScore, MIN_MEMBERS};

/// Ingest output: joined forecast records + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub records: Vec<ForecastRecord>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Observation rows dropped because fewer than `MIN_MEMBERS` ensemble
    /// members matched on `(storm, valid_time)`.
    pub skipped_small_ensembles: usize,
}

/// Scores CSV read back for validation or plotting.
#[derive(Debug, Clone)]
pub struct ScoresFile {
    pub records: Vec<ScoredRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load and join the ensemble-member CSV and the matched-observation CSV.
pub fn load_forecast_records(
    forecasts: &Path,
    observations: &Path,
) -> Result<IngestedData, AppError> {
    let members_file = open_csv(forecasts, "ensemble forecasts")?;
    let (members, mut row_errors, member_rows) = read_members_from_reader(members_file)?;

    let obs_file = open_csv(observations, "matched observations")?;
    read_observations_and_join(obs_file, &members, &mut row_errors, member_rows)
}

/// Read a scores CSV previously written by `bci compute`.
pub fn read_scores_csv(path: &Path) -> Result<ScoresFile, AppError> {
    let file = open_csv(path, "scores")?;
    read_scores_from_reader(file)
}

fn open_csv(path: &Path, what: &str) -> Result<csv::Reader<File>, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open {what} CSV '{}': {e}", path.display()))
    })?;
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

/// One member forecast per row, keyed by `(storm, valid_time)`.
///
/// Required columns: `storm`, `valid_time`, `temperature`.
pub fn read_members_from_reader<R: Read>(
    mut reader: csv::Reader<R>,
) -> Result<(HashMap<(String, NaiveDateTime), Vec<f64>>, Vec<RowError>, usize), AppError> {
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read forecast CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for required in ["storm", "valid_time", "temperature"] {
        if !header_map.contains_key(required) {
            return Err(AppError::new(
                2,
                format!("Forecast CSV is missing required column: `{required}`"),
            ));
        }
    }

    let mut members: HashMap<(String, NaiveDateTime), Vec<f64>> = HashMap::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because records() starts after the header and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_member_row(&record, &header_map) {
            Ok((storm, valid_time, temperature)) => {
                members.entry((storm, valid_time)).or_default().push(temperature);
            }
            Err(message) => row_errors.push(RowError {
                line,
                id: None,
                message,
            }),
        }
    }

    Ok((members, row_errors, rows_read))
}

/// Observation rows joined against the member map, preserving file order.
///
/// Required columns: `storm`, `valid_time`, `obs_temperature`.
/// Optional: `station`, `lead_hours`.
fn read_observations_and_join<R: Read>(
    mut reader: csv::Reader<R>,
    members: &HashMap<(String, NaiveDateTime), Vec<f64>>,
    row_errors: &mut Vec<RowError>,
    member_rows: usize,
) -> Result<IngestedData, AppError> {
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read observation CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for required in ["storm", "valid_time", "obs_temperature"] {
        if !header_map.contains_key(required) {
            return Err(AppError::new(
                2,
                format!("Observation CSV is missing required column: `{required}`"),
            ));
        }
    }

    let mut records = Vec::new();
    let mut rows_read = 0usize;
    let mut skipped_small = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let parsed = match parse_observation_row(&record, &header_map) {
            Ok(row) => row,
            Err(message) => {
                row_errors.push(RowError {
                    line,
                    id: None,
                    message,
                });
                continue;
            }
        };

        let key = (parsed.storm.clone(), parsed.valid_time);
        let Some(ensemble) = members.get(&key) else {
            skipped_small += 1;
            continue;
        };
        if ensemble.len() < MIN_MEMBERS {
            skipped_small += 1;
            continue;
        }

        records.push(ForecastRecord {
            storm: parsed.storm,
            valid_time: parsed.valid_time,
            station: parsed.station,
            lead_hours: parsed.lead_hours,
            members: ensemble.clone(),
            observation: parsed.obs_temperature,
        });
    }

    let rows_used = records.len();
    let stats = dataset_stats(
        records
            .iter()
            .map(|r| (r.storm.as_str(), r.valid_time, r.observation)),
    )
    .ok_or_else(|| {
        AppError::new(
            3,
            format!(
                "No usable forecast records remain after joining ({member_rows} member rows, \
                 {rows_read} observation rows, {} row errors).",
                row_errors.len()
            ),
        )
    })?;

    Ok(IngestedData {
        records,
        stats,
        row_errors: std::mem::take(row_errors),
        rows_read,
        rows_used,
        skipped_small_ensembles: skipped_small,
    })
}

pub fn read_scores_from_reader<R: Read>(mut reader: csv::Reader<R>) -> Result<ScoresFile, AppError> {
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read scores CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for required in [
        "storm",
        "valid_time",
        "obs_temperature",
        "model_mean",
        "model_std",
        "rmse",
        "mean_error",
        "mean_bias",
        "bias_cv",
        "directional_agreement",
        "magnitude_consistency",
        "phi",
        "rho",
        "bci",
        "n_members",
    ] {
        if !header_map.contains_key(required) {
            return Err(AppError::new(
                2,
                format!("Scores CSV is missing required column: `{required}`"),
            ));
        }
    }

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_score_row(&record, &header_map) {
            Ok(scored) => records.push(scored),
            Err(message) => row_errors.push(RowError {
                line,
                id: None,
                message,
            }),
        }
    }

    if records.is_empty() {
        return Err(AppError::new(
            3,
            format!("Scores CSV contains no usable rows ({rows_read} read, {} errors).", row_errors.len()),
        ));
    }

    Ok(ScoresFile {
        records,
        row_errors,
        rows_read,
    })
}

/// Dataset stats over `(storm, valid_time, observation)` triples.
pub fn dataset_stats<'a>(
    items: impl Iterator<Item = (&'a str, NaiveDateTime, f64)>,
) -> Option<DatasetStats> {
    let mut n_records = 0usize;
    let mut storms = std::collections::HashSet::new();
    let mut time_min: Option<NaiveDateTime> = None;
    let mut time_max: Option<NaiveDateTime> = None;
    let mut obs_min = f64::INFINITY;
    let mut obs_max = f64::NEG_INFINITY;

    for (storm, time, obs) in items {
        n_records += 1;
        storms.insert(storm.to_string());
        time_min = Some(time_min.map_or(time, |t| t.min(time)));
        time_max = Some(time_max.map_or(time, |t| t.max(time)));
        obs_min = obs_min.min(obs);
        obs_max = obs_max.max(obs);
    }

    if n_records == 0 {
        return None;
    }

    Some(DatasetStats {
        n_records,
        n_storms: storms.len(),
        time_min: time_min?,
        time_max: time_max?,
        obs_min,
        obs_max,
    })
}

struct ObservationRow {
    storm: String,
    valid_time: NaiveDateTime,
    station: Option<String>,
    lead_hours: Option<f64>,
    obs_temperature: f64,
}

fn parse_member_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<(String, NaiveDateTime, f64), String> {
    let storm = get_required(record, header_map, "storm")?.to_string();
    let valid_time = parse_datetime(get_required(record, header_map, "valid_time")?)?;
    let temperature = parse_f64(get_required(record, header_map, "temperature")?, "temperature")?;
    if !temperature.is_finite() {
        return Err("Non-finite `temperature` value.".to_string());
    }
    Ok((storm, valid_time, temperature))
}

fn parse_observation_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<ObservationRow, String> {
    let storm = get_required(record, header_map, "storm")?.to_string();
    let valid_time = parse_datetime(get_required(record, header_map, "valid_time")?)?;
    let obs_temperature = parse_f64(
        get_required(record, header_map, "obs_temperature")?,
        "obs_temperature",
    )?;
    if !obs_temperature.is_finite() {
        return Err("Non-finite `obs_temperature` value.".to_string());
    }

    let station = get_optional(record, header_map, "station").map(str::to_string);
    let lead_hours = parse_opt_f64(get_optional(record, header_map, "lead_hours"));

    Ok(ObservationRow {
        storm,
        valid_time,
        station,
        lead_hours,
        obs_temperature,
    })
}

fn parse_score_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<ScoredRecord, String> {
    let storm = get_required(record, header_map, "storm")?.to_string();
    let valid_time = parse_datetime(get_required(record, header_map, "valid_time")?)?;

    let get = |name: &str| -> Result<f64, String> {
        parse_f64(get_required(record, header_map, name)?, name)
    };

    let observation = get("obs_temperature")?;
    let ensemble_mean = get("model_mean")?;
    let spread = get("model_std")?;
    let rmse = get("rmse")?;
    let mean_error = get("mean_error")?;
    let mean_bias = get("mean_bias")?;
    let bias_cv = get("bias_cv")?;
    let directional_agreement = get("directional_agreement")?;
    let magnitude_consistency = get("magnitude_consistency")?;
    let phi = get("phi")?;
    let rho = get("rho")?;
    let bci = get("bci")?;
    let n_members = get_required(record, header_map, "n_members")?
        .parse::<usize>()
        .map_err(|e| format!("Invalid `n_members` value: {e}"))?;

    let station = get_optional(record, header_map, "station")
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let lead_hours = parse_opt_f64(get_optional(record, header_map, "lead_hours"));

    Ok(ScoredRecord {
        storm,
        valid_time,
        station,
        lead_hours,
        observation,
        score: BciScore {
            phi,
            rho,
            bci,
            directional_agreement,
            bias_cv,
            magnitude_consistency,
            ensemble_mean,
            spread,
            rmse,
            mean_bias,
            mean_error,
            n_members,
        },
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿storm"). If we don't strip it, schema validation
    // will incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing column `{name}`."))?;
    let value = record
        .get(*idx)
        .ok_or_else(|| format!("Row is too short for column `{name}`."))?;
    if value.is_empty() {
        return Err(format!("Empty `{name}` value."));
    }
    Ok(value)
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).filter(|v| !v.is_empty())
}

fn parse_f64(value: &str, name: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .map_err(|e| format!("Invalid `{name}` value '{value}': {e}"))
}

fn parse_opt_f64(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.parse::<f64>().ok())
}

/// Parse a valid time in the formats the TIGGE extraction scripts emit.
fn parse_datetime(value: &str) -> Result<NaiveDateTime, String> {
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(format!("Invalid `valid_time` value '{value}'."))
}
