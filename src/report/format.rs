//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the scoring/validation code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{RowError, ScoredRecord};
use crate::index::BciWeights;
use crate::io::ingest::IngestedData;
use crate::sweep::SweepOutput;
use crate::validate::{StormStat, ValidationOutput};
use crate::report::summarize;

/// Format the compute-run summary (ingest accounting + score statistics).
pub fn format_compute_summary(
    ingest: &IngestedData,
    scored: &[ScoredRecord],
    weights: BciWeights,
) -> String {
    let mut out = String::new();

    out.push_str("=== bci - Bias-Coherence Index ===\n");
    out.push_str(&format!(
        "Weights: directional={:.2} magnitude={:.2}\n",
        weights.directional,
        weights.magnitude()
    ));
    out.push_str(&format!(
        "Rows: read={} used={} skipped_small_ensembles={}\n",
        ingest.rows_read, ingest.rows_used, ingest.skipped_small_ensembles
    ));
    out.push_str(&format!(
        "Dataset: n={} storms={} time=[{}, {}] obs=[{:.2}, {:.2}]\n",
        ingest.stats.n_records,
        ingest.stats.n_storms,
        ingest.stats.time_min,
        ingest.stats.time_max,
        ingest.stats.obs_min,
        ingest.stats.obs_max
    ));

    for (label, values) in [
        ("BCI", scored.iter().map(|r| r.score.bci).collect::<Vec<_>>()),
        ("phi", scored.iter().map(|r| r.score.phi).collect()),
        ("rho", scored.iter().map(|r| r.score.rho).collect()),
    ] {
        let s = summarize(&values);
        out.push_str(&format!(
            "{label:<4} mean={:.4} std={:.4} range=[{:.4}, {:.4}]\n",
            s.mean, s.std, s.min, s.max
        ));
    }

    out
}

/// Format the full validation report.
pub fn format_validation_report(validation: &ValidationOutput) -> String {
    let mut out = String::new();

    out.push_str("=== bci validate ===\n");
    out.push_str(&format!(
        "Dataset: n={} storms={} time=[{}, {}]\n",
        validation.stats.n_records,
        validation.stats.n_storms,
        validation.stats.time_min,
        validation.stats.time_max
    ));

    out.push_str("\nCorrelations with forecast error:\n");
    out.push_str(&format!(
        "  spread            r={:+.4} p={:.2e}{}\n",
        validation.corr_spread.r,
        validation.corr_spread.p_value,
        significance(validation.corr_spread.p_value)
    ));
    out.push_str(&format!(
        "  BCI               r={:+.4} p={:.2e}{}\n",
        validation.corr_bci.r,
        validation.corr_bci.p_value,
        significance(validation.corr_bci.p_value)
    ));
    out.push_str(&format!(
        "  BCI | spread      r={:+.4} p={:.2e}{}  (partial)\n",
        validation.partial.r,
        validation.partial.p_value,
        significance(validation.partial.p_value)
    ));

    out.push('\n');
    out.push_str(&format_storm_table(&validation.storms));

    out.push('\n');
    out.push_str(&format_baseline(validation));

    out
}

/// Per-storm table, largest sample first.
pub fn format_storm_table(storms: &[StormStat]) -> String {
    let mut out = String::new();
    out.push_str("Per-storm statistics:\n");
    out.push_str(&format!(
        "{:<12} {:>5} {:>10} {:>10} {:>10} {:>10}\n",
        "storm", "n", "bci_mean", "bci_std", "spread", "error"
    ));
    out.push_str(&format!(
        "{:-<12} {:-<5} {:-<10} {:-<10} {:-<10} {:-<10}\n",
        "", "", "", "", "", ""
    ));
    for s in storms {
        out.push_str(&format!(
            "{:<12} {:>5} {:>10.4} {:>10.4} {:>10.4} {:>10.4}\n",
            truncate(&s.storm, 12),
            s.n,
            s.bci_mean,
            s.bci_std,
            s.spread_mean,
            s.error_mean
        ));
    }
    out
}

/// Baseline comparison table (high-error detection AUCs).
pub fn format_baseline(validation: &ValidationOutput) -> String {
    let baseline = &validation.baseline;
    let mut out = String::new();

    out.push_str(&format!(
        "High-error detection: threshold={:.3} events={}/{}\n",
        baseline.threshold, baseline.n_high, baseline.n
    ));
    for m in &baseline.models {
        out.push_str(&format!("  {:<24} AUC={:.4}\n", m.label, m.auc));
        if let Some(coefs) = &m.coefficients {
            out.push_str(&format!("  {:<24} weights: {}\n", "", fmt_vec(coefs)));
        }
    }

    out
}

/// Weight-sweep table, best row starred.
pub fn format_sweep_table(output: &SweepOutput) -> String {
    let mut out = String::new();

    out.push_str("=== bci sweep ===\n");
    out.push_str(&format!(
        "{:<2}{:>8} {:>10} {:>10} {:>10}\n",
        "", "weight", "partial_r", "partial_p", "auc"
    ));
    for (i, p) in output.points.iter().enumerate() {
        let chosen = if i == output.best { "*" } else { " " };
        out.push_str(&format!(
            "{chosen} {:>8.3} {:>10.4} {:>10.2e} {:>10.4}\n",
            p.weight, p.partial_r, p.partial_p, p.auc
        ));
    }

    let best = &output.points[output.best];
    out.push_str(&format!(
        "\nBest directional weight: {:.3} (AUC={:.4})\n",
        best.weight, best.auc
    ));

    out
}

/// Row-error warnings, truncated to `limit` lines.
pub fn format_row_errors(errors: &[RowError], limit: usize) -> String {
    let mut out = String::new();
    for e in errors.iter().take(limit) {
        match &e.id {
            Some(id) => {
                out.push_str(&format!("warning: line {} ({id}): {}\n", e.line, e.message))
            }
            None => out.push_str(&format!("warning: line {}: {}\n", e.line, e.message)),
        }
    }
    if errors.len() > limit {
        out.push_str(&format!("warning: {} more rows skipped\n", errors.len() - limit));
    }
    out
}

fn significance(p: f64) -> &'static str {
    if p < 0.001 {
        " ***"
    } else if p < 0.01 {
        " **"
    } else if p < 0.05 {
        " *"
    } else {
        ""
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:+.4}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn significance_markers() {
        assert_eq!(significance(0.0005), " ***");
        assert_eq!(significance(0.005), " **");
        assert_eq!(significance(0.02), " *");
        assert_eq!(significance(0.2), "");
    }

    #[test]
    fn storm_table_contains_names() {
        let storms = vec![StormStat {
            storm: "eunice".to_string(),
            n: 10,
            bci_mean: 0.61,
            bci_std: 0.08,
            spread_mean: 1.2,
            error_mean: 2.4,
        }];
        let table = format_storm_table(&storms);
        assert!(table.contains("eunice"));
        assert!(table.contains("0.6100"));
    }

    #[test]
    fn row_errors_are_truncated() {
        let errors: Vec<RowError> = (1..=5)
            .map(|i| RowError {
                line: i,
                id: None,
                message: "bad value".to_string(),
            })
            .collect();
        let text = format_row_errors(&errors, 3);
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("2 more rows skipped"));
    }
}
