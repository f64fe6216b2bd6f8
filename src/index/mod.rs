//! Bias-Coherence Index (BCI) computation.
//!
//! For one ensemble/observation pair the index combines two components via a
//! geometric mean:
//!
//! - `φ` — bias consensus: do the members agree on the *direction* of their
//!   error, and how consistent are the error magnitudes?
//! - `ρ` — error stability: the spread-skill ratio `spread / RMSE`, capped
//!   at 1 (an ensemble whose spread exceeds its error is not rewarded).
//!
//! Both components are clipped to `[0.3, 1.0]`, so `BCI = sqrt(φ·ρ)` is also
//! bounded to `[0.3, 1.0]`.
//!
//! The numeric edge cases (near-zero mean bias, near-zero RMSE) are handled
//! with explicit guards rather than letting a division blow up; see the
//! constants below.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::{mean, std_pop};

/// Lower clip applied to φ, ρ, and therefore BCI.
pub const COMPONENT_FLOOR: f64 = 0.3;

/// Upper clip applied to φ and ρ.
pub const COMPONENT_CEIL: f64 = 1.0;

/// Below this absolute mean bias the coefficient of variation is degenerate.
pub const MIN_MEAN_BIAS: f64 = 0.01;

/// Magnitude-consistency sentinel used when the mean bias is near zero.
pub const NEAR_ZERO_BIAS_CONSISTENCY: f64 = 0.8;

/// Below this RMSE the spread-skill ratio is taken as 1 (the forecast is
/// essentially perfect and the ratio is noise).
pub const MIN_RMSE: f64 = 0.1;

/// Minimum ensemble size for a meaningful directional-agreement count.
pub const MIN_MEMBERS: usize = 4;

/// Weighting between the two φ ingredients.
///
/// `directional` multiplies the directional-agreement fraction; the magnitude
/// consistency gets the complement. The default 0.7/0.3 split is the setting
/// selected by the sensitivity sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BciWeights {
    pub directional: f64,
}

impl BciWeights {
    pub fn new(directional: f64) -> Result<Self, AppError> {
        if !directional.is_finite() || !(0.0..=1.0).contains(&directional) {
            return Err(AppError::new(
                2,
                format!("Directional weight must be in [0, 1], got {directional}."),
            ));
        }
        Ok(Self { directional })
    }

    pub fn magnitude(&self) -> f64 {
        1.0 - self.directional
    }
}

impl Default for BciWeights {
    fn default() -> Self {
        Self { directional: 0.7 }
    }
}

/// BCI for one forecast, with the intermediate diagnostics the validation
/// pipeline and exports rely on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BciScore {
    pub phi: f64,
    pub rho: f64,
    pub bci: f64,

    /// Fraction of members biased in the majority direction.
    pub directional_agreement: f64,
    /// Coefficient of variation of the member biases (0 when the mean bias is
    /// near zero and the ratio is degenerate).
    pub bias_cv: f64,
    /// `1 / (1 + CV)` of the member biases (or the near-zero-bias sentinel).
    pub magnitude_consistency: f64,

    pub ensemble_mean: f64,
    /// Ensemble spread (population standard deviation of the members).
    pub spread: f64,
    /// Root-mean-square of the member biases.
    pub rmse: f64,
    pub mean_bias: f64,
    /// Absolute error of the ensemble mean, `|mean - observation|`.
    pub mean_error: f64,

    pub n_members: usize,
}

/// Score one ensemble against its observation.
pub fn score_ensemble(
    members: &[f64],
    observation: f64,
    weights: BciWeights,
) -> Result<BciScore, AppError> {
    if members.len() < MIN_MEMBERS {
        return Err(AppError::new(
            3,
            format!(
                "Need at least {MIN_MEMBERS} ensemble members, got {}.",
                members.len()
            ),
        ));
    }
    if !observation.is_finite() || members.iter().any(|m| !m.is_finite()) {
        return Err(AppError::new(4, "Non-finite forecast or observation value."));
    }

    let biases: Vec<f64> = members.iter().map(|m| m - observation).collect();
    let n = members.len() as f64;

    let n_positive = biases.iter().filter(|b| **b > 0.0).count();
    let n_negative = biases.iter().filter(|b| **b < 0.0).count();
    let directional_agreement = n_positive.max(n_negative) as f64 / n;

    let mean_bias = mean(&biases);
    let bias_std = std_pop(&biases);
    let (bias_cv, magnitude_consistency) = if mean_bias.abs() > MIN_MEAN_BIAS {
        let cv = bias_std / mean_bias.abs();
        (cv, 1.0 / (1.0 + cv))
    } else {
        (0.0, NEAR_ZERO_BIAS_CONSISTENCY)
    };

    let phi = (weights.directional * directional_agreement
        + weights.magnitude() * magnitude_consistency)
        .clamp(COMPONENT_FLOOR, COMPONENT_CEIL);

    let spread = std_pop(members);
    let rmse = (biases.iter().map(|b| b * b).sum::<f64>() / n).sqrt();
    let spread_skill = if rmse > MIN_RMSE {
        (spread / rmse).min(1.0)
    } else {
        1.0
    };
    let rho = spread_skill.clamp(COMPONENT_FLOOR, COMPONENT_CEIL);

    let bci = (phi * rho).sqrt();

    let ensemble_mean = mean(members);
    Ok(BciScore {
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
        mean_error: (ensemble_mean - observation).abs(),
        n_members: members.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(members: &[f64], obs: f64) -> BciScore {
        score_ensemble(members, obs, BciWeights::default()).unwrap()
    }

    #[test]
    fn reference_ensemble_from_the_paper() {
        // All four members forecast below the observation.
        let s = score(&[10.5, 11.2, 10.8, 11.0], 12.5);

        assert!((s.directional_agreement - 1.0).abs() < 1e-12);
        // mean bias -1.625, population std ~0.2587 -> CV ~0.1592.
        assert!((s.mean_bias + 1.625).abs() < 1e-12);
        assert!((s.bias_cv - 0.1592).abs() < 1e-3);
        assert!((s.magnitude_consistency - 0.8627).abs() < 1e-3);
        assert!((s.phi - 0.9588).abs() < 1e-3);
        // Spread/RMSE ~0.157 clips up to the floor.
        assert!((s.rho - 0.3).abs() < 1e-12);
        assert!((s.bci - 0.5363).abs() < 1e-3);
    }

    #[test]
    fn bci_is_bounded_for_varied_ensembles() {
        let cases: Vec<(Vec<f64>, f64)> = vec![
            (vec![10.0, 10.0, 10.0, 10.0], 10.0),
            (vec![5.0, 15.0, 5.0, 15.0], 10.0),
            (vec![-3.0, -2.5, -2.0, -1.5, -1.0], 0.0),
            (vec![100.0, 101.0, 99.0, 100.5, 99.5, 100.2], 80.0),
            (vec![0.1, 0.2, 0.3, 0.4], 0.25),
            (vec![20.0, 0.0, 20.0, 0.0, 20.0], 10.0),
        ];
        for (members, obs) in cases {
            let s = score(&members, obs);
            assert!((0.3..=1.0).contains(&s.phi), "phi {} out of range", s.phi);
            assert!((0.3..=1.0).contains(&s.rho), "rho {} out of range", s.rho);
            assert!((0.3..=1.0).contains(&s.bci), "bci {} out of range", s.bci);
        }
    }

    #[test]
    fn geometric_mean_identity_holds() {
        let s = score(&[12.1, 12.9, 11.8, 13.2, 12.4], 11.0);
        assert!((s.bci * s.bci - s.phi * s.rho).abs() < 1e-12);
    }

    #[test]
    fn identical_biases_give_full_consensus() {
        // Every member 2 degrees warm: full agreement, zero CV.
        let s = score(&[14.0, 14.0, 14.0, 14.0], 12.0);
        assert!((s.directional_agreement - 1.0).abs() < 1e-12);
        assert!((s.magnitude_consistency - 1.0).abs() < 1e-12);
        assert!((s.phi - 1.0).abs() < 1e-12);
    }

    #[test]
    fn near_zero_mean_bias_uses_sentinel_consistency() {
        // Biases -1 and +1 cancel: CV would divide by ~0.
        let s = score(&[9.0, 11.0, 9.0, 11.0], 10.0);
        assert!((s.magnitude_consistency - NEAR_ZERO_BIAS_CONSISTENCY).abs() < 1e-12);
    }

    #[test]
    fn zero_spread_with_real_error_floors_rho() {
        let s = score(&[15.0, 15.0, 15.0, 15.0], 10.0);
        assert!((s.spread - 0.0).abs() < 1e-12);
        assert!((s.rho - COMPONENT_FLOOR).abs() < 1e-12);
    }

    #[test]
    fn tiny_rmse_counts_as_well_calibrated() {
        // All members within a few hundredths of the observation.
        let s = score(&[10.01, 9.99, 10.02, 9.98], 10.0);
        assert!(s.rmse <= MIN_RMSE);
        assert!((s.rho - 1.0).abs() < 1e-12);
    }

    #[test]
    fn small_ensembles_are_rejected() {
        let err = score_ensemble(&[10.0, 11.0, 12.0], 10.5, BciWeights::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        let err =
            score_ensemble(&[10.0, f64::NAN, 12.0, 11.0], 10.5, BciWeights::default()).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn weights_must_be_a_fraction() {
        assert!(BciWeights::new(0.7).is_ok());
        assert!(BciWeights::new(1.2).is_err());
        assert!(BciWeights::new(f64::NAN).is_err());
    }
}
