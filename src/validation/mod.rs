// src/validation/mod.rs

//! Checks on evolved states and on the probabilities an encoding produces.

use crate::core::{BRANCH_COUNT, FrqiError, StateVector};
use crate::encoding::{AngleVector, outcome_key};
use crate::simulation::OutcomeDistribution;

const DEFAULT_NORM_TOLERANCE: f64 = 1e-9;
const DEFAULT_PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Checks that the squared amplitudes sum to 1 within `tolerance`
/// (default 1e-9).
///
/// # Returns
/// * `Ok(())` if normalized within tolerance.
/// * `Err(FrqiError::SimulationFailure)` otherwise.
pub fn check_normalization(state: &StateVector, tolerance: Option<f64>) -> Result<(), FrqiError> {
    let effective_tolerance = tolerance.unwrap_or(DEFAULT_NORM_TOLERANCE);
    let norm_sq: f64 = state.vector().iter().map(|c| c.norm_sqr()).sum();
    if (norm_sq - 1.0).abs() > effective_tolerance {
        Err(FrqiError::simulation(format!(
            "State vector normalization failed. Sum(|c_i|^2) = {} (Deviation > {})",
            norm_sq, effective_tolerance
        )))
    } else {
        Ok(())
    }
}

/// Verifies the encoding invariant on an exact distribution: outcome
/// `value = 1, position = j` has probability `sin^2(angle_j) / 64`,
/// `value = 0, position = j` has `cos^2(angle_j) / 64`, and the total is 1.
pub fn check_branch_probabilities(
    distribution: &OutcomeDistribution,
    angles: &AngleVector,
    tolerance: Option<f64>,
) -> Result<(), FrqiError> {
    let tol = tolerance.unwrap_or(DEFAULT_PROBABILITY_TOLERANCE);
    let weight = 1.0 / BRANCH_COUNT as f64;

    for (branch, angle) in angles.as_slice().iter().enumerate() {
        let (sin, cos) = angle.sin_cos();
        for (value, expected) in [(true, weight * sin * sin), (false, weight * cos * cos)] {
            let key = outcome_key(value, branch);
            let actual = distribution.probability(&key);
            if (actual - expected).abs() > tol {
                return Err(FrqiError::simulation(format!(
                    "Outcome {} has probability {:.3e}, expected {:.3e}",
                    key, actual, expected
                )));
            }
        }
    }

    let total = distribution.total();
    if (total - 1.0).abs() > tol {
        return Err(FrqiError::simulation(format!("Outcome probabilities sum to {}", total)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;

    #[test]
    fn test_normalization() {
        let h = std::f64::consts::FRAC_1_SQRT_2;
        let good = StateVector::new(vec![Complex::new(h, 0.0), Complex::new(0.0, h)]);
        assert!(check_normalization(&good, None).is_ok());

        let bad = StateVector::new(vec![Complex::new(1.0, 0.0), Complex::new(1.0, 0.0)]);
        assert!(matches!(check_normalization(&bad, None), Err(FrqiError::SimulationFailure { .. })));
        assert!(check_normalization(&bad, Some(1.5)).is_ok());
    }
}
