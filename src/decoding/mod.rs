// src/decoding/mod.rs

//! Turns measurement statistics back into an 8x8 intensity image.
//!
//! For branch `j` the frequency of outcome `value = 1, position = j` estimates
//! `sin^2(angle_j) / 64`, so `sqrt(count / shots) * 8 * 255` estimates the
//! original intensity.

use crate::core::constants::frqi_constants::decode_scale;
use crate::core::{BRANCH_COUNT, FrqiError, IMAGE_SIDE, INTENSITY_MAX, Image};
use crate::encoding::outcome_key;
use crate::simulation::{FrequencyTable, OutcomeDistribution};

/// Reconstructs an image from sampled counts.
///
/// Outcomes other than `value = 1, position = code(j)` are ignored and missing
/// branches count as zero.
///
/// # Errors
/// * `FrqiError::InvalidInput` if `shots == 0`.
/// * `FrqiError::SimulationFailure` if the table records more occurrences than `shots`.
pub fn decode(table: &FrequencyTable, shots: u64) -> Result<Image, FrqiError> {
    if shots == 0 {
        return Err(FrqiError::invalid_input("Cannot decode with zero shots"));
    }
    let total = table.total();
    if total > shots {
        return Err(FrqiError::simulation(format!(
            "Frequency table holds {} occurrences for {} shots",
            total, shots
        )));
    }
    let shots = shots as f64;
    let pixels = (0..BRANCH_COUNT)
        .map(|branch| pixel_from_probability(table.count(&outcome_key(true, branch)) as f64 / shots))
        .collect();
    Image::new(IMAGE_SIDE, IMAGE_SIDE, pixels)
}

/// Reconstructs an image from exact probabilities (the infinite-shot limit).
pub fn decode_distribution(distribution: &OutcomeDistribution) -> Result<Image, FrqiError> {
    let pixels = (0..BRANCH_COUNT)
        .map(|branch| pixel_from_probability(distribution.probability(&outcome_key(true, branch))))
        .collect();
    Image::new(IMAGE_SIDE, IMAGE_SIDE, pixels)
}

/// `round(clip(sqrt(p) * 8 * 255, 0, 255))`
fn pixel_from_probability(probability: f64) -> u8 {
    let amplitude = probability.max(0.0).sqrt();
    (amplitude * decode_scale()).clamp(0.0, INTENSITY_MAX).round() as u8
}
