// src/metrics/mod.rs

//! Scalar comparisons between an original image and its reconstruction.
//!
//! Every score is "higher is better" and equals 1 for identical images (state
//! fidelity additionally requires a non-zero image). All functions are pure.

use crate::core::{FrqiError, INTENSITY_MAX, Image, ensure_same_shape};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Base weight of the weighted MAE so that black and white pixels still count.
pub const WEIGHTED_MAE_EPSILON: f64 = 0.01;

/// Side of the SSIM sliding window.
pub const SSIM_WINDOW: usize = 7;
const SSIM_K1: f64 = 0.01;
const SSIM_K2: f64 = 0.03;

/// Selects which comparison a batch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    #[serde(rename = "fidelity")]
    StateFidelity,
    #[serde(rename = "ssim")]
    Ssim,
    #[serde(rename = "mae")]
    Mae,
    #[serde(rename = "weighted-mae")]
    WeightedMae,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [MetricKind::StateFidelity, MetricKind::Ssim, MetricKind::Mae, MetricKind::WeightedMae];

    /// Scores `reconstructed` against `original`.
    pub fn score(&self, original: &Image, reconstructed: &Image) -> Result<f64, FrqiError> {
        match self {
            MetricKind::StateFidelity => state_fidelity(original, reconstructed),
            MetricKind::Ssim => ssim(original, reconstructed),
            MetricKind::Mae => mae_fidelity(original, reconstructed),
            MetricKind::WeightedMae => weighted_mae_fidelity(original, reconstructed),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::StateFidelity => "fidelity",
            MetricKind::Ssim => "ssim",
            MetricKind::Mae => "mae",
            MetricKind::WeightedMae => "weighted-mae",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = FrqiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.name() == lowered)
            .ok_or_else(|| FrqiError::invalid_input(format!("Unknown metric '{}'", s)))
    }
}

/// Squared overlap of the two images viewed as L2-normalized vectors.
///
/// Falls back to 0.0 when either image is entirely black.
pub fn state_fidelity(original: &Image, reconstructed: &Image) -> Result<f64, FrqiError> {
    ensure_same_shape(original, reconstructed)?;
    match (unit_vector(original), unit_vector(reconstructed)) {
        (Ok(a), Ok(b)) => {
            let overlap: f64 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
            Ok((overlap * overlap).min(1.0))
        }
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("{}, state fidelity falls back to 0", e);
            Ok(0.0)
        }
    }
}

fn unit_vector(image: &Image) -> Result<Vec<f64>, FrqiError> {
    let values: Vec<f64> = image.pixels().iter().map(|&p| f64::from(p)).collect();
    let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm == 0.0 {
        return Err(FrqiError::DegenerateMetric { message: "zero-norm intensity vector".to_string() });
    }
    Ok(values.into_iter().map(|v| v / norm).collect())
}

/// Mean structural similarity with a 7x7 uniform window, sample covariance
/// and a data range of 255, averaged over the windows that fit in the image.
///
/// # Errors
/// * `ShapeMismatch` on differing shapes.
/// * `InvalidInput` if the image is smaller than the window.
pub fn ssim(original: &Image, reconstructed: &Image) -> Result<f64, FrqiError> {
    ensure_same_shape(original, reconstructed)?;
    let (rows, cols) = original.shape();
    if rows < SSIM_WINDOW || cols < SSIM_WINDOW {
        return Err(FrqiError::invalid_input(format!(
            "SSIM needs at least {}x{} pixels, got {}x{}",
            SSIM_WINDOW, SSIM_WINDOW, rows, cols
        )));
    }

    let c1 = (SSIM_K1 * INTENSITY_MAX).powi(2);
    let c2 = (SSIM_K2 * INTENSITY_MAX).powi(2);
    let n = (SSIM_WINDOW * SSIM_WINDOW) as f64;
    let cov_norm = n / (n - 1.0);

    let x = original.pixels();
    let y = reconstructed.pixels();
    let mut total = 0.0;
    let mut windows = 0usize;

    for top in 0..=rows - SSIM_WINDOW {
        for left in 0..=cols - SSIM_WINDOW {
            let (mut sx, mut sy, mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for r in top..top + SSIM_WINDOW {
                for c in left..left + SSIM_WINDOW {
                    let a = f64::from(x[r * cols + c]);
                    let b = f64::from(y[r * cols + c]);
                    sx += a;
                    sy += b;
                    sxx += a * a;
                    syy += b * b;
                    sxy += a * b;
                }
            }
            let (ux, uy) = (sx / n, sy / n);
            let vx = cov_norm * (sxx / n - ux * ux);
            let vy = cov_norm * (syy / n - uy * uy);
            let vxy = cov_norm * (sxy / n - ux * uy);

            let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += numerator / denominator;
            windows += 1;
        }
    }
    Ok(total / windows as f64)
}

/// `1 - mean(|original - reconstructed|) / 255`
pub fn mae_fidelity(original: &Image, reconstructed: &Image) -> Result<f64, FrqiError> {
    ensure_same_shape(original, reconstructed)?;
    let sum: f64 = original
        .pixels()
        .iter()
        .zip(reconstructed.pixels())
        .map(|(a, b)| f64::from(a.abs_diff(*b)))
        .sum();
    Ok(1.0 - sum / original.len() as f64 / INTENSITY_MAX)
}

/// MAE fidelity weighting each pixel by `epsilon + (1 - |p - 0.5|)` with `p`
/// the normalized original intensity, so mid-gray pixels count most.
pub fn weighted_mae_fidelity(original: &Image, reconstructed: &Image) -> Result<f64, FrqiError> {
    ensure_same_shape(original, reconstructed)?;
    let (mut numerator, mut denominator) = (0.0, 0.0);
    for (o, r) in original.normalized().into_iter().zip(reconstructed.normalized()) {
        let weight = WEIGHTED_MAE_EPSILON + (1.0 - (o - 0.5).abs());
        numerator += weight * (o - r).abs();
        denominator += weight;
    }
    Ok(1.0 - numerator / denominator)
}

/// Shannon entropy in bits of the image's 256-bin intensity histogram.
pub fn image_entropy(image: &Image) -> f64 {
    let mut histogram = [0usize; 256];
    for &p in image.pixels() {
        histogram[usize::from(p)] += 1;
    }
    let total = image.len() as f64;
    histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn gradient() -> Image {
        let pixels = (0..64u32).map(|i| (i * 4) as u8).collect();
        Image::new(8, 8, pixels).expect("valid image")
    }

    #[test]
    fn test_identical_images_score_one() -> Result<(), FrqiError> {
        let img = gradient();
        for kind in MetricKind::ALL {
            let score = kind.score(&img, &img)?;
            assert!((score - 1.0).abs() < TOL, "{} gave {}", kind, score);
        }
        Ok(())
    }

    #[test]
    fn test_state_fidelity_is_symmetric_and_scale_free() -> Result<(), FrqiError> {
        let a = gradient();
        let b = Image::uniform(8, 8, 90)?;
        assert!((state_fidelity(&a, &b)? - state_fidelity(&b, &a)?).abs() < TOL);

        // Uniform images are parallel vectors whatever their brightness
        let dim = Image::uniform(8, 8, 10)?;
        assert!((state_fidelity(&b, &dim)? - 1.0).abs() < TOL);
        Ok(())
    }

    #[test]
    fn test_state_fidelity_zero_image_falls_back() -> Result<(), FrqiError> {
        let black = Image::uniform(8, 8, 0)?;
        assert_eq!(state_fidelity(&gradient(), &black)?, 0.0);
        assert_eq!(state_fidelity(&black, &black)?, 0.0);
        Ok(())
    }

    #[test]
    fn test_mae_against_black() -> Result<(), FrqiError> {
        let gray = Image::uniform(8, 8, 128)?;
        let black = Image::uniform(8, 8, 0)?;
        let score = mae_fidelity(&gray, &black)?;
        assert!((score - (1.0 - 128.0 / 255.0)).abs() < TOL);
        assert!((score - 0.498).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn test_weighted_mae_emphasizes_mid_gray() -> Result<(), FrqiError> {
        // Same absolute error, once on a mid-gray pixel and once on a black one.
        let mut base = vec![0u8; 64];
        base[0] = 128;
        let original = Image::new(8, 8, base.clone())?;

        let mut off_mid = base.clone();
        off_mid[0] = 178;
        let mut off_dark = base;
        off_dark[1] = 50;

        let mid_score = weighted_mae_fidelity(&original, &Image::new(8, 8, off_mid)?)?;
        let dark_score = weighted_mae_fidelity(&original, &Image::new(8, 8, off_dark)?)?;
        assert!(mid_score < dark_score);
        Ok(())
    }

    #[test]
    fn test_ssim_penalizes_structure_loss() -> Result<(), FrqiError> {
        let img = gradient();
        let flat = Image::uniform(8, 8, 126)?;
        let score = ssim(&img, &flat)?;
        assert!(score < 0.5, "ssim {}", score);
        assert!((ssim(&img, &flat)? - ssim(&flat, &img)?).abs() < TOL);
        Ok(())
    }

    #[test]
    fn test_ssim_rejects_small_images() -> Result<(), FrqiError> {
        let small = Image::uniform(4, 4, 1)?;
        assert!(matches!(ssim(&small, &small), Err(FrqiError::InvalidInput { .. })));
        Ok(())
    }

    #[test]
    fn test_shape_mismatch_surfaces() -> Result<(), FrqiError> {
        let a = gradient();
        let b = Image::uniform(7, 9, 3)?;
        for kind in MetricKind::ALL {
            assert!(matches!(kind.score(&a, &b), Err(FrqiError::ShapeMismatch { .. })));
        }
        Ok(())
    }

    #[test]
    fn test_metric_names_round_trip() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.name().parse::<MetricKind>().ok(), Some(kind));
        }
        assert_eq!("SSIM".parse::<MetricKind>().ok(), Some(MetricKind::Ssim));
        assert!("psnr".parse::<MetricKind>().is_err());
    }

    #[test]
    fn test_entropy() -> Result<(), FrqiError> {
        assert_eq!(image_entropy(&Image::uniform(8, 8, 3)?), 0.0);
        let half: Vec<u8> = (0..64).map(|i| if i < 32 { 0 } else { 255 }).collect();
        assert!((image_entropy(&Image::new(8, 8, half)?) - 1.0).abs() < TOL);
        // 64 distinct values -> 6 bits
        assert!((image_entropy(&gradient()) - 6.0).abs() < TOL);
        Ok(())
    }
}
