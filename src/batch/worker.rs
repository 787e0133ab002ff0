// src/batch/worker.rs

use crate::batch::dataset::Dataset;
use crate::core::{FrqiError, Image};
use crate::decoding::decode;
use crate::encoding::Encoding;
use crate::metrics::{MetricKind, image_entropy};
use crate::simulation::MeasurementSimulator;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// One `(image, shots, score)` row handed to persistence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub image_index: usize,
    pub shots: u64,
    pub score: f64,
}

/// Average score of a batch at one shot count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotAverage {
    pub shots: u64,
    pub average: f64,
}

/// Everything measured for a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEvaluation {
    pub image_index: usize,
    /// Scores aligned with the requested shot counts.
    pub scores: Vec<f64>,
    pub rows: Vec<ScoreRow>,
    /// Shannon entropy of the original image, in bits.
    pub entropy: f64,
}

/// An image whose evaluation was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub image_index: usize,
    pub reason: String,
}

/// Result of one unit of batch work.
pub type ItemOutcome = Result<ImageEvaluation, ItemFailure>;

/// Encodes `image` once, then for every shot count samples the circuit,
/// decodes the counts and scores the reconstruction with `metric`.
///
/// # Errors
/// The first error from encoding, simulation, decoding or scoring.
pub fn evaluate_image(
    image_index: usize,
    image: &Image,
    simulator: &dyn MeasurementSimulator,
    metric: MetricKind,
    shot_counts: &[u64],
) -> Result<ImageEvaluation, FrqiError> {
    let encoding = Encoding::from_image(image)?;
    let mut scores = Vec::with_capacity(shot_counts.len());
    let mut rows = Vec::with_capacity(shot_counts.len());

    for &shots in shot_counts {
        let table = simulator.run(encoding.circuit(), shots)?;
        let reconstructed = decode(&table, shots)?;
        let score = metric.score(image, &reconstructed)?;
        log::debug!("Image {} at {} shots: {} = {:.6}", image_index, shots, metric, score);
        scores.push(score);
        rows.push(ScoreRow { image_index, shots, score });
    }

    Ok(ImageEvaluation { image_index, scores, rows, entropy: image_entropy(image) })
}

/// Loads and evaluates one dataset entry, turning errors and panics into an
/// `ItemFailure` so the rest of the batch is unaffected.
pub(crate) fn evaluate_item(
    dataset: &dyn Dataset,
    simulator: &dyn MeasurementSimulator,
    metric: MetricKind,
    shot_counts: &[u64],
    image_index: usize,
) -> ItemOutcome {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        let image = dataset.load(image_index)?;
        evaluate_image(image_index, &image, simulator, metric, shot_counts)
    }));
    match attempt {
        Ok(Ok(evaluation)) => Ok(evaluation),
        Ok(Err(err)) => Err(ItemFailure { image_index, reason: err.to_string() }),
        Err(payload) => Err(ItemFailure {
            image_index,
            reason: format!("Worker panicked: {}", panic_payload_to_string(payload)),
        }),
    }
}

fn panic_payload_to_string(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::dataset::InMemoryDataset;
    use crate::circuits::Circuit;
    use crate::simulation::{FrequencyTable, Simulator};

    struct PanickingSimulator;

    impl MeasurementSimulator for PanickingSimulator {
        fn run(&self, _circuit: &Circuit, _shots: u64) -> Result<FrequencyTable, FrqiError> {
            panic!("backend crashed")
        }
    }

    fn dataset() -> InMemoryDataset {
        InMemoryDataset::from_rows(&[vec![200; 64]]).expect("valid rows")
    }

    #[test]
    fn test_evaluate_image_rows_follow_shot_counts() -> Result<(), FrqiError> {
        let image = Image::uniform(8, 8, 200)?;
        let eval = evaluate_image(7, &image, &Simulator::seeded(1), MetricKind::Mae, &[100, 400, 900])?;
        assert_eq!(eval.scores.len(), 3);
        let shots: Vec<u64> = eval.rows.iter().map(|r| r.shots).collect();
        assert_eq!(shots, vec![100, 400, 900]);
        assert!(eval.rows.iter().all(|r| r.image_index == 7));
        assert!(eval.scores.iter().all(|s| (0.0..=1.0).contains(s)));
        assert_eq!(eval.entropy, 0.0);
        Ok(())
    }

    #[test]
    fn test_evaluate_item_isolates_errors() {
        let outcome = evaluate_item(&dataset(), &Simulator::seeded(1), MetricKind::Mae, &[100], 5);
        let failure = outcome.expect_err("index 5 is out of range");
        assert_eq!(failure.image_index, 5);
        assert!(failure.reason.contains("out of range"), "{}", failure.reason);
    }

    #[test]
    fn test_evaluate_item_isolates_panics() {
        let outcome = evaluate_item(&dataset(), &PanickingSimulator, MetricKind::Mae, &[100], 0);
        let failure = outcome.expect_err("simulator panics");
        assert!(failure.reason.contains("backend crashed"), "{}", failure.reason);
    }
}
