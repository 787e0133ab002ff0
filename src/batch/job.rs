// src/batch/job.rs

use crate::core::FrqiError;
use crate::metrics::MetricKind;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use serde::{Deserialize, Serialize};

/// Evenly spaced shot counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotSchedule {
    pub start: u64,
    pub stop: u64,
    pub step: u64,
}

impl ShotSchedule {
    /// Schedule used for batch sweeps: 100, 200, ..., 2000.
    pub const BATCH: ShotSchedule = ShotSchedule { start: 100, stop: 2000, step: 100 };
    /// Schedule used for single-image sweeps: 100, 200, ..., 5000.
    pub const SINGLE_IMAGE: ShotSchedule = ShotSchedule { start: 100, stop: 5000, step: 100 };

    pub fn linear(start: u64, stop: u64, step: u64) -> Self {
        Self { start, stop, step }
    }

    /// All counts from `start` through `stop` inclusive. Empty when `step` is 0
    /// or `start > stop`.
    pub fn counts(&self) -> Vec<u64> {
        if self.step == 0 || self.start > self.stop {
            return Vec::new();
        }
        (self.start..=self.stop).step_by(self.step as usize).collect()
    }
}

impl Default for ShotSchedule {
    fn default() -> Self {
        Self::BATCH
    }
}

/// Which images a batch covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSelection {
    /// Contiguous dataset indices `[start, start + size)`.
    Range { start: usize, size: usize },
    /// An explicit list of dataset indices.
    Indices(Vec<usize>),
}

/// One request to evaluate a set of images at a list of shot counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchJob {
    pub selection: ImageSelection,
    pub metric: MetricKind,
    pub shot_counts: Vec<u64>,
}

impl BatchJob {
    /// Images `start..start + size`.
    pub fn range(start: usize, size: usize, metric: MetricKind, shot_counts: Vec<u64>) -> Self {
        Self { selection: ImageSelection::Range { start, size }, metric, shot_counts }
    }

    /// `count` distinct random indices below `dataset_len`, sorted ascending.
    ///
    /// # Errors
    /// `FrqiError::InvalidInput` if `count` exceeds `dataset_len`.
    pub fn sample(
        dataset_len: usize,
        count: usize,
        metric: MetricKind,
        shot_counts: Vec<u64>,
        seed: Option<u64>,
    ) -> Result<Self, FrqiError> {
        if count > dataset_len {
            return Err(FrqiError::invalid_input(format!(
                "Cannot sample {} images from a dataset of {}",
                count, dataset_len
            )));
        }
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut indices = index::sample(&mut rng, dataset_len, count).into_vec();
        indices.sort_unstable();
        Ok(Self { selection: ImageSelection::Indices(indices), metric, shot_counts })
    }

    /// Nominal number of images; the divisor of every average.
    pub fn size(&self) -> usize {
        match &self.selection {
            ImageSelection::Range { size, .. } => *size,
            ImageSelection::Indices(indices) => indices.len(),
        }
    }

    /// Dataset indices in selection order, produced lazily.
    pub fn indices(&self) -> Box<dyn Iterator<Item = usize> + Send + '_> {
        match &self.selection {
            ImageSelection::Range { start, size } => Box::new((*start..).take(*size)),
            ImageSelection::Indices(indices) => Box::new(indices.iter().copied()),
        }
    }

    /// Checks the job before any worker is spawned.
    ///
    /// # Errors
    /// `FrqiError::InvalidInput` when the batch is empty, the range overflows,
    /// the shot list is empty or contains 0.
    pub fn validate(&self) -> Result<(), FrqiError> {
        if self.size() == 0 {
            return Err(FrqiError::invalid_input("Batch size must be positive"));
        }
        if let ImageSelection::Range { start, size } = self.selection {
            if start.checked_add(size).is_none() {
                return Err(FrqiError::invalid_input(format!("Range {} + {} overflows", start, size)));
            }
        }
        if self.shot_counts.is_empty() {
            return Err(FrqiError::invalid_input("At least one shot count is required"));
        }
        if self.shot_counts.contains(&0) {
            return Err(FrqiError::invalid_input("Shot counts must be positive"));
        }
        Ok(())
    }
}
