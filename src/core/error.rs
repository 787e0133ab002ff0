//! Error handling logic

use std::fmt;
use thiserror::Error;

/// Identifier of a single qubit line in a circuit.
/// Qubit `k` maps to bit `k` of a basis-state index inside the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QubitId(pub usize);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Error types raised while encoding, simulating, decoding or scoring images.
///
/// `InvalidInput` and `ShapeMismatch` are surfaced to the caller immediately.
/// `SimulationFailure` and `DegenerateMetric` are normally recovered locally:
/// the batch scheduler turns the former into a skipped image and the metrics
/// turn the latter into a fallback score.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrqiError {
    /// Malformed image, non-positive shot count or batch size, unknown metric.
    #[error("Invalid Input: {message}")]
    InvalidInput {
        /// InvalidInput failure message
        message: String,
    },

    /// Two grids that must share a shape do not.
    #[error("Shape Mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// Shape (rows, cols) of the reference grid
        expected: (usize, usize),
        /// Shape (rows, cols) of the offending grid
        found: (usize, usize),
    },

    /// The measurement backend rejected the circuit or produced unusable data.
    #[error("Simulation Failure: {message}")]
    SimulationFailure {
        /// SimulationFailure failure message
        message: String,
    },

    /// A metric was asked to compare a zero-norm vector.
    #[error("Degenerate Metric: {message}")]
    DegenerateMetric {
        /// DegenerateMetric failure message
        message: String,
    },

    /// A batch was started while another one is still running.
    #[error("Batch In Progress: {done}/{total} images processed")]
    BatchInProgress {
        /// Completed images of the active batch
        done: usize,
        /// Nominal size of the active batch
        total: usize,
    },

    /// The coordinator of a background batch terminated abnormally.
    #[error("Batch Aborted: {message}")]
    BatchAborted {
        /// BatchAborted failure message
        message: String,
    },
}

impl FrqiError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        FrqiError::InvalidInput { message: message.into() }
    }

    pub(crate) fn simulation(message: impl Into<String>) -> Self {
        FrqiError::SimulationFailure { message: message.into() }
    }
}
