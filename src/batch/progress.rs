// src/batch/progress.rs

use crate::core::FrqiError;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Batch-level lifecycle: `idle -> running -> done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Idle,
    Running,
    Done,
}

/// Snapshot of a batch's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub done: usize,
    pub total: usize,
    pub status: BatchStatus,
}

impl ProgressState {
    pub const IDLE: ProgressState = ProgressState { done: 0, total: 0, status: BatchStatus::Idle };

    /// Fraction of images processed, 0 for an idle tracker.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.done as f64 / self.total as f64 }
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Shared progress record of the single active batch.
///
/// Every update replaces or increments the record under one lock, so readers
/// never see a partially written state.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        // The record is plain data, a panic elsewhere cannot leave it torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resets the record to `{done: 0, total, running}`.
    ///
    /// # Errors
    /// `FrqiError::BatchInProgress` if a batch is still running.
    pub fn begin(&self, total: usize) -> Result<(), FrqiError> {
        let mut state = self.lock();
        if state.status == BatchStatus::Running {
            return Err(FrqiError::BatchInProgress { done: state.done, total: state.total });
        }
        *state = ProgressState { done: 0, total, status: BatchStatus::Running };
        Ok(())
    }

    /// Counts one more processed image and returns the new `done` count.
    pub fn record_completion(&self) -> usize {
        let mut state = self.lock();
        state.done += 1;
        state.done
    }

    /// Marks the batch done. Call only after every result has been folded in.
    pub fn finish(&self) {
        self.lock().status = BatchStatus::Done;
    }

    pub fn snapshot(&self) -> ProgressState {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() -> Result<(), FrqiError> {
        let tracker = ProgressTracker::new();
        assert_eq!(tracker.snapshot(), ProgressState::IDLE);

        tracker.begin(3)?;
        assert_eq!(tracker.snapshot(), ProgressState { done: 0, total: 3, status: BatchStatus::Running });
        assert_eq!(tracker.record_completion(), 1);
        assert!((tracker.snapshot().fraction() - 1.0 / 3.0).abs() < 1e-12);

        assert_eq!(tracker.begin(5), Err(FrqiError::BatchInProgress { done: 1, total: 3 }));

        tracker.finish();
        assert_eq!(tracker.snapshot().status, BatchStatus::Done);

        // A finished batch may be replaced wholesale
        tracker.begin(5)?;
        assert_eq!(tracker.snapshot(), ProgressState { done: 0, total: 5, status: BatchStatus::Running });
        Ok(())
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() -> Result<(), FrqiError> {
        let tracker = ProgressTracker::new();
        tracker.begin(800)?;
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..100 {
                        tracker.record_completion();
                    }
                });
            }
        });
        assert_eq!(tracker.snapshot().done, 800);
        Ok(())
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ProgressState { done: 1, total: 2, status: BatchStatus::Running })
            .expect("serializable");
        assert_eq!(json, r#"{"done":1,"total":2,"status":"running"}"#);
    }
}
