// src/batch/scheduler.rs

use crate::batch::dataset::Dataset;
use crate::batch::job::{BatchJob, ShotSchedule};
use crate::batch::pool::WorkerPool;
use crate::batch::progress::{ProgressState, ProgressTracker};
use crate::batch::worker::{ImageEvaluation, ItemFailure, ScoreRow, ShotAverage, evaluate_item};
use crate::core::FrqiError;
use crate::metrics::MetricKind;
use crate::simulation::{MeasurementSimulator, Simulator, SimulatorConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// How many images a batch may name beyond the end of its dataset. Such
/// images are reported as failures; a batch reaching further is rejected.
pub const MAX_MISSING_IMAGES: usize = 1024;

/// Scheduler settings, loadable from JSON. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads per batch.
    pub workers: usize,
    /// Shot counts used when a caller does not supply its own.
    pub shot_counts: Option<Vec<u64>>,
    /// Metric used when a caller does not supply its own.
    pub metric: Option<MetricKind>,
    pub simulator: SimulatorConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: WorkerPool::DEFAULT_WORKERS,
            shot_counts: None,
            metric: None,
            simulator: SimulatorConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    /// `FrqiError::InvalidInput` on malformed JSON or mistyped fields.
    pub fn from_json_str(json: &str) -> Result<Self, FrqiError> {
        serde_json::from_str(json).map_err(|e| FrqiError::invalid_input(format!("Invalid batch config: {}", e)))
    }

    /// Configured shot counts, or the default batch sweep.
    pub fn shot_counts_or_default(&self) -> Vec<u64> {
        self.shot_counts.clone().unwrap_or_else(|| ShotSchedule::BATCH.counts())
    }

    /// Configured metric, or state fidelity.
    pub fn metric_or_default(&self) -> MetricKind {
        self.metric.unwrap_or(MetricKind::StateFidelity)
    }
}

/// Final output of one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub job: BatchJob,
    /// Per shot count, the sum of successful scores divided by the nominal
    /// batch size. Failed images contribute 0.
    pub averages: Vec<ShotAverage>,
    /// Rows of every successful image, sorted by `(image_index, shots)`.
    pub rows: Vec<ScoreRow>,
    pub evaluations: Vec<ImageEvaluation>,
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn average_for(&self, shots: u64) -> Option<f64> {
        self.averages.iter().find(|a| a.shots == shots).map(|a| a.average)
    }

    pub fn succeeded(&self) -> usize {
        self.evaluations.len()
    }
}

/// Runs batches of image evaluations on a bounded worker pool.
///
/// At most one batch runs at a time; `progress()` may be polled from any
/// thread while it does.
pub struct BatchScheduler {
    dataset: Arc<dyn Dataset>,
    simulator: Arc<dyn MeasurementSimulator>,
    pool: WorkerPool,
    tracker: Arc<ProgressTracker>,
}

impl BatchScheduler {
    pub fn new(dataset: Arc<dyn Dataset>, simulator: Arc<dyn MeasurementSimulator>, config: &BatchConfig) -> Self {
        Self {
            dataset,
            simulator,
            pool: WorkerPool::new(config.workers),
            tracker: Arc::new(ProgressTracker::new()),
        }
    }

    /// Scheduler backed by the bundled state-vector `Simulator`, configured
    /// from `config.simulator`.
    pub fn with_simulator_config(dataset: Arc<dyn Dataset>, config: &BatchConfig) -> Self {
        let simulator = Arc::new(Simulator::with_config(config.simulator.clone()));
        Self::new(dataset, simulator, config)
    }

    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    /// Current progress snapshot.
    pub fn progress(&self) -> ProgressState {
        self.tracker.snapshot()
    }

    /// Validates `job`, resets progress and runs the batch on a background
    /// coordinator thread. Returns immediately.
    ///
    /// # Errors
    /// * `InvalidInput` if the job is invalid or its size exceeds the dataset
    ///   length by more than `MAX_MISSING_IMAGES`; nothing is spawned.
    /// * `BatchInProgress` if another batch is still running.
    /// * `BatchAborted` if the coordinator thread cannot be spawned.
    pub fn start_batch(&self, job: BatchJob) -> Result<BatchHandle, FrqiError> {
        job.validate()?;
        let available = self.dataset.len();
        if job.size() > available.saturating_add(MAX_MISSING_IMAGES) {
            return Err(FrqiError::invalid_input(format!(
                "Batch of {} images exceeds a dataset of {} by more than {}",
                job.size(),
                available,
                MAX_MISSING_IMAGES
            )));
        }
        self.tracker.begin(job.size())?;

        let dataset = Arc::clone(&self.dataset);
        let simulator = Arc::clone(&self.simulator);
        let tracker = Arc::clone(&self.tracker);
        let pool = self.pool;

        let spawned = thread::Builder::new()
            .name("frqi-batch".to_string())
            .spawn(move || coordinate(dataset.as_ref(), simulator.as_ref(), pool, &tracker, job));

        match spawned {
            Ok(handle) => Ok(BatchHandle { handle, tracker: Arc::clone(&self.tracker) }),
            Err(e) => {
                self.tracker.finish();
                Err(FrqiError::BatchAborted { message: format!("Failed to spawn coordinator: {}", e) })
            }
        }
    }

    /// Runs `job` to completion on the calling thread's behalf.
    pub fn run_batch(&self, job: BatchJob) -> Result<BatchReport, FrqiError> {
        self.start_batch(job)?.join()
    }
}

/// A batch running in the background.
pub struct BatchHandle {
    handle: JoinHandle<BatchReport>,
    tracker: Arc<ProgressTracker>,
}

impl BatchHandle {
    pub fn progress(&self) -> ProgressState {
        self.tracker.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the batch and returns its report.
    ///
    /// # Errors
    /// `FrqiError::BatchAborted` if the coordinator panicked.
    pub fn join(self) -> Result<BatchReport, FrqiError> {
        self.handle.join().map_err(|_| {
            self.tracker.finish();
            FrqiError::BatchAborted { message: "Batch coordinator panicked".to_string() }
        })
    }
}

/// Fans the job out over the pool and folds each image's scores into the
/// running totals as it arrives.
fn coordinate(
    dataset: &dyn Dataset,
    simulator: &dyn MeasurementSimulator,
    pool: WorkerPool,
    tracker: &ProgressTracker,
    job: BatchJob,
) -> BatchReport {
    let size = job.size();
    log::info!(
        "Starting batch of {} images: metric {}, {} shot counts, {} workers",
        size,
        job.metric,
        job.shot_counts.len(),
        pool.workers()
    );

    let mut sums = vec![0.0; job.shot_counts.len()];
    let mut rows = Vec::new();
    let mut evaluations = Vec::new();
    let mut failures = Vec::new();

    pool.run(
        job.indices(),
        |index| evaluate_item(dataset, simulator, job.metric, &job.shot_counts, index),
        |outcome| {
            match outcome {
                Ok(evaluation) => {
                    for (sum, score) in sums.iter_mut().zip(&evaluation.scores) {
                        *sum += score;
                    }
                    rows.extend_from_slice(&evaluation.rows);
                    evaluations.push(evaluation);
                }
                Err(failure) => {
                    log::warn!("Skipping image {}: {}", failure.image_index, failure.reason);
                    failures.push(failure);
                }
            }
            let done = tracker.record_completion();
            log::debug!("Batch progress {}/{}", done, size);
        },
    );

    let averages = job
        .shot_counts
        .iter()
        .zip(&sums)
        .map(|(&shots, sum)| ShotAverage { shots, average: sum / size as f64 })
        .collect();
    rows.sort_by_key(|row| (row.image_index, row.shots));
    evaluations.sort_by_key(|e| e.image_index);
    failures.sort_by_key(|f| f.image_index);

    tracker.finish();
    log::info!("Batch finished: {} evaluated, {} skipped", evaluations.len(), failures.len());

    BatchReport { job, averages, rows, evaluations, failures }
}
