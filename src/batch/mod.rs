// src/batch/mod.rs

//! Concurrent evaluation of many images across a sweep of shot counts.
//!
//! A `BatchScheduler` fans a `BatchJob` out over a `WorkerPool`. Each worker
//! encodes, samples, decodes and scores one image; the coordinating thread
//! folds the per-image results into per-shot averages and keeps the shared
//! `ProgressTracker` current. A failing image never aborts its batch.

mod dataset;
mod job;
mod pool;
mod progress;
mod scheduler;
mod worker;

pub use dataset::{Dataset, InMemoryDataset};
pub use job::{BatchJob, ImageSelection, ShotSchedule};
pub use pool::WorkerPool;
pub use progress::{BatchStatus, ProgressState, ProgressTracker};
pub use scheduler::{BatchConfig, BatchHandle, BatchReport, BatchScheduler, MAX_MISSING_IMAGES};
pub use worker::{ImageEvaluation, ItemFailure, ItemOutcome, ScoreRow, ShotAverage, evaluate_image};
