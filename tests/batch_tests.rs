// tests/batch_tests.rs

use frqi::batch::{ImageSelection, ProgressState};
use frqi::{
    BatchConfig, BatchJob, BatchScheduler, BatchStatus, Circuit, Dataset, FrequencyTable, FrqiError,
    InMemoryDataset, MeasurementSimulator, MetricKind, Simulator, evaluate_image,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

const SEED: u64 = 1234;

// Fails every circuit whose first branch encodes a black pixel
struct BlackCornerFails {
    inner: Simulator,
}

impl MeasurementSimulator for BlackCornerFails {
    fn run(&self, circuit: &Circuit, shots: u64) -> Result<FrequencyTable, FrqiError> {
        if circuit.rotation_angles().next() == Some(0.0) {
            return Err(FrqiError::SimulationFailure { message: "backend rejected circuit".to_string() });
        }
        self.inner.run(circuit, shots)
    }
}

// Panics instead of failing
struct BlackCornerPanics {
    inner: Simulator,
}

impl MeasurementSimulator for BlackCornerPanics {
    fn run(&self, circuit: &Circuit, shots: u64) -> Result<FrequencyTable, FrqiError> {
        if circuit.rotation_angles().next() == Some(0.0) {
            panic!("backend crashed");
        }
        self.inner.run(circuit, shots)
    }
}

// Counts calls and sleeps to keep the batch observable
struct SlowCounting {
    inner: Simulator,
    calls: AtomicUsize,
    delay: Duration,
}

impl MeasurementSimulator for SlowCounting {
    fn run(&self, circuit: &Circuit, shots: u64) -> Result<FrequencyTable, FrqiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        self.inner.run(circuit, shots)
    }
}

// Blocks every run until the gate is opened
struct Gated {
    inner: Simulator,
    open: Mutex<bool>,
    signal: Condvar,
}

impl Gated {
    fn open(&self) {
        *self.open.lock().expect("gate lock") = true;
        self.signal.notify_all();
    }
}

impl MeasurementSimulator for Gated {
    fn run(&self, circuit: &Circuit, shots: u64) -> Result<FrequencyTable, FrqiError> {
        let mut open = self.open.lock().expect("gate lock");
        while !*open {
            open = self.signal.wait(open).expect("gate lock");
        }
        drop(open);
        self.inner.run(circuit, shots)
    }
}

// Dataset of `n` images; those listed in `black_corner` start with a 0 pixel
fn dataset(n: usize, black_corner: &[usize]) -> Arc<InMemoryDataset> {
    let rows: Vec<Vec<i64>> = (0..n)
        .map(|i| {
            let mut row: Vec<i64> = (0..64).map(|p| ((p * 3 + i as i64 * 17) % 250) + 5).collect();
            if black_corner.contains(&i) {
                row[0] = 0;
            }
            row
        })
        .collect();
    Arc::new(InMemoryDataset::from_rows(&rows).expect("valid rows"))
}

fn config(workers: usize) -> BatchConfig {
    BatchConfig { workers, ..BatchConfig::default() }
}

#[test]
fn test_failed_images_count_against_nominal_size() -> Result<(), FrqiError> {
    let n = 8;
    let failing = [1, 4, 6];
    let data = dataset(n, &failing);
    let shots = vec![200, 1000, 2000];
    let simulator = Arc::new(BlackCornerFails { inner: Simulator::seeded(SEED) });
    let scheduler = BatchScheduler::new(data.clone(), simulator, &config(4));

    let report = scheduler.run_batch(BatchJob::range(0, n, MetricKind::Mae, shots.clone()))?;

    assert_eq!(scheduler.progress(), ProgressState { done: n, total: n, status: BatchStatus::Done });
    let failed: Vec<usize> = report.failures.iter().map(|f| f.image_index).collect();
    assert_eq!(failed, failing.to_vec());
    assert!(report.failures.iter().all(|f| f.reason.contains("backend rejected circuit")));

    // Recompute the valid scores independently; seeded runs do not depend on thread order
    let reference = Simulator::seeded(SEED);
    let mut sums = vec![0.0; shots.len()];
    for index in (0..n).filter(|i| !failing.contains(i)) {
        let evaluation = evaluate_image(index, &data.load(index)?, &reference, MetricKind::Mae, &shots)?;
        for (sum, score) in sums.iter_mut().zip(&evaluation.scores) {
            *sum += score;
        }
    }
    for (average, sum) in report.averages.iter().zip(&sums) {
        assert!((average.average - sum / n as f64).abs() < 1e-12, "{} shots", average.shots);
    }
    assert_eq!(report.rows.len(), (n - failing.len()) * shots.len());
    Ok(())
}

#[test]
fn test_panicking_worker_does_not_abort_batch() -> Result<(), FrqiError> {
    let n = 5;
    let simulator = Arc::new(BlackCornerPanics { inner: Simulator::seeded(SEED) });
    let scheduler = BatchScheduler::new(dataset(n, &[2]), simulator, &config(2));

    let report = scheduler.run_batch(BatchJob::range(0, n, MetricKind::Ssim, vec![500]))?;
    assert_eq!(report.succeeded(), 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].image_index, 2);
    assert!(report.failures[0].reason.contains("backend crashed"));
    assert_eq!(scheduler.progress().status, BatchStatus::Done);
    Ok(())
}

#[test]
fn test_empty_batch_rejected_before_any_work() {
    let simulator = Arc::new(SlowCounting {
        inner: Simulator::seeded(SEED),
        calls: AtomicUsize::new(0),
        delay: Duration::ZERO,
    });
    let scheduler = BatchScheduler::new(dataset(3, &[]), simulator.clone(), &config(4));

    let result = scheduler.start_batch(BatchJob::range(0, 0, MetricKind::Mae, vec![100]));
    assert!(matches!(result, Err(FrqiError::InvalidInput { .. })));
    assert_eq!(scheduler.progress(), ProgressState::IDLE);
    assert_eq!(simulator.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_progress_can_be_polled_while_running() -> Result<(), FrqiError> {
    let n = 12;
    let simulator = Arc::new(SlowCounting {
        inner: Simulator::seeded(SEED),
        calls: AtomicUsize::new(0),
        delay: Duration::from_millis(10),
    });
    let scheduler = BatchScheduler::new(dataset(n, &[]), simulator.clone(), &config(3));
    let handle = scheduler.start_batch(BatchJob::range(0, n, MetricKind::WeightedMae, vec![100, 300]))?;

    let mut last_done = 0;
    while !handle.is_finished() {
        let state = scheduler.progress();
        assert_eq!(state.total, n);
        assert!(state.done >= last_done && state.done <= n);
        if state.status == BatchStatus::Done {
            assert_eq!(state.done, n);
        }
        last_done = state.done;
        thread::sleep(Duration::from_millis(2));
    }

    let report = handle.join()?;
    assert_eq!(report.succeeded(), n);
    assert_eq!(simulator.calls.load(Ordering::SeqCst), n * 2);
    assert_eq!(scheduler.progress(), ProgressState { done: n, total: n, status: BatchStatus::Done });
    Ok(())
}

#[test]
fn test_second_batch_rejected_while_running() -> Result<(), FrqiError> {
    let simulator = Arc::new(Gated {
        inner: Simulator::seeded(SEED),
        open: Mutex::new(false),
        signal: Condvar::new(),
    });
    let scheduler = BatchScheduler::new(dataset(4, &[]), simulator.clone(), &config(2));

    let first = scheduler.start_batch(BatchJob::range(0, 4, MetricKind::Mae, vec![100]))?;
    let second = scheduler.start_batch(BatchJob::range(0, 2, MetricKind::Mae, vec![100]));
    assert!(matches!(second, Err(FrqiError::BatchInProgress { total: 4, .. })));

    simulator.open();
    let report = first.join()?;
    assert_eq!(report.succeeded(), 4);

    // Once done, the tracker accepts a new batch
    let again = scheduler.run_batch(BatchJob::range(2, 2, MetricKind::Mae, vec![100]))?;
    assert_eq!(again.succeeded(), 2);
    assert_eq!(scheduler.progress(), ProgressState { done: 2, total: 2, status: BatchStatus::Done });
    Ok(())
}

#[test]
fn test_sampled_job_covers_distinct_images() -> Result<(), FrqiError> {
    let data = dataset(20, &[]);
    let scheduler = BatchScheduler::with_simulator_config(data.clone(), &BatchConfig::default());
    let job = BatchJob::sample(data.len(), 5, MetricKind::StateFidelity, vec![400], Some(9))?;
    let ImageSelection::Indices(expected) = job.selection.clone() else {
        panic!("sampled job uses explicit indices");
    };

    let report = scheduler.run_batch(job)?;
    let evaluated: Vec<usize> = report.evaluations.iter().map(|e| e.image_index).collect();
    assert_eq!(evaluated, expected);
    assert!(report.averages[0].average > 0.3 && report.averages[0].average <= 1.0);
    Ok(())
}

#[test]
fn test_report_serializes_to_json() -> Result<(), FrqiError> {
    let scheduler = BatchScheduler::new(dataset(2, &[]), Arc::new(Simulator::seeded(SEED)), &config(1));
    let report = scheduler.run_batch(BatchJob::range(0, 2, MetricKind::Mae, vec![100]))?;
    let json = serde_json::to_value(&report).expect("serializable report");
    assert_eq!(json["job"]["metric"], "mae");
    assert_eq!(json["averages"][0]["shots"], 100);
    assert_eq!(json["rows"].as_array().map(Vec::len), Some(2));
    Ok(())
}
