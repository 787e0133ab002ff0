// src/lib.rs

//! `frqi` - Flexible Representation of Quantum Images for 8x8 greyscale images
//!
//! This library encodes pixel intensities as rotation angles, builds the
//! branch-addressed encoding circuit, samples it on a state-vector simulator,
//! decodes the measurement statistics back into an image and scores the
//! reconstruction. Batches of images are evaluated concurrently across a
//! sweep of shot counts.

pub mod core;
pub mod operations;
pub mod circuits;
pub mod encoding;
pub mod simulation;
pub mod decoding;
pub mod metrics;
pub mod validation;
pub mod batch;

// Re-export the most common types for easier top-level use
pub use crate::core::{FrqiError, Image, QubitId, StateVector};
pub use operations::Operation;
pub use circuits::{Circuit, CircuitBuilder};
pub use encoding::{AngleVector, Encoding, encode_angles};
pub use simulation::{FrequencyTable, MeasurementSimulator, OutcomeDistribution, Simulator, SimulatorConfig};
pub use decoding::{decode, decode_distribution};
pub use metrics::{MetricKind, image_entropy, mae_fidelity, ssim, state_fidelity, weighted_mae_fidelity};
pub use validation::{check_branch_probabilities, check_normalization};
pub use batch::{
    BatchConfig, BatchJob, BatchReport, BatchScheduler, BatchStatus, Dataset, InMemoryDataset,
    ProgressState, ShotSchedule, evaluate_image,
};

// Example 1: Ideal round trip of a single image
// Encodes a mid-gray image, evolves the circuit exactly and decodes the
// infinite-shot distribution.
/// ```
/// use frqi::{Encoding, FrqiError, Image, Simulator, decode_distribution, state_fidelity};
///
/// # fn main() -> Result<(), FrqiError> {
/// let image = Image::uniform(8, 8, 128)?;
/// let encoding = Encoding::from_image(&image)?;
///
/// // asin(128 / 255)
/// assert!((encoding.angles().as_slice()[0] - 0.5528).abs() < 1e-3);
///
/// let distribution = Simulator::new().probabilities(encoding.circuit())?;
/// let reconstructed = decode_distribution(&distribution)?;
///
/// assert!(reconstructed.pixels().iter().all(|&p| p.abs_diff(128) <= 2));
/// assert!((state_fidelity(&image, &reconstructed)? - 1.0).abs() < 1e-9);
/// # Ok(())
/// # }
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item

// Example 2: Sampled reconstruction
// Runs the encoding circuit for a finite number of shots and scores the result.
/// ```
/// use frqi::{Encoding, FrqiError, Image, MeasurementSimulator, MetricKind, Simulator, decode};
///
/// # fn main() -> Result<(), FrqiError> {
/// let pixels: Vec<u8> = (0..64u32).map(|i| (i * 4) as u8).collect();
/// let image = Image::new(8, 8, pixels)?;
/// let encoding = Encoding::from_image(&image)?;
///
/// let simulator = Simulator::seeded(42);
/// let table = simulator.run(encoding.circuit(), 4000)?;
/// assert_eq!(table.total(), 4000);
///
/// let reconstructed = decode(&table, 4000)?;
/// let score = MetricKind::Mae.score(&image, &reconstructed)?;
/// assert!(score > 0.8 && score <= 1.0);
/// # Ok(())
/// # }
/// ```
#[doc(hidden)]
const _: () = ();

// Example 3: A small concurrent batch
/// ```
/// use frqi::{BatchConfig, BatchJob, BatchScheduler, BatchStatus, FrqiError, InMemoryDataset, MetricKind};
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), FrqiError> {
/// let rows: Vec<Vec<i64>> = (0..5).map(|i| vec![i * 50; 64]).collect();
/// let dataset = Arc::new(InMemoryDataset::from_rows(&rows)?);
///
/// let config = BatchConfig::from_json_str(r#"{"workers": 2, "simulator": {"seed": 7}}"#)?;
/// let scheduler = BatchScheduler::with_simulator_config(dataset, &config);
///
/// let report = scheduler.run_batch(BatchJob::range(0, 5, MetricKind::WeightedMae, vec![100, 1000]))?;
/// assert_eq!(report.averages.len(), 2);
/// assert_eq!(scheduler.progress().status, BatchStatus::Done);
/// # Ok(())
/// # }
/// ```
#[doc(hidden)]
const _: () = ();
