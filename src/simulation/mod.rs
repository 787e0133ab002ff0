// src/simulation/mod.rs

//! Executes encoding circuits and samples measurement outcomes.
//!
//! The rest of the crate only depends on the `MeasurementSimulator` trait: a
//! stochastic oracle turning `(circuit, shots)` into a `FrequencyTable`.
//! `Simulator` is the bundled dense state-vector backend.

mod results;
pub(crate) mod engine;

pub use results::{FrequencyTable, OutcomeDistribution};

use crate::circuits::Circuit;
use crate::core::{FrqiError, QubitId};
use crate::operations::Operation;
use crate::validation::check_normalization;
use engine::SimulationEngine;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Produces a frequency table for a circuit sampled `shots` times.
///
/// Implementations must be shareable across worker threads.
pub trait MeasurementSimulator: Send + Sync {
    /// Runs `circuit` and returns how often each measured outcome occurred.
    ///
    /// # Errors
    /// Implementations report unusable circuits or internal failures as
    /// `FrqiError::SimulationFailure`, and `shots == 0` as `FrqiError::InvalidInput`.
    fn run(&self, circuit: &Circuit, shots: u64) -> Result<FrequencyTable, FrqiError>;
}

/// Settings of the state-vector backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Base seed for reproducible sampling. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

/// Dense state-vector simulator with multinomial shot sampling.
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    config: SimulatorConfig,
}

impl Simulator {
    /// Creates a simulator seeded from OS entropy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// Creates a simulator whose runs are reproducible for a given circuit and shot count.
    ///
    /// The sampling stream is a function of the seed, the shot count and the
    /// circuit's outcome distribution only. Two runs of identical circuits at
    /// the same shot count therefore return identical counts, so identical
    /// images in one batch share their sampling noise rather than drawing
    /// independent samples. Use an unseeded simulator for independent draws.
    pub fn seeded(seed: u64) -> Self {
        Self::with_config(SimulatorConfig { seed: Some(seed) })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Exact outcome probabilities of the circuit's terminal measurement.
    ///
    /// # Errors
    /// `FrqiError::SimulationFailure` if the circuit is empty, does not end in
    /// exactly one measurement, references qubits inconsistently, or evolves
    /// into a non-normalized state.
    pub fn probabilities(&self, circuit: &Circuit) -> Result<OutcomeDistribution, FrqiError> {
        let (gates, measured) = split_measurement(circuit)?;

        let mut engine = SimulationEngine::init(circuit.qubits())?;
        for op in gates {
            engine.apply_operation(op)?;
        }
        check_normalization(engine.state(), None)
            .map_err(|e| FrqiError::simulation(format!("State evolved out of normalization: {}", e)))?;

        log::trace!("Evolved {} operations over {} qubits", gates.len(), engine.num_qubits());
        Ok(OutcomeDistribution::from_map(engine.outcome_probabilities(measured)?))
    }

    fn rng_for(&self, distribution: &OutcomeDistribution, shots: u64) -> StdRng {
        match self.config.seed {
            Some(base) => StdRng::seed_from_u64(derive_seed(base, shots, distribution)),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Folds the base seed, shot count and every `(outcome, probability)` pair
/// into one 64-bit seed with SplitMix64 steps.
///
/// The derivation is fixed arithmetic, so a given input yields the same seed
/// on every toolchain. The sample stream built from it follows `StdRng` and is
/// stable for a given `rand` release.
fn derive_seed(base: u64, shots: u64, distribution: &OutcomeDistribution) -> u64 {
    let mut state = mix(mix(base, 0), shots);
    for (outcome, p) in distribution.iter() {
        let bytes = outcome.as_bytes();
        state = mix(state, bytes.len() as u64);
        for chunk in bytes.chunks(8) {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            state = mix(state, u64::from_le_bytes(word));
        }
        state = mix(state, p.to_bits());
    }
    state
}

fn mix(state: u64, value: u64) -> u64 {
    let mut z = (state ^ value).wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl MeasurementSimulator for Simulator {
    fn run(&self, circuit: &Circuit, shots: u64) -> Result<FrequencyTable, FrqiError> {
        if shots == 0 {
            return Err(FrqiError::invalid_input("Shot count must be positive"));
        }
        let distribution = self.probabilities(circuit)?;
        let mut rng = self.rng_for(&distribution, shots);
        Ok(sample(&distribution, shots, &mut rng))
    }
}

/// Separates the gate sequence from the terminal measurement.
fn split_measurement(circuit: &Circuit) -> Result<(&[Operation], &[QubitId]), FrqiError> {
    let Some((last, gates)) = circuit.operations().split_last() else {
        return Err(FrqiError::simulation("Cannot simulate an empty circuit"));
    };
    let Operation::Measure { targets } = last else {
        return Err(FrqiError::simulation("Circuit must end with a measurement"));
    };
    if targets.is_empty() {
        return Err(FrqiError::simulation("Measurement names no qubits"));
    }
    if gates.iter().any(Operation::is_measurement) {
        return Err(FrqiError::simulation("Only a single terminal measurement is supported"));
    }
    Ok((gates, targets))
}

/// Draws `shots` outcomes by inverse-CDF sampling over the distribution.
fn sample<R: Rng>(distribution: &OutcomeDistribution, shots: u64, rng: &mut R) -> FrequencyTable {
    let mut outcomes: Vec<&str> = Vec::with_capacity(distribution.len());
    let mut cumulative: Vec<f64> = Vec::with_capacity(distribution.len());
    let mut running = 0.0;
    for (outcome, p) in distribution.iter() {
        if p > 0.0 {
            running += p;
            outcomes.push(outcome);
            cumulative.push(running);
        }
    }

    let mut table = FrequencyTable::new(shots);
    if outcomes.is_empty() {
        return table;
    }
    let last = outcomes.len() - 1;
    for _ in 0..shots {
        let u = rng.random::<f64>() * running;
        let index = cumulative.partition_point(|&c| c <= u).min(last);
        table.increment(outcomes[index]);
    }
    table
}
