// src/simulation/engine.rs
use crate::core::{FrqiError, QubitId, StateVector};
use crate::operations::Operation;
use num_complex::Complex;
use num_traits::Zero;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::f64::consts::FRAC_1_SQRT_2;

/// Dense state-vector engine evolving a register under circuit operations.
/// (Internal visibility)
pub(crate) struct SimulationEngine {
    /// Maps qubit IDs to their bit position (0..N-1) in a basis index.
    qubit_bits: HashMap<QubitId, usize>,
    /// Amplitudes over all 2^N basis states.
    state: StateVector,
    num_qubits: usize,
}

type Matrix2 = [[Complex<f64>; 2]; 2];

impl SimulationEngine {
    /// Initializes the register in |0...0>. Qubits are assigned bit positions in
    /// ascending ID order, so the lowest ID is the least significant bit.
    pub(crate) fn init(qubits: &BTreeSet<QubitId>) -> Result<Self, FrqiError> {
        if qubits.is_empty() {
            return Err(FrqiError::simulation("Cannot initialize simulation engine with zero qubits"));
        }
        let num_qubits = qubits.len();
        let dim = u32::try_from(num_qubits)
            .ok()
            .and_then(|n| 1usize.checked_shl(n))
            .filter(|dim| *dim > 0)
            .ok_or_else(|| FrqiError::simulation("Number of qubits too large, state vector dimension overflows usize"))?;

        let qubit_bits = qubits.iter().enumerate().map(|(bit, q)| (*q, bit)).collect();

        let mut initial = vec![Complex::zero(); dim];
        initial[0] = Complex::new(1.0, 0.0);

        Ok(Self { qubit_bits, state: StateVector::new(initial), num_qubits })
    }

    pub(crate) fn state(&self) -> &StateVector {
        &self.state
    }

    pub(crate) fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Applies a single non-measurement operation.
    pub(crate) fn apply_operation(&mut self, op: &Operation) -> Result<(), FrqiError> {
        match op {
            Operation::Hadamard { target } => {
                let bit = self.bit_of(target)?;
                self.apply_single_qubit_gate(bit, &hadamard_matrix(), 0);
            }
            Operation::Flip { targets } => {
                for target in targets {
                    let bit = self.bit_of(target)?;
                    self.apply_single_qubit_gate(bit, &flip_matrix(), 0);
                }
            }
            Operation::ControlledRotation { controls, target, theta } => {
                let target_bit = self.bit_of(target)?;
                let mut control_mask = 0usize;
                for control in controls {
                    let bit = self.bit_of(control)?;
                    if bit == target_bit {
                        return Err(FrqiError::simulation(format!(
                            "Qubit {} cannot be both control and target of a rotation",
                            target
                        )));
                    }
                    if control_mask & (1 << bit) != 0 {
                        return Err(FrqiError::simulation(format!("Control qubit {} listed twice", control)));
                    }
                    control_mask |= 1 << bit;
                }
                self.apply_single_qubit_gate(target_bit, &ry_matrix(*theta), control_mask);
            }
            Operation::Measure { .. } => {
                return Err(FrqiError::simulation("Measure should not be passed directly to apply_operation"));
            }
        }
        Ok(())
    }

    /// Probability of each outcome of the measured qubits, keyed by bit string
    /// with the highest qubit first. Unmeasured qubits are traced out.
    pub(crate) fn outcome_probabilities(&self, targets: &[QubitId]) -> Result<BTreeMap<String, f64>, FrqiError> {
        let mut bits: Vec<usize> = targets.iter().map(|q| self.bit_of(q)).collect::<Result<_, _>>()?;
        bits.sort_unstable_by(|a, b| b.cmp(a));
        bits.dedup();

        let mut outcomes = BTreeMap::new();
        for (index, amplitude) in self.state.vector().iter().enumerate() {
            let p = amplitude.norm_sqr();
            if p == 0.0 {
                continue;
            }
            let key: String = bits.iter().map(|bit| if index & (1 << bit) != 0 { '1' } else { '0' }).collect();
            *outcomes.entry(key).or_insert(0.0) += p;
        }
        Ok(outcomes)
    }

    fn bit_of(&self, qubit: &QubitId) -> Result<usize, FrqiError> {
        self.qubit_bits
            .get(qubit)
            .copied()
            .ok_or_else(|| FrqiError::simulation(format!("Qubit {} not found in simulation context", qubit)))
    }

    /// Applies a 2x2 matrix to the qubit at `bit`, restricted to basis states
    /// whose bits in `control_mask` are all set. A zero mask is unconditional.
    fn apply_single_qubit_gate(&mut self, bit: usize, matrix: &Matrix2, control_mask: usize) {
        let k_mask = 1usize << bit;
        let amplitudes = self.state.vector_mut();

        // Visit each pair (|..0..>, |..1..>) once via its target-0 member
        for i0 in 0..amplitudes.len() {
            if i0 & k_mask != 0 || i0 & control_mask != control_mask {
                continue;
            }
            let i1 = i0 | k_mask;
            let psi_0 = amplitudes[i0];
            let psi_1 = amplitudes[i1];
            amplitudes[i0] = matrix[0][0] * psi_0 + matrix[0][1] * psi_1;
            amplitudes[i1] = matrix[1][0] * psi_0 + matrix[1][1] * psi_1;
        }
    }
}

fn hadamard_matrix() -> Matrix2 {
    [
        [Complex::new(FRAC_1_SQRT_2, 0.0), Complex::new(FRAC_1_SQRT_2, 0.0)],
        [Complex::new(FRAC_1_SQRT_2, 0.0), Complex::new(-FRAC_1_SQRT_2, 0.0)],
    ]
}

fn flip_matrix() -> Matrix2 {
    [
        [Complex::zero(), Complex::new(1.0, 0.0)],
        [Complex::new(1.0, 0.0), Complex::zero()],
    ]
}

/// RY(theta) = [[cos(a), -sin(a)], [sin(a), cos(a)]] with a = theta / 2.
fn ry_matrix(theta: f64) -> Matrix2 {
    let (sin_a, cos_a) = (theta / 2.0).sin_cos();
    [
        [Complex::new(cos_a, 0.0), Complex::new(-sin_a, 0.0)],
        [Complex::new(sin_a, 0.0), Complex::new(cos_a, 0.0)],
    ]
}
