// src/operations/mod.rs

//! Defines the elementary operations an encoding circuit is made of.
//!
//! The set covers what the branch-addressed encoding emits: uniform
//! superposition, bit toggles and a multi-controlled rotation on the value
//! qubit, followed by the final measurement.

use crate::core::QubitId;

/// A single step of a circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Hadamard on one qubit. Applied to every position qubit it produces
    /// the uniform superposition over all branch indices.
    Hadamard {
        /// The qubit put into superposition.
        target: QubitId,
    },

    /// Unconditional bit flip (X) on each listed qubit.
    /// Used to relabel the position register so that the next branch reads
    /// as all-ones on the control lines.
    Flip {
        /// Qubits flipped in this step. Order is irrelevant, flips commute.
        targets: Vec<QubitId>,
    },

    /// RY(`theta`) on `target`, applied only to basis states where every
    /// control qubit is 1.
    ///
    /// Analogy: `RYGate(theta).control(n)` in circuit toolkits.
    ControlledRotation {
        /// Control lines, all tested for the value 1.
        controls: Vec<QubitId>,
        /// The rotated qubit.
        target: QubitId,
        /// Rotation angle in radians (twice the encoded pixel angle).
        theta: f64,
    },

    /// Measures the listed qubits in the computational basis.
    /// Must be the last operation of a circuit.
    Measure {
        /// Measured qubits.
        targets: Vec<QubitId>,
    },
}

impl Operation {
    /// Returns all qubit IDs mentioned by the operation.
    pub fn involved_qubits(&self) -> Vec<QubitId> {
        match self {
            Operation::Hadamard { target } => vec![*target],
            Operation::Flip { targets } => targets.clone(),
            Operation::ControlledRotation { controls, target, .. } => {
                let mut qubits = controls.clone();
                qubits.push(*target);
                qubits
            }
            Operation::Measure { targets } => targets.clone(),
        }
    }

    /// `true` for the terminal measurement instruction.
    pub fn is_measurement(&self) -> bool {
        matches!(self, Operation::Measure { .. })
    }
}
