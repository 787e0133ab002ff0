// src/encoding/mod.rs

//! Angle encoding of pixel intensities and construction of the
//! branch-addressed encoding circuit.
//!
//! Pixel `j` becomes the angle `arcsin(p_j / 255)`. The circuit puts the six
//! position qubits into uniform superposition and then, branch by branch,
//! rotates the value qubit by `2 * angle_j` under a six-fold control that
//! always tests the all-ones pattern. Between branches the position register
//! is relabelled by flipping the bits where `code(j - 1)` and `code(j)` differ,
//! so the all-ones test lands on a different branch each step. After the last
//! branch the accumulated relabelling maps every branch back onto its own
//! index, hence measuring `value = 1, position = j` happens with probability
//! `sin^2(angle_j) / 64`.

use crate::circuits::{Circuit, CircuitBuilder};
use crate::core::{BRANCH_COUNT, FrqiError, IMAGE_SIDE, INTENSITY_MAX, Image, POSITION_QUBITS, QubitId, VALUE_QUBIT};
use crate::operations::Operation;
use std::f64::consts::FRAC_PI_2;

/// Slack allowed when validating externally supplied angles.
const ANGLE_TOLERANCE: f64 = 1e-12;

/// One rotation angle per pixel, each in [0, pi/2], in branch order.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleVector(Vec<f64>);

impl AngleVector {
    /// Wraps precomputed angles, e.g. those handed over by a dataset loader.
    ///
    /// # Errors
    /// `FrqiError::InvalidInput` unless there are exactly `BRANCH_COUNT` finite
    /// angles inside [0, pi/2].
    pub fn from_angles(angles: Vec<f64>) -> Result<Self, FrqiError> {
        if angles.len() != BRANCH_COUNT {
            return Err(FrqiError::invalid_input(format!(
                "Expected {} angles, got {}",
                BRANCH_COUNT,
                angles.len()
            )));
        }
        for (j, &angle) in angles.iter().enumerate() {
            if !angle.is_finite() || angle < -ANGLE_TOLERANCE || angle > FRAC_PI_2 + ANGLE_TOLERANCE {
                return Err(FrqiError::invalid_input(format!(
                    "Angle {} for branch {} is outside [0, pi/2]",
                    angle, j
                )));
            }
        }
        Ok(Self(angles))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Maps an 8x8 image to its per-pixel rotation angles.
///
/// # Errors
/// `FrqiError::InvalidInput` if the image is not 8x8 or a normalized intensity
/// leaves the domain of `arcsin`.
pub fn encode_angles(image: &Image) -> Result<AngleVector, FrqiError> {
    if image.shape() != (IMAGE_SIDE, IMAGE_SIDE) {
        return Err(FrqiError::invalid_input(format!(
            "Encoder expects a {}x{} image, got {}x{}",
            IMAGE_SIDE,
            IMAGE_SIDE,
            image.rows(),
            image.cols()
        )));
    }
    let mut angles = Vec::with_capacity(BRANCH_COUNT);
    for (j, &pixel) in image.pixels().iter().enumerate() {
        let normalized = f64::from(pixel) / INTENSITY_MAX;
        if !(-1.0..=1.0).contains(&normalized) {
            return Err(FrqiError::invalid_input(format!(
                "Pixel {} normalizes to {}, outside the arcsin domain",
                j, normalized
            )));
        }
        angles.push(normalized.asin());
    }
    Ok(AngleVector(angles))
}

/// Position bits that change between branch `j - 1` and branch `j`.
///
/// Empty for branch 0, which is addressed without any toggle.
pub fn toggled_bits(branch: usize) -> Vec<QubitId> {
    if branch == 0 {
        return Vec::new();
    }
    let diff = (branch - 1) ^ branch;
    (0..POSITION_QUBITS).filter(|bit| diff & (1 << bit) != 0).map(QubitId).collect()
}

/// Measurement key for a value bit and a branch index: the value bit first,
/// then the position code most significant bit first, e.g. `"1000101"`.
pub fn outcome_key(value: bool, branch: usize) -> String {
    format!("{}{:0width$b}", u8::from(value), branch, width = POSITION_QUBITS)
}

/// The position qubits, lowest first.
pub fn position_qubits() -> Vec<QubitId> {
    (0..POSITION_QUBITS).map(QubitId).collect()
}

/// The complete encoding of one image: its angles and the circuit realizing them.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    angles: AngleVector,
    circuit: Circuit,
}

impl Encoding {
    /// Builds the encoding circuit for the given angles.
    pub fn new(angles: AngleVector) -> Self {
        let positions = position_qubits();
        let value = QubitId(VALUE_QUBIT);

        let mut builder = CircuitBuilder::new()
            .add_ops(positions.iter().map(|&target| Operation::Hadamard { target }));

        for (branch, &angle) in angles.as_slice().iter().enumerate() {
            let flips = toggled_bits(branch);
            if !flips.is_empty() {
                builder = builder.add_op(Operation::Flip { targets: flips });
            }
            builder = builder.add_op(Operation::ControlledRotation {
                controls: positions.clone(),
                target: value,
                theta: 2.0 * angle,
            });
        }

        let mut measured = positions;
        measured.push(value);
        let circuit = builder.add_op(Operation::Measure { targets: measured }).build();

        Self { angles, circuit }
    }

    /// Encodes an image directly.
    pub fn from_image(image: &Image) -> Result<Self, FrqiError> {
        Ok(Self::new(encode_angles(image)?))
    }

    pub fn angles(&self) -> &AngleVector {
        &self.angles
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// The flipped position bits before each branch's rotation, in branch order.
    pub fn toggle_steps(&self) -> Vec<Vec<QubitId>> {
        (0..self.angles.len()).map(toggled_bits).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angles_for_mid_gray() -> Result<(), FrqiError> {
        let angles = encode_angles(&Image::uniform(8, 8, 128)?)?;
        assert_eq!(angles.len(), 64);
        for &a in angles.as_slice() {
            assert!((a - 0.5528).abs() < 1e-3, "angle {}", a);
        }
        Ok(())
    }

    #[test]
    fn test_extremes_map_to_domain_edges() -> Result<(), FrqiError> {
        let mut pixels = vec![0u8; 64];
        pixels[63] = 255;
        let angles = encode_angles(&Image::new(8, 8, pixels)?)?;
        assert_eq!(angles.as_slice()[0], 0.0);
        assert!((angles.as_slice()[63] - FRAC_PI_2).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_rejects_wrong_shape() -> Result<(), FrqiError> {
        let err = encode_angles(&Image::uniform(4, 4, 10)?).unwrap_err();
        assert!(matches!(err, FrqiError::InvalidInput { .. }));
        Ok(())
    }

    #[test]
    fn test_from_angles_validates() {
        assert!(AngleVector::from_angles(vec![0.1; 63]).is_err());
        assert!(AngleVector::from_angles(vec![2.0; 64]).is_err());
        assert!(AngleVector::from_angles(vec![f64::NAN; 64]).is_err());
        assert!(AngleVector::from_angles(vec![FRAC_PI_2; 64]).is_ok());
    }

    #[test]
    fn test_toggled_bits_follow_binary_increment() {
        assert!(toggled_bits(0).is_empty());
        assert_eq!(toggled_bits(1), vec![QubitId(0)]);
        assert_eq!(toggled_bits(2), vec![QubitId(0), QubitId(1)]);
        assert_eq!(toggled_bits(3), vec![QubitId(0)]);
        assert_eq!(toggled_bits(32), (0..6).map(QubitId).collect::<Vec<_>>());
    }

    #[test]
    fn test_toggles_accumulate_to_branch_index() {
        // XOR of all flips applied up to branch j equals j itself.
        let mut register = 0usize;
        for branch in 0..BRANCH_COUNT {
            for QubitId(bit) in toggled_bits(branch) {
                register ^= 1 << bit;
            }
            assert_eq!(register, branch);
        }
    }

    #[test]
    fn test_circuit_layout() -> Result<(), FrqiError> {
        let encoding = Encoding::from_image(&Image::uniform(8, 8, 77)?)?;
        let ops = encoding.circuit().operations();
        // 6 H + 64 rotations + 63 toggles + 1 measurement
        assert_eq!(ops.len(), 6 + 64 + 63 + 1);
        assert!(ops[..6].iter().all(|op| matches!(op, Operation::Hadamard { .. })));
        assert!(matches!(ops[6], Operation::ControlledRotation { .. }));
        assert!(ops.last().is_some_and(Operation::is_measurement));

        for op in ops {
            if let Operation::ControlledRotation { controls, target, .. } = op {
                assert_eq!(controls, &position_qubits());
                assert_eq!(*target, QubitId(VALUE_QUBIT));
            }
        }
        let thetas: Vec<f64> = encoding.circuit().rotation_angles().collect();
        for (theta, angle) in thetas.iter().zip(encoding.angles().as_slice()) {
            assert!((theta - 2.0 * angle).abs() < 1e-15);
        }
        assert_eq!(encoding.toggle_steps().len(), 64);
        Ok(())
    }

    #[test]
    fn test_outcome_key_format() {
        assert_eq!(outcome_key(true, 5), "1000101");
        assert_eq!(outcome_key(false, 63), "0111111");
    }
}
