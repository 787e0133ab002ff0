//! Constants fixing the shape of the encoding.

/// Constants shared by the encoder, the decoder and the metrics.
pub mod frqi_constants {
    /// Side length of a square input image.
    pub const IMAGE_SIDE: usize = 8;
    /// Number of qubits addressing a branch (pixel).
    pub const POSITION_QUBITS: usize = 6;
    /// Number of addressable branches, `2^POSITION_QUBITS`.
    pub const BRANCH_COUNT: usize = 1 << POSITION_QUBITS;
    /// Index of the value qubit, placed right above the position register.
    pub const VALUE_QUBIT: usize = POSITION_QUBITS;
    /// Total qubits in the encoding circuit.
    pub const TOTAL_QUBITS: usize = POSITION_QUBITS + 1;
    /// Largest pixel intensity.
    pub const INTENSITY_MAX: f64 = 255.0;

    /// Factor turning an estimated branch amplitude back into an intensity.
    ///
    /// A branch carries `sin(angle) / sqrt(BRANCH_COUNT)` on the value qubit, so
    /// the inverse is `sqrt(BRANCH_COUNT) * INTENSITY_MAX` (8 * 255 for 64 branches).
    pub fn decode_scale() -> f64 {
        (BRANCH_COUNT as f64).sqrt() * INTENSITY_MAX
    }
}
