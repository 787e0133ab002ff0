// src/core/mod.rs

//! Core data structures and types

pub mod error;
pub mod image;
pub mod state;

pub use error::{FrqiError, QubitId};
pub use image::{Image, ensure_same_shape};
pub use state::StateVector;

pub mod constants;
pub use constants::frqi_constants::{
    BRANCH_COUNT, IMAGE_SIDE, INTENSITY_MAX, POSITION_QUBITS, TOTAL_QUBITS, VALUE_QUBIT,
};
