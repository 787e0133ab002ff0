// src/batch/dataset.rs

use crate::core::{FrqiError, IMAGE_SIDE, Image};
use crate::encoding::{AngleVector, encode_angles};

/// Source of images keyed by a stable integer index.
pub trait Dataset: Send + Sync {
    /// Number of images in the catalog.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads image `index`. Must be deterministic.
    ///
    /// # Errors
    /// `FrqiError::InvalidInput` when the index is out of range.
    fn load(&self, index: usize) -> Result<Image, FrqiError>;

    /// Loads image `index` together with its rotation angles.
    fn load_encoded(&self, index: usize) -> Result<(Image, AngleVector), FrqiError> {
        let image = self.load(index)?;
        let angles = encode_angles(&image)?;
        Ok((image, angles))
    }
}

/// A dataset held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    images: Vec<Image>,
}

impl InMemoryDataset {
    pub fn new(images: Vec<Image>) -> Self {
        Self { images }
    }

    /// Builds a dataset of `IMAGE_SIDE` x `IMAGE_SIDE` images from flattened
    /// rows, the layout of image catalogs. Every row is validated.
    pub fn from_rows(rows: &[Vec<i64>]) -> Result<Self, FrqiError> {
        let images = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                Image::from_values(IMAGE_SIDE, IMAGE_SIDE, row)
                    .map_err(|e| FrqiError::invalid_input(format!("Row {}: {}", i, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { images })
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.images.len()
    }

    fn load(&self, index: usize) -> Result<Image, FrqiError> {
        self.images.get(index).cloned().ok_or_else(|| {
            FrqiError::invalid_input(format!("Image index {} out of range for {} images", index, self.images.len()))
        })
    }
}
