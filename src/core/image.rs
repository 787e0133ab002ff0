// src/core/image.rs

use super::error::FrqiError;
use serde::Serialize;
use std::fmt;

/// A grayscale intensity grid stored row-major.
///
/// Inputs to the encoder are 8x8; reconstructions produced by the decoder use
/// the same type so that metrics can compare the two directly. Once built an
/// `Image` is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Image {
    rows: usize,
    cols: usize,
    pixels: Vec<u8>,
}

impl Image {
    /// Builds an image from row-major intensities.
    ///
    /// # Errors
    /// `FrqiError::InvalidInput` if the grid is empty or `pixels.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, pixels: Vec<u8>) -> Result<Self, FrqiError> {
        if rows == 0 || cols == 0 {
            return Err(FrqiError::invalid_input(format!("Image shape {}x{} has no pixels", rows, cols)));
        }
        if pixels.len() != rows * cols {
            return Err(FrqiError::invalid_input(format!(
                "Image shape {}x{} needs {} pixels, got {}",
                rows,
                cols,
                rows * cols,
                pixels.len()
            )));
        }
        Ok(Self { rows, cols, pixels })
    }

    /// Builds an image from arbitrary integers, rejecting anything outside [0, 255].
    pub fn from_values(rows: usize, cols: usize, values: &[i64]) -> Result<Self, FrqiError> {
        let mut pixels = Vec::with_capacity(values.len());
        for (index, &value) in values.iter().enumerate() {
            let pixel = u8::try_from(value).map_err(|_| {
                FrqiError::invalid_input(format!("Pixel {} has intensity {} outside [0, 255]", index, value))
            })?;
            pixels.push(pixel);
        }
        Self::new(rows, cols, pixels)
    }

    /// An image where every pixel has the same intensity.
    pub fn uniform(rows: usize, cols: usize, value: u8) -> Result<Self, FrqiError> {
        Self::new(rows, cols, vec![value; rows * cols])
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Row-major intensities.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Intensity at `(row, col)`, `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        if row < self.rows && col < self.cols {
            Some(self.pixels[row * self.cols + col])
        } else {
            None
        }
    }

    /// Intensities scaled to [0, 1].
    pub fn normalized(&self) -> Vec<f64> {
        self.pixels.iter().map(|&p| f64::from(p) / 255.0).collect()
    }

    /// Per-pixel absolute difference, as shown next to a reconstruction.
    pub fn abs_diff(&self, other: &Image) -> Result<Image, FrqiError> {
        ensure_same_shape(self, other)?;
        let pixels = self.pixels.iter().zip(&other.pixels).map(|(a, b)| a.abs_diff(*b)).collect();
        Ok(Image { rows: self.rows, cols: self.cols, pixels })
    }
}

/// Fails with `ShapeMismatch` unless both grids have the same dimensions.
pub fn ensure_same_shape(expected: &Image, found: &Image) -> Result<(), FrqiError> {
    if expected.shape() != found.shape() {
        return Err(FrqiError::ShapeMismatch { expected: expected.shape(), found: found.shape() });
    }
    Ok(())
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.pixels.chunks(self.cols) {
            let line: Vec<String> = row.iter().map(|p| format!("{:>3}", p)).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_length() {
        let err = Image::new(8, 8, vec![0; 63]).unwrap_err();
        assert!(matches!(err, FrqiError::InvalidInput { .. }));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut values = vec![10i64; 64];
        values[5] = 256;
        assert!(matches!(Image::from_values(8, 8, &values), Err(FrqiError::InvalidInput { .. })));
        values[5] = -1;
        assert!(matches!(Image::from_values(8, 8, &values), Err(FrqiError::InvalidInput { .. })));
    }

    #[test]
    fn test_abs_diff() -> Result<(), FrqiError> {
        let a = Image::new(1, 3, vec![10, 200, 0])?;
        let b = Image::new(1, 3, vec![20, 100, 0])?;
        assert_eq!(a.abs_diff(&b)?.pixels(), &[10, 100, 0]);

        let c = Image::uniform(3, 1, 0)?;
        assert_eq!(
            a.abs_diff(&c),
            Err(FrqiError::ShapeMismatch { expected: (1, 3), found: (3, 1) })
        );
        Ok(())
    }

    #[test]
    fn test_get_is_row_major() -> Result<(), FrqiError> {
        let img = Image::new(2, 2, vec![1, 2, 3, 4])?;
        assert_eq!(img.get(1, 0), Some(3));
        assert_eq!(img.get(2, 0), None);
        Ok(())
    }
}
