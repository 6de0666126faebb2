//! # Fingerprint Module
//!
//! Reduces an image to a grid of averaged colors.
//!
//! ## How It Works
//! 1. Split the raster into `rows x cols` cells (default 32x32)
//! 2. Average each color channel over every pixel in a cell
//! 3. Quantize deeper samples down to 8 bits
//! 4. Emit the cells row by row as `(r, g, b)` byte triples
//!
//! The result is 3072 bytes for the default grid, small enough to store next
//! to every photo and cheap to compare byte by byte.
//!
//! ## Example
//! ```rust,ignore
//! use pdupe::core::fingerprint::{ExtractorConfig, ImageFingerprinter, FingerprintSource};
//!
//! let extractor = ExtractorConfig::new().grid(16, 16).build()?;
//! let fingerprinter = ImageFingerprinter::new(extractor);
//! let fingerprint = fingerprinter.fingerprint(&path)?;
//! ```

mod extractor;
mod source;

pub use extractor::GridExtractor;
pub use source::{FingerprintSource, ImageFingerprinter};

use crate::error::{ConfigError, ValidationError};
use serde::{Deserialize, Serialize};

/// Default number of grid rows and columns
pub const DEFAULT_GRID: u32 = 32;

/// Grid resolution used for sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: u32,
    pub cols: u32,
}

impl GridSize {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Number of cells in the grid
    pub fn cells(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Number of bytes in a fingerprint for this grid
    pub fn byte_len(&self) -> usize {
        self.cells() * 3
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::new(DEFAULT_GRID, DEFAULT_GRID)
    }
}

/// An image summarized as averaged grid colors
///
/// Immutable once built: either freshly extracted or decoded from a sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    name: String,
    path: String,
    size: i64,
    cells: Vec<u8>,
}

impl Fingerprint {
    /// Build a fingerprint, checking it against the grid it claims to cover.
    pub fn new(
        name: impl Into<String>,
        size: i64,
        cells: Vec<u8>,
        grid: GridSize,
    ) -> Result<Self, ValidationError> {
        validate(&cells, grid)?;
        let name = name.into();
        Ok(Self {
            path: name.clone(),
            name,
            size,
            cells,
        })
    }

    /// Replace the display path (used when loading from a sidecar).
    pub(crate) fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Path of the source image when the fingerprint was taken
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path used to identify and display this fingerprint
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Byte length of the source file
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Row-major `(r, g, b)` bytes
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Number of bytes
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Check the structural invariant of fingerprint bytes.
///
/// The length must match the grid exactly and at least one byte must be
/// nonzero; an all-black result usually means a blank or failed decode.
pub fn validate(cells: &[u8], grid: GridSize) -> Result<(), ValidationError> {
    let expected = grid.byte_len();
    if cells.len() != expected {
        return Err(ValidationError::WrongLength {
            expected,
            actual: cells.len(),
        });
    }
    if cells.iter().all(|&b| b == 0) {
        return Err(ValidationError::Blank);
    }
    Ok(())
}

/// Configuration builder for extractors
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    grid: GridSize,
}

impl ExtractorConfig {
    /// Create a new extractor configuration with the default 32x32 grid
    pub fn new() -> Self {
        Self {
            grid: GridSize::default(),
        }
    }

    /// Set the grid resolution
    ///
    /// Finer grids discriminate better but cost more to store and compare.
    pub fn grid(mut self, rows: u32, cols: u32) -> Self {
        self.grid = GridSize::new(rows, cols);
        self
    }

    /// Build the extractor
    pub fn build(self) -> Result<GridExtractor, ConfigError> {
        if self.grid.rows == 0 || self.grid.cols == 0 {
            return Err(ConfigError::InvalidGrid(format!(
                "{}x{} has no cells",
                self.grid.cols, self.grid.rows
            )));
        }
        Ok(GridExtractor::new(self.grid))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_is_32_by_32() {
        let grid = GridSize::default();
        assert_eq!(grid.cells(), 1024);
        assert_eq!(grid.byte_len(), 3072);
    }

    #[test]
    fn validate_rejects_wrong_length() {
        let result = validate(&[1, 2, 3], GridSize::new(2, 2));
        assert_eq!(
            result,
            Err(ValidationError::WrongLength {
                expected: 12,
                actual: 3
            })
        );
    }

    #[test]
    fn validate_rejects_all_zero() {
        let result = validate(&vec![0; 12], GridSize::new(2, 2));
        assert_eq!(result, Err(ValidationError::Blank));
    }

    #[test]
    fn validate_does_not_wrap_byte_sum() {
        // 768 bytes of 1 sum to 0 in a wrapping u8 but are clearly not blank
        let grid = GridSize::new(1, 256);
        let cells = vec![1u8; grid.byte_len()];
        assert!(validate(&cells, grid).is_ok());
    }

    #[test]
    fn new_fingerprint_uses_name_as_path() {
        let fp = Fingerprint::new("/a.jpg", 10, vec![1; 3], GridSize::new(1, 1)).unwrap();
        assert_eq!(fp.path(), "/a.jpg");
        assert_eq!(fp.name(), "/a.jpg");
        assert_eq!(fp.size(), 10);
    }

    #[test]
    fn config_rejects_empty_grid() {
        assert!(ExtractorConfig::new().grid(0, 32).build().is_err());
    }

    #[test]
    fn config_builder_sets_grid() {
        let extractor = ExtractorConfig::new().grid(8, 4).build().unwrap();
        assert_eq!(extractor.grid(), GridSize::new(8, 4));
    }
}
