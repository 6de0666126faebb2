//! Grid color extraction.

use super::{validate, Fingerprint, GridSize};
use crate::core::decoder::RasterImage;
use crate::error::ValidationError;

/// Pixel bounds of one cell, half-open on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellBounds {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CellBounds {
    fn pixel_count(&self) -> u64 {
        (self.x1 - self.x0) as u64 * (self.y1 - self.y0) as u64
    }
}

/// Extracts averaged grid colors from a raster
#[derive(Debug, Clone, Copy)]
pub struct GridExtractor {
    grid: GridSize,
}

impl GridExtractor {
    pub fn new(grid: GridSize) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    /// Extract a fingerprint for the image identified by `name`.
    ///
    /// Either the whole grid is produced and validated, or an error is
    /// returned; there is no partial result.
    pub fn extract(
        &self,
        raster: &RasterImage,
        name: &str,
        size: i64,
    ) -> Result<Fingerprint, ValidationError> {
        let cells = self.extract_cells(raster)?;
        Fingerprint::new(name, size, cells, self.grid)
    }

    /// Row-major `(r, g, b)` bytes for every cell of the grid
    pub fn extract_cells(&self, raster: &RasterImage) -> Result<Vec<u8>, ValidationError> {
        let (width, height) = (raster.width(), raster.height());
        let GridSize { rows, cols } = self.grid;

        if rows == 0 || cols == 0 {
            return Err(ValidationError::EmptyGrid);
        }
        if width < cols || height < rows {
            return Err(ValidationError::RasterTooSmall {
                width,
                height,
                rows,
                cols,
            });
        }

        let mut cells = Vec::with_capacity(self.grid.byte_len());
        for row in 0..rows {
            for col in 0..cols {
                let bounds = cell_bounds(self.grid, width, height, row, col);
                cells.extend_from_slice(&cell_color(raster, bounds));
            }
        }

        validate(&cells, self.grid)?;
        Ok(cells)
    }
}

/// Bounds of cell `(row, col)`.
///
/// Cells are `width / cols` by `height / rows` pixels; the last column and
/// last row stretch to the raster edge so remainder pixels are never dropped.
pub(crate) fn cell_bounds(grid: GridSize, width: u32, height: u32, row: u32, col: u32) -> CellBounds {
    let cell_w = width / grid.cols;
    let cell_h = height / grid.rows;

    let x0 = col * cell_w;
    let y0 = row * cell_h;
    let x1 = if col + 1 == grid.cols { width } else { x0 + cell_w };
    let y1 = if row + 1 == grid.rows { height } else { y0 + cell_h };

    CellBounds { x0, y0, x1, y1 }
}

/// Mean color of one cell, quantized to 8 bits per channel.
fn cell_color(raster: &RasterImage, bounds: CellBounds) -> [u8; 3] {
    let sums = raster.channel_sums(bounds.x0, bounds.y0, bounds.x1, bounds.y1);
    let count = bounds.pixel_count().max(1);
    let depth = raster.bit_depth();
    sums.map(|sum| quantize(sum / count, depth))
}

/// Drop the low-order bits of a sample deeper than 8 bits (truncation).
fn quantize(sample: u64, depth: u8) -> u8 {
    let shift = depth.saturating_sub(8) as u32;
    (sample >> shift).min(u8::MAX as u64) as u8
}
