//! Block grids laid over pixel buffers
//!
//! A block grid partitions an image into non-overlapping square blocks in
//! raster order. Pixels past the last full block on either axis belong to
//! no cell and are never summarized or matched.

use image::RgbImage;
use ndarray::Array2;

use crate::io::error::{MosaicError, Result};

/// Row-major RGB8 pixel buffer used for targets, tiles and the output canvas
pub type PixelBuffer = RgbImage;

/// Number of full blocks that fit along each axis, as `(rows, cols)`
///
/// Returns `(0, 0)` for a zero block size.
pub const fn grid_dimensions(width: u32, height: u32, block_size: u32) -> (usize, usize) {
    if block_size == 0 {
        return (0, 0);
    }
    ((height / block_size) as usize, (width / block_size) as usize)
}

/// Grid dimensions of an image, rejecting block sizes that leave it empty
///
/// # Errors
///
/// Returns `BlockTooLarge` if the block size is zero or exceeds either
/// image dimension
pub fn checked_grid_dimensions(image: &PixelBuffer, block_size: u32) -> Result<(usize, usize)> {
    let (rows, cols) = grid_dimensions(image.width(), image.height(), block_size);
    if rows == 0 || cols == 0 {
        return Err(MosaicError::BlockTooLarge {
            block_size,
            width: image.width(),
            height: image.height(),
        });
    }
    Ok((rows, cols))
}

/// A 2D array with one value per block of some source image
#[derive(Debug, Clone, PartialEq)]
pub struct BlockGrid<T> {
    cells: Array2<T>,
}

impl<T> BlockGrid<T> {
    /// Wrap an existing `(rows, cols)` array
    pub const fn from_array(cells: Array2<T>) -> Self {
        Self { cells }
    }

    /// Build a grid from values listed in raster order
    ///
    /// # Errors
    ///
    /// Returns a computation error if the value count is not `rows * cols`
    pub fn from_raster(rows: usize, cols: usize, values: Vec<T>) -> Result<Self> {
        let count = values.len();
        Array2::from_shape_vec((rows, cols), values)
            .map(Self::from_array)
            .map_err(|e| MosaicError::Computation {
                operation: "block grid construction",
                reason: format!("{count} values for a {rows}x{cols} grid: {e}"),
            })
    }

    /// Number of block rows
    pub fn rows(&self) -> usize {
        self.cells.nrows()
    }

    /// Number of block columns
    pub fn cols(&self) -> usize {
        self.cells.ncols()
    }

    /// Grid dimensions as `(rows, cols)`
    pub fn dim(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at the given block row and column
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.cells.get((row, col))
    }

    /// Iterate cells in raster order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Iterate `(row, col, cell)` in raster order
    pub fn indexed_iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        self.cells
            .indexed_iter()
            .map(|((row, col), cell)| (row, col, cell))
    }

    /// Apply a function to every cell, keeping the layout
    pub fn map<U, F>(&self, f: F) -> BlockGrid<U>
    where
        F: FnMut(&T) -> U,
    {
        BlockGrid {
            cells: self.cells.map(f),
        }
    }

    /// Borrow the underlying array
    pub const fn as_array(&self) -> &Array2<T> {
        &self.cells
    }
}

/// Pixel origin `(x, y)` of a block within its source image
pub const fn block_origin(row: usize, col: usize, block_size: u32) -> (u32, u32) {
    (col as u32 * block_size, row as u32 * block_size)
}
