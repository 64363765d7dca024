//! Block-level colour summaries of targets and tiles
//!
//! An image is reduced to a grid of per-block mean colours in one pass over
//! its pixels. Tiles are summarized at a finer granularity: a tile of side
//! `S` matched at block size `B` is split into `B x B` sub-blocks of side
//! `S / B`, so each sub-block lines up with one pixel of a target block.

use image::Rgb;
use log::debug;
use ndarray::Array2;
use num_traits::ToPrimitive;
use rayon::prelude::*;

use crate::io::error::{MosaicError, Result};
use crate::spatial::grid::{BlockGrid, PixelBuffer, checked_grid_dimensions};
use crate::spatial::tiles::{Tile, TileId};

/// Per-channel arithmetic mean of a block, kept unrounded
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AvgColour {
    /// Mean red value
    pub red: f64,
    /// Mean green value
    pub green: f64,
    /// Mean blue value
    pub blue: f64,
}

impl AvgColour {
    /// Create a colour from channel means
    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }

    /// Exact colour of a single pixel
    pub fn from_pixel(pixel: Rgb<u8>) -> Self {
        let [red, green, blue] = pixel.0;
        Self::new(f64::from(red), f64::from(green), f64::from(blue))
    }

    /// Mean of the three channels
    pub fn brightness(&self) -> f64 {
        (self.red + self.green + self.blue) / 3.0
    }

    /// Nearest displayable pixel, rounding each channel into `0..=255`
    pub fn to_pixel(&self) -> Rgb<u8> {
        Rgb([
            round_channel(self.red),
            round_channel(self.green),
            round_channel(self.blue),
        ])
    }
}

fn round_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0).to_u8().unwrap_or(0)
}

/// Reduce an image to per-block mean colours
///
/// Blocks are laid out in raster order from the top-left corner. Pixels
/// beyond the last full block row or column are ignored.
///
/// # Errors
///
/// Returns `BlockTooLarge` if the block size is zero or exceeds either
/// image dimension
pub fn summarize(image: &PixelBuffer, block_size: u32) -> Result<BlockGrid<AvgColour>> {
    let (rows, cols) = checked_grid_dimensions(image, block_size)?;
    let covered_width = cols as u32 * block_size;
    let covered_height = rows as u32 * block_size;

    let mut sums = Array2::from_elem((rows, cols), [0_u64; 3]);
    for (x, y, pixel) in image.enumerate_pixels() {
        if x >= covered_width || y >= covered_height {
            continue;
        }
        let cell_index = ((y / block_size) as usize, (x / block_size) as usize);
        if let Some(cell) = sums.get_mut(cell_index) {
            for (total, &channel) in cell.iter_mut().zip(pixel.0.iter()) {
                *total += u64::from(channel);
            }
        }
    }

    let pixel_count = f64::from(block_size) * f64::from(block_size);
    Ok(BlockGrid::from_array(sums.map(|[red, green, blue]| {
        AvgColour::new(
            *red as f64 / pixel_count,
            *green as f64 / pixel_count,
            *blue as f64 / pixel_count,
        )
    })))
}

/// A tile reduced to a `block_size x block_size` grid of sub-block colours
#[derive(Debug, Clone, PartialEq)]
pub struct TileSummary {
    tile: TileId,
    tile_side: u32,
    block_size: u32,
    colours: BlockGrid<AvgColour>,
}

impl TileSummary {
    /// Summarize a normalized tile for matching at the given block size
    ///
    /// # Errors
    ///
    /// Returns `BlockTooLarge` if the tile is smaller than the block size
    pub fn new(tile: &Tile, block_size: u32) -> Result<Self> {
        let side = tile.side();
        if block_size == 0 || side < block_size {
            return Err(MosaicError::BlockTooLarge {
                block_size,
                width: side,
                height: side,
            });
        }
        let sub_block = side / block_size;
        let colours = summarize(tile.pixels(), sub_block)?;
        Ok(Self {
            tile: tile.id(),
            tile_side: side,
            block_size,
            colours,
        })
    }

    /// Build a summary from precomputed sub-block colours
    pub const fn from_parts(
        tile: TileId,
        tile_side: u32,
        block_size: u32,
        colours: BlockGrid<AvgColour>,
    ) -> Self {
        Self {
            tile,
            tile_side,
            block_size,
            colours,
        }
    }

    /// Tile this summary describes
    pub const fn tile(&self) -> TileId {
        self.tile
    }

    /// Side length of the summarized tile in pixels
    pub const fn tile_side(&self) -> u32 {
        self.tile_side
    }

    /// Block size the summary was computed for
    pub const fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Sub-block colours, one per pixel of a target block
    pub const fn colours(&self) -> &BlockGrid<AvgColour> {
        &self.colours
    }

    /// Mean colour of the whole tile
    pub fn mean_colour(&self) -> AvgColour {
        let count = self.colours.len().max(1) as f64;
        let total = self
            .colours
            .iter()
            .fold(AvgColour::default(), |acc, colour| {
                AvgColour::new(
                    acc.red + colour.red,
                    acc.green + colour.green,
                    acc.blue + colour.blue,
                )
            });
        AvgColour::new(total.red / count, total.green / count, total.blue / count)
    }
}

/// Summarize every tile in parallel, keeping input order
///
/// # Errors
///
/// Returns the first tile's `BlockTooLarge` error, in input order
pub fn summarize_tiles(tiles: &[Tile], block_size: u32) -> Result<Vec<TileSummary>> {
    debug!("Summarizing {} tiles at block size {block_size}", tiles.len());
    tiles
        .par_iter()
        .map(|tile| TileSummary::new(tile, block_size))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}
