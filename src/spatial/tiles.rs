//! Tile normalization into a uniform square size
//!
//! Raw tile images arrive with arbitrary dimensions. Each is optionally
//! pre-scaled, cropped to a centered square, trimmed so its side divides
//! evenly by the block size, and finally resampled to the smallest side
//! found across the set. After normalization every tile shares one side
//! length and can be compared cell-by-cell against a target block.

use std::fmt;

use image::imageops::{self, FilterType};
use log::debug;
use rayon::prelude::*;

use crate::io::error::{MosaicError, Result, degenerate_tile, invalid_parameter};
use crate::spatial::grid::PixelBuffer;

// Bilinear keeps resampling deterministic and identical for every tile
const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

/// Opaque handle to a tile: its position in the supplied tile sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TileId(pub usize);

impl TileId {
    /// Position of the tile in the supplied sequence
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized square tile
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    id: TileId,
    pixels: PixelBuffer,
}

impl Tile {
    /// Wrap a pixel buffer as a tile
    ///
    /// # Errors
    ///
    /// Returns `DegenerateTile` if the buffer is empty or not square
    pub fn new(id: TileId, pixels: PixelBuffer) -> Result<Self> {
        let (width, height) = pixels.dimensions();
        if width == 0 || width != height {
            return Err(degenerate_tile(
                id.index(),
                width,
                height,
                &"tiles must be non-empty squares",
            ));
        }
        Ok(Self { id, pixels })
    }

    /// Identifier of this tile
    pub const fn id(&self) -> TileId {
        self.id
    }

    /// Tile pixels
    pub const fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Side length in pixels
    pub fn side(&self) -> u32 {
        self.pixels.width()
    }
}

/// Result of normalizing a tile set
#[derive(Debug, Clone)]
pub struct NormalizedTiles {
    /// Tiles in input order, all `common_side` pixels square
    pub tiles: Vec<Tile>,
    /// Shared side length, a multiple of the block size
    pub common_side: u32,
}

/// Normalize raw tile images for matching at the given block size
///
/// # Errors
///
/// Returns an error if:
/// - No tiles are supplied (`EmptyTileSet`)
/// - The block size is zero (`InvalidParameter`)
/// - Any tile has a zero dimension or is too small to hold one block
///   (`DegenerateTile`)
pub fn normalize(raw_tiles: &[PixelBuffer], block_size: u32) -> Result<NormalizedTiles> {
    normalize_with_reduction(raw_tiles, block_size, 1.0)
}

/// Normalize raw tiles after dividing their dimensions by a reduction factor
///
/// # Errors
///
/// Returns the errors of [`normalize`], plus `InvalidParameter` for a
/// reduction factor below 1 and `DegenerateTile` when the reduction leaves
/// a tile with a zero dimension.
pub fn normalize_with_reduction(
    raw_tiles: &[PixelBuffer],
    block_size: u32,
    size_reduction_factor: f64,
) -> Result<NormalizedTiles> {
    if raw_tiles.is_empty() {
        return Err(MosaicError::EmptyTileSet);
    }
    if block_size == 0 {
        return Err(invalid_parameter(
            "block_size",
            &block_size,
            &"must be greater than zero",
        ));
    }
    if !size_reduction_factor.is_finite() || size_reduction_factor < 1.0 {
        return Err(invalid_parameter(
            "size_reduction_factor",
            &size_reduction_factor,
            &"must be a finite value of at least 1",
        ));
    }

    // Collected per tile first so the reported error is always the earliest one
    let squares = raw_tiles
        .par_iter()
        .enumerate()
        .map(|(index, raw)| square_tile(index, raw, block_size, size_reduction_factor))
        .collect::<Vec<_>>()
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    let (smallest, common_side) = squares
        .iter()
        .map(PixelBuffer::width)
        .enumerate()
        .min_by_key(|&(_, side)| side)
        .ok_or(MosaicError::EmptyTileSet)?;

    if common_side < block_size {
        return Err(degenerate_tile(
            smallest,
            common_side,
            common_side,
            &format!("common side {common_side} is smaller than block size {block_size}"),
        ));
    }

    debug!(
        "Normalizing {} tiles to {common_side}x{common_side}",
        squares.len()
    );

    let tiles = resize_all(squares, common_side);
    Ok(NormalizedTiles { tiles, common_side })
}

/// Resample every tile to a new side length, keeping ids and order
///
/// Tiles already at the requested side are kept as-is.
pub fn resize_tiles(tiles: Vec<Tile>, side: u32) -> Vec<Tile> {
    tiles
        .into_par_iter()
        .map(|tile| {
            if tile.side() == side {
                tile
            } else {
                Tile {
                    id: tile.id,
                    pixels: imageops::resize(&tile.pixels, side, side, RESAMPLE_FILTER),
                }
            }
        })
        .collect()
}

fn resize_all(squares: Vec<PixelBuffer>, side: u32) -> Vec<Tile> {
    let tiles = squares
        .into_iter()
        .enumerate()
        .map(|(index, pixels)| Tile {
            id: TileId(index),
            pixels,
        })
        .collect();
    resize_tiles(tiles, side)
}

// Pre-scale, crop and trim one raw tile
fn square_tile(
    index: usize,
    raw: &PixelBuffer,
    block_size: u32,
    size_reduction_factor: f64,
) -> Result<PixelBuffer> {
    let (width, height) = raw.dimensions();
    if width == 0 || height == 0 {
        return Err(degenerate_tile(
            index,
            width,
            height,
            &"image has a zero dimension",
        ));
    }

    let reduced = reduce_size(index, raw, size_reduction_factor)?;
    let square = crop_to_square(&reduced);
    trim_to_block_multiple(index, &square, block_size)
}

fn reduce_size(index: usize, raw: &PixelBuffer, factor: f64) -> Result<PixelBuffer> {
    if factor <= 1.0 {
        return Ok(raw.clone());
    }

    let (width, height) = raw.dimensions();
    let reduced_width = (f64::from(width) / factor).floor() as u32;
    let reduced_height = (f64::from(height) / factor).floor() as u32;
    if reduced_width == 0 || reduced_height == 0 {
        return Err(degenerate_tile(
            index,
            reduced_width,
            reduced_height,
            &format!("size reduction by {factor} leaves a zero dimension"),
        ));
    }

    Ok(imageops::resize(
        raw,
        reduced_width,
        reduced_height,
        RESAMPLE_FILTER,
    ))
}

/// Crop an image to a centered square on its shorter side
///
/// When the margin is odd the extra pixel is removed from the trailing edge.
pub fn crop_to_square(image: &PixelBuffer) -> PixelBuffer {
    let (width, height) = image.dimensions();
    let side = width.min(height);
    let x = (width - side) / 2;
    let y = (height - side) / 2;
    imageops::crop_imm(image, x, y, side, side).to_image()
}

fn trim_to_block_multiple(index: usize, square: &PixelBuffer, block_size: u32) -> Result<PixelBuffer> {
    let side = square.width();
    if side < block_size {
        return Err(degenerate_tile(
            index,
            side,
            side,
            &format!("square side {side} is smaller than block size {block_size}"),
        ));
    }

    let excess = side % block_size;
    if excess == 0 {
        return Ok(square.clone());
    }

    let trimmed = side - excess;
    let offset = excess / 2;
    Ok(imageops::crop_imm(square, offset, offset, trimmed, trimmed).to_image())
}
