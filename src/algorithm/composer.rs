//! Assignment of tiles to target blocks and rendering of the final canvas
//!
//! Composition walks every full block of the target, asks the matcher for
//! the best tile and records the answer in an assignment grid. Blocks are
//! independent, so matching runs on the rayon pool against the shared,
//! read-only matcher. Rendering then copies each assigned tile into its own
//! square of the canvas; worker threads own disjoint row bands.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use image::imageops;
use log::{debug, info};
use rayon::prelude::*;

use crate::algorithm::blend::blend_tile;
use crate::algorithm::matcher::{ChannelMetric, MatchStrategy, TileMatcher};
use crate::analysis::summary::TileSummary;
use crate::io::configuration::MAX_CANVAS_DIMENSION;
use crate::io::error::{MosaicError, Result, computation_error};
use crate::spatial::grid::{BlockGrid, PixelBuffer, block_origin, checked_grid_dimensions};
use crate::spatial::tiles::{Tile, TileId};

/// Chosen tile per target block
pub type AssignmentGrid = BlockGrid<TileId>;

/// Cooperative cancellation checked between block matches
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    /// Create an unraised flag
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Ask running compositions to stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Assignment grid together with the canvas it renders to
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// Tile chosen for each target block, in raster order
    pub assignments: AssignmentGrid,
    /// Canvas width in pixels (`cols * tile_side`)
    pub canvas_width: u32,
    /// Canvas height in pixels (`rows * tile_side`)
    pub canvas_height: u32,
    /// Side of every placed tile
    pub tile_side: u32,
}

impl Composition {
    /// Canvas size as `(width, height)`
    pub const fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }
}

/// Canvas size for a block grid, as `(width, height)`
///
/// # Errors
///
/// Returns `CanvasTooLarge` if either side would exceed `max_dimension`
pub fn canvas_size(grid: (usize, usize), tile_side: u32, max_dimension: u32) -> Result<(u32, u32)> {
    let (rows, cols) = grid;
    let width = cols as u64 * u64::from(tile_side);
    let height = rows as u64 * u64::from(tile_side);
    if width > u64::from(max_dimension) || height > u64::from(max_dimension) {
        return Err(MosaicError::CanvasTooLarge {
            width,
            height,
            max_dimension,
        });
    }
    Ok((width as u32, height as u32))
}

/// Largest tile side, at most `tile_side`, whose canvas fits `max_dimension`
///
/// The result stays a multiple of the block size so tiles still split into
/// whole sub-blocks.
///
/// # Errors
///
/// Returns `CanvasTooLarge` if even a tile of one block does not fit
pub fn fit_tile_side(
    grid: (usize, usize),
    tile_side: u32,
    block_size: u32,
    max_dimension: u32,
) -> Result<u32> {
    let longest = grid.0.max(grid.1).max(1) as u64;
    let allowed = (u64::from(max_dimension) / longest).min(u64::from(tile_side)) as u32;
    let fitted = allowed - allowed % block_size.max(1);
    if fitted < block_size || fitted == 0 {
        let (rows, cols) = grid;
        return Err(MosaicError::CanvasTooLarge {
            width: cols as u64 * u64::from(block_size),
            height: rows as u64 * u64::from(block_size),
            max_dimension,
        });
    }
    Ok(fitted)
}

/// Assign a tile to every block of the target using default matching
///
/// Uses the two-channel metric, exhaustive search and the standard canvas
/// limit.
///
/// # Errors
///
/// Returns an error if:
/// - No summaries are supplied (`EmptyTileSummarySet`)
/// - A summary was computed for another block size (`BlockSizeMismatch`)
/// - The block size exceeds a target dimension (`BlockTooLarge`)
/// - The canvas would exceed the limit (`CanvasTooLarge`)
pub fn compose(
    target: &PixelBuffer,
    summaries: &[TileSummary],
    block_size: u32,
) -> Result<Composition> {
    let matcher = TileMatcher::new(
        summaries.to_vec(),
        block_size,
        ChannelMetric::default(),
        MatchStrategy::default(),
    )?;
    MosaicComposer::new(&matcher).compose(target)
}

/// Drives block matching and canvas rendering for one tile set
#[derive(Debug, Clone, Copy)]
pub struct MosaicComposer<'a> {
    matcher: &'a TileMatcher,
    max_canvas_dimension: u32,
    cancel: Option<&'a CancelFlag>,
}

impl<'a> MosaicComposer<'a> {
    /// Composer with the standard canvas limit and no cancellation
    pub const fn new(matcher: &'a TileMatcher) -> Self {
        Self {
            matcher,
            max_canvas_dimension: MAX_CANVAS_DIMENSION,
            cancel: None,
        }
    }

    /// Override the maximum canvas side
    #[must_use]
    pub const fn with_max_canvas_dimension(mut self, max_canvas_dimension: u32) -> Self {
        self.max_canvas_dimension = max_canvas_dimension;
        self
    }

    /// Check the given flag between block matches
    #[must_use]
    pub const fn with_cancel_flag(mut self, cancel: &'a CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Assign a tile to every full block of the target
    ///
    /// # Errors
    ///
    /// See [`MosaicComposer::compose_observed`]
    pub fn compose(&self, target: &PixelBuffer) -> Result<Composition> {
        self.compose_observed(target, |_| {})
    }

    /// Assign tiles, reporting the running count of matched blocks
    ///
    /// The observer may be called from several threads at once.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The block size exceeds a target dimension (`BlockTooLarge`)
    /// - The canvas would exceed the limit (`CanvasTooLarge`)
    /// - The cancel flag was raised (`Cancelled`)
    pub fn compose_observed<F>(&self, target: &PixelBuffer, observer: F) -> Result<Composition>
    where
        F: Fn(usize) + Sync,
    {
        let block_size = self.matcher.block_size();
        let tile_side = self.matcher.tile_side();
        let (rows, cols) = checked_grid_dimensions(target, block_size)?;
        let (canvas_width, canvas_height) =
            canvas_size((rows, cols), tile_side, self.max_canvas_dimension)?;

        let total = rows * cols;
        info!(
            "Matching {rows}x{cols} blocks against {} tiles",
            self.matcher.summaries().len()
        );

        let completed = AtomicUsize::new(0);
        let results: Vec<Result<TileId>> = (0..total)
            .into_par_iter()
            .map(|index| {
                if self.cancel.is_some_and(CancelFlag::is_cancelled) {
                    return Err(MosaicError::Cancelled {
                        completed: completed.load(Ordering::Relaxed),
                        total,
                    });
                }
                let (x, y) = block_origin(index / cols, index % cols, block_size);
                let block = imageops::crop_imm(target, x, y, block_size, block_size);
                let found = self.matcher.best_match(&*block)?;
                observer(completed.fetch_add(1, Ordering::Relaxed) + 1);
                Ok(found.tile)
            })
            .collect();

        let tiles = results.into_iter().collect::<Result<Vec<_>>>()?;
        let assignments = AssignmentGrid::from_raster(rows, cols, tiles)?;
        debug!("Assigned {total} blocks, canvas {canvas_width}x{canvas_height}");

        Ok(Composition {
            assignments,
            canvas_width,
            canvas_height,
            tile_side,
        })
    }

    /// Paste the assigned tiles into a new canvas
    ///
    /// With a positive `alpha` each tile is first blended toward the target
    /// block it replaces.
    ///
    /// # Errors
    ///
    /// See [`render`]
    pub fn render(
        &self,
        target: &PixelBuffer,
        composition: &Composition,
        tiles: &[Tile],
        alpha: f64,
    ) -> Result<PixelBuffer> {
        render(
            target,
            composition,
            tiles,
            self.matcher.block_size(),
            alpha,
        )
    }
}

/// Paste each assigned tile at `(col * tile_side, row * tile_side)`
///
/// # Errors
///
/// Returns an error if:
/// - An assigned tile is missing from `tiles` or has the wrong side
///   (`Computation`)
/// - The canvas buffer cannot be assembled (`Computation`)
pub fn render(
    target: &PixelBuffer,
    composition: &Composition,
    tiles: &[Tile],
    block_size: u32,
    alpha: f64,
) -> Result<PixelBuffer> {
    let side = composition.tile_side as usize;
    let canvas_width = composition.canvas_width as usize;
    let band_len = side * canvas_width * 3;
    let mut buffer = vec![0_u8; band_len * composition.assignments.rows()];

    if band_len > 0 {
        buffer
            .par_chunks_mut(band_len)
            .enumerate()
            .try_for_each(|(row, band)| {
                paste_row(target, composition, tiles, block_size, alpha, row, band)
            })?;
    }

    PixelBuffer::from_raw(composition.canvas_width, composition.canvas_height, buffer)
        .ok_or_else(|| {
            computation_error(
                "canvas assembly",
                &format!(
                    "buffer does not match {}x{}",
                    composition.canvas_width, composition.canvas_height
                ),
            )
        })
}

// Copy every tile of one block row into its band of the canvas
fn paste_row(
    target: &PixelBuffer,
    composition: &Composition,
    tiles: &[Tile],
    block_size: u32,
    alpha: f64,
    row: usize,
    band: &mut [u8],
) -> Result<()> {
    let side = composition.tile_side as usize;
    let stride = composition.canvas_width as usize * 3;
    let tile_stride = side * 3;

    for col in 0..composition.assignments.cols() {
        let tile = assigned_tile(composition, tiles, row, col)?;
        let (x, y) = block_origin(row, col, block_size);
        let block = imageops::crop_imm(target, x, y, block_size, block_size);
        let pixels = blend_tile(tile.pixels(), &*block, alpha);
        let source = pixels.as_raw();

        for line in 0..side {
            let from = line * tile_stride;
            let to = line * stride + col * tile_stride;
            match (
                source.get(from..from + tile_stride),
                band.get_mut(to..to + tile_stride),
            ) {
                (Some(src), Some(dst)) => dst.copy_from_slice(src),
                _ => {
                    return Err(computation_error(
                        "tile paste",
                        &format!("line {line} of tile {} out of bounds", tile.id()),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn assigned_tile<'t>(
    composition: &Composition,
    tiles: &'t [Tile],
    row: usize,
    col: usize,
) -> Result<&'t Tile> {
    let id = composition
        .assignments
        .get(row, col)
        .copied()
        .ok_or_else(|| computation_error("tile paste", &format!("no assignment at {row},{col}")))?;
    let tile = tiles
        .get(id.index())
        .filter(|tile| tile.id() == id)
        .or_else(|| tiles.iter().find(|tile| tile.id() == id))
        .ok_or_else(|| computation_error("tile paste", &format!("tile {id} is not available")))?;
    if tile.side() != composition.tile_side {
        return Err(computation_error(
            "tile paste",
            &format!(
                "tile {id} is {}px, expected {}px",
                tile.side(),
                composition.tile_side
            ),
        ));
    }
    Ok(tile)
}
