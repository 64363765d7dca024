//! End-to-end mosaic pipeline
//!
//! Normalizes the tile set, summarizes every tile, assigns a tile to each
//! target block and renders the canvas. All inputs are borrowed immutably;
//! each stage returns fresh values, so nothing is shared mutably between
//! stages or worker threads.

use log::{info, warn};
use rayon::ThreadPoolBuilder;

use crate::algorithm::composer::{CancelFlag, Composition, MosaicComposer, fit_tile_side, render};
use crate::algorithm::matcher::TileMatcher;
use crate::analysis::summary::summarize_tiles;
use crate::io::configuration::MosaicConfig;
use crate::io::error::{Result, computation_error};
use crate::spatial::grid::{PixelBuffer, checked_grid_dimensions};
use crate::spatial::tiles::{Tile, TileId, normalize_with_reduction, resize_tiles};

/// Finished mosaic with the assignment that produced it
#[derive(Debug, Clone)]
pub struct Mosaic {
    /// Rendered canvas
    pub canvas: PixelBuffer,
    /// Tile assignment and canvas geometry
    pub composition: Composition,
}

impl Mosaic {
    /// Number of blocks each tile was assigned to, indexed by tile id
    pub fn tile_usage(&self, tile_count: usize) -> Vec<usize> {
        let mut usage = vec![0; tile_count];
        for id in self.composition.assignments.iter() {
            if let Some(count) = usage.get_mut(id.index()) {
                *count += 1;
            }
        }
        usage
    }
}

/// Tiles and matcher ready for composition against one target
#[derive(Debug, Clone)]
pub struct PreparedTiles {
    /// Normalized tiles in input order
    pub tiles: Vec<Tile>,
    /// Matcher over the tiles' summaries
    pub matcher: TileMatcher,
}

/// Runs the mosaic pipeline with a fixed configuration
#[derive(Debug, Clone)]
pub struct MosaicExecutor {
    config: MosaicConfig,
}

impl MosaicExecutor {
    /// Create an executor after validating the configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the configuration is invalid
    pub fn new(config: MosaicConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use
    pub const fn config(&self) -> &MosaicConfig {
        &self.config
    }

    /// Normalize and summarize tiles for the given target
    ///
    /// The target is only used to size the canvas when shrinking tiles to
    /// fit the canvas limit.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The block size exceeds a target dimension (`BlockTooLarge`)
    /// - The tile set is empty or unusable (`EmptyTileSet`, `DegenerateTile`)
    /// - Shrinking cannot bring the canvas under the limit (`CanvasTooLarge`)
    pub fn prepare(&self, target: &PixelBuffer, raw_tiles: &[PixelBuffer]) -> Result<PreparedTiles> {
        let block_size = self.config.block_size;
        let grid = checked_grid_dimensions(target, block_size)?;

        let normalized =
            normalize_with_reduction(raw_tiles, block_size, self.config.size_reduction_factor)?;
        let mut tiles = normalized.tiles;
        let mut side = normalized.common_side;

        if self.config.shrink_to_fit {
            let fitted = fit_tile_side(grid, side, block_size, self.config.max_canvas_dimension)?;
            if fitted < side {
                warn!("Shrinking tiles from {side}px to {fitted}px to fit the canvas limit");
                tiles = resize_tiles(tiles, fitted);
                side = fitted;
            }
        }

        info!("Prepared {} tiles at {side}x{side}", tiles.len());
        let summaries = summarize_tiles(&tiles, block_size)?;
        let matcher = TileMatcher::new(
            summaries,
            block_size,
            self.config.metric,
            self.config.strategy,
        )?;
        Ok(PreparedTiles { tiles, matcher })
    }

    /// Build a mosaic of the target from raw tile images
    ///
    /// # Errors
    ///
    /// See [`MosaicExecutor::run_observed`]
    pub fn run(&self, target: &PixelBuffer, raw_tiles: &[PixelBuffer]) -> Result<Mosaic> {
        self.run_observed(target, raw_tiles, None, |_| {})
    }

    /// Build a mosaic, reporting matched block counts and honouring cancellation
    ///
    /// # Errors
    ///
    /// Returns the errors of [`MosaicExecutor::prepare`] and of composition
    /// (`CanvasTooLarge`, `Cancelled`), or a computation error if the
    /// worker pool cannot be created.
    pub fn run_observed<F>(
        &self,
        target: &PixelBuffer,
        raw_tiles: &[PixelBuffer],
        cancel: Option<&CancelFlag>,
        observer: F,
    ) -> Result<Mosaic>
    where
        F: Fn(usize) + Sync + Send,
    {
        match self.config.threads {
            Some(threads) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| computation_error("worker pool", &e))?;
                pool.install(|| self.execute(target, raw_tiles, cancel, &observer))
            }
            None => self.execute(target, raw_tiles, cancel, &observer),
        }
    }

    fn execute<F>(
        &self,
        target: &PixelBuffer,
        raw_tiles: &[PixelBuffer],
        cancel: Option<&CancelFlag>,
        observer: &F,
    ) -> Result<Mosaic>
    where
        F: Fn(usize) + Sync,
    {
        let prepared = self.prepare(target, raw_tiles)?;

        let mut composer = MosaicComposer::new(&prepared.matcher)
            .with_max_canvas_dimension(self.config.max_canvas_dimension);
        if let Some(flag) = cancel {
            composer = composer.with_cancel_flag(flag);
        }

        let composition = composer.compose_observed(target, observer)?;
        let canvas = render(
            target,
            &composition,
            &prepared.tiles,
            self.config.block_size,
            self.config.clamped_alpha(),
        )?;

        Ok(Mosaic {
            canvas,
            composition,
        })
    }
}

/// Most used tile in a mosaic, if any block was assigned
pub fn most_used_tile(usage: &[usize]) -> Option<(TileId, usize)> {
    usage
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, count)| count > 0)
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(index, count)| (TileId(index), count))
}
