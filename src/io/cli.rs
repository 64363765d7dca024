//! Command-line interface for building a mosaic from image files

use crate::algorithm::executor::{MosaicExecutor, most_used_tile};
use crate::algorithm::matcher::{ChannelMetric, MatchStrategy};
use crate::io::configuration::{
    DEFAULT_ALPHA_ADJUSTMENT, DEFAULT_BLOCK_SIZE, DEFAULT_SIZE_REDUCTION_FACTOR,
    MAX_CANVAS_DIMENSION, MosaicConfig, OUTPUT_SUFFIX,
};
use crate::io::error::{MosaicError, Result};
use crate::io::image::{
    collect_image_paths, load_image, load_images, save_image, write_assignments,
};
use crate::io::progress::{ProgressManager, StageProgress};
use crate::spatial::grid::{PixelBuffer, grid_dimensions};
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "tilemosaic")]
#[command(
    author,
    version,
    about = "Rebuild a target image as a mosaic of smaller tile images"
)]
/// Command-line arguments for the mosaic tool
// Independent on/off switches map naturally onto flags
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Target image to reproduce
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Directory of tile images, searched recursively
    #[arg(short, long, value_name = "DIR")]
    pub tiles: PathBuf,

    /// Output image path (defaults to <TARGET>_mosaic.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Side of each target block in pixels; one tile replaces each block
    #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: u32,

    /// Divide tile dimensions by this factor before normalizing
    #[arg(short = 'r', long, default_value_t = DEFAULT_SIZE_REDUCTION_FACTOR)]
    pub reduction: f64,

    /// Blend pasted tiles toward the target colours (0 to 1)
    #[arg(short, long, default_value_t = DEFAULT_ALPHA_ADJUSTMENT)]
    pub alpha: f64,

    /// Maximum output width or height in pixels
    #[arg(long, default_value_t = MAX_CANVAS_DIMENSION)]
    pub max_canvas: u32,

    /// Compare all three colour channels instead of red and green only
    #[arg(long)]
    pub all_channels: bool,

    /// Pick tiles by brightness bucket instead of nearest-neighbour search
    #[arg(long)]
    pub shade: bool,

    /// Shrink tiles until the output fits the maximum canvas size
    #[arg(long)]
    pub shrink_to_fit: bool,

    /// Number of worker threads (defaults to all cores)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Also write the tile assignment grid as CSV
    #[arg(long, value_name = "FILE")]
    pub assignments: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Mosaic configuration described by the arguments
    pub const fn config(&self) -> MosaicConfig {
        MosaicConfig {
            block_size: self.block_size,
            size_reduction_factor: self.reduction,
            alpha_adjustment: self.alpha,
            max_canvas_dimension: self.max_canvas,
            metric: if self.all_channels {
                ChannelMetric::Rgb
            } else {
                ChannelMetric::RedGreen
            },
            strategy: if self.shade {
                MatchStrategy::Shade
            } else {
                MatchStrategy::Nearest
            },
            shrink_to_fit: self.shrink_to_fit,
            threads: self.threads,
        }
    }

    /// Where the mosaic will be written
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.target))
    }
}

/// Sibling of the target named `<stem>_mosaic.<ext>`, PNG when there is no extension
pub fn default_output_path(target: &Path) -> PathBuf {
    let stem = target.file_stem().unwrap_or_default();
    let extension = target
        .extension()
        .map_or_else(|| "png".to_string(), |ext| ext.to_string_lossy().to_string());
    let output_name = format!("{}{OUTPUT_SUFFIX}.{extension}", stem.to_string_lossy());

    if let Some(parent) = target.parent() {
        parent.join(output_name)
    } else {
        PathBuf::from(output_name)
    }
}

/// Loads inputs, runs the pipeline and writes the outputs
pub struct MosaicProcessor {
    cli: Cli,
    progress_manager: ProgressManager,
}

impl MosaicProcessor {
    /// Create a processor for the given arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = if cli.should_show_progress() {
            ProgressManager::new()
        } else {
            ProgressManager::hidden()
        };

        Self {
            cli,
            progress_manager,
        }
    }

    /// Build the mosaic described by the arguments
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The tile directory holds no images or cannot be read
    /// - Any image fails to load
    /// - The mosaic cannot be built or written
    pub fn process(&self) -> Result<()> {
        let start_time = Instant::now();
        let executor = MosaicExecutor::new(self.cli.config())?;

        let tile_paths = collect_image_paths(&self.cli.tiles)?;
        if tile_paths.is_empty() {
            return Err(MosaicError::EmptyTileSet);
        }
        info!(
            "Found {} tile images in '{}'",
            tile_paths.len(),
            self.cli.tiles.display()
        );

        let target = load_image(&self.cli.target)?;

        let loading = self.progress_manager.stage("Loading", tile_paths.len());
        let raw_tiles = load_images(&tile_paths, || loading.tick())?;
        loading.finish("tiles loaded");

        let matching = self.stage_for_blocks(&target);
        let mosaic = executor.run_observed(&target, &raw_tiles, None, |done| {
            matching.update(done);
        })?;
        matching.finish("blocks matched");
        self.progress_manager.finish();

        let output_path = self.cli.output_path();
        save_image(&mosaic.canvas, &output_path)?;
        if let Some(assignments_path) = &self.cli.assignments {
            write_assignments(&mosaic.composition.assignments, assignments_path)?;
        }

        let usage = mosaic.tile_usage(raw_tiles.len());
        let used = usage.iter().filter(|&&count| count > 0).count();
        info!(
            "Wrote {}x{} mosaic to '{}' using {used} of {} tiles in {:.2?}",
            mosaic.composition.canvas_width,
            mosaic.composition.canvas_height,
            output_path.display(),
            raw_tiles.len(),
            start_time.elapsed()
        );
        if let Some((tile, count)) = most_used_tile(&usage) {
            info!(
                "Most used tile: '{}' ({count} blocks)",
                tile_paths
                    .get(tile.index())
                    .map_or_else(|| tile.to_string(), |path| path.display().to_string())
            );
        }

        Ok(())
    }

    fn stage_for_blocks(&self, target: &PixelBuffer) -> StageProgress {
        let (rows, cols) = grid_dimensions(target.width(), target.height(), self.cli.block_size);
        let blocks = rows * cols;
        if blocks == 0 {
            return StageProgress::hidden(0);
        }
        self.progress_manager.stage("Matching", blocks)
    }
}
