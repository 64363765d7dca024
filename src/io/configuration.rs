//! Mosaic constants and runtime configuration defaults

use crate::algorithm::matcher::{ChannelMetric, MatchStrategy};
use crate::io::error::{Result, invalid_parameter};

/// Side length of a target block in pixels
pub const DEFAULT_BLOCK_SIZE: u32 = 5;

/// Divisor applied to tile dimensions before normalization (1 = no reduction)
pub const DEFAULT_SIZE_REDUCTION_FACTOR: f64 = 1.0;

/// Blend strength toward the target colours (0 = paste tiles unchanged)
pub const DEFAULT_ALPHA_ADJUSTMENT: f64 = 0.0;

// Image encoders in common use refuse canvases much larger than this
/// Maximum allowed output canvas side in pixels
pub const MAX_CANVAS_DIMENSION: u32 = 100_000;

/// File extensions accepted when scanning a tile directory
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;
/// Number of matched blocks between progress bar refreshes
pub const PROGRESS_UPDATE_INTERVAL: usize = 64;

// Output settings
/// Suffix added to output filenames
pub const OUTPUT_SUFFIX: &str = "_mosaic";

/// Parameters controlling tile normalization, matching and rendering
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MosaicConfig {
    /// Side of each target block; one tile is placed per block
    pub block_size: u32,
    /// Pre-scale divisor applied to every tile before cropping
    pub size_reduction_factor: f64,
    /// Blend strength in `[0, 1]` applied while pasting tiles
    pub alpha_adjustment: f64,
    /// Largest canvas side the composer will produce
    pub max_canvas_dimension: u32,
    /// Colour channels compared by the matcher
    pub metric: ChannelMetric,
    /// Tile search strategy
    pub strategy: MatchStrategy,
    /// Shrink tiles until the canvas fits instead of failing
    pub shrink_to_fit: bool,
    /// Worker thread count (`None` uses every available core)
    pub threads: Option<usize>,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            size_reduction_factor: DEFAULT_SIZE_REDUCTION_FACTOR,
            alpha_adjustment: DEFAULT_ALPHA_ADJUSTMENT,
            max_canvas_dimension: MAX_CANVAS_DIMENSION,
            metric: ChannelMetric::default(),
            strategy: MatchStrategy::default(),
            shrink_to_fit: false,
            threads: None,
        }
    }
}

impl MosaicConfig {
    /// Configuration with the given block size and defaults elsewhere
    pub fn with_block_size(block_size: u32) -> Self {
        Self {
            block_size,
            ..Self::default()
        }
    }

    /// Alpha adjustment clamped into `[0, 1]`
    pub fn clamped_alpha(&self) -> f64 {
        self.alpha_adjustment.clamp(0.0, 1.0)
    }

    /// Check every parameter before any image work starts
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if:
    /// - The block size is zero
    /// - The size reduction factor is below 1 or not finite
    /// - The alpha adjustment is not a finite number
    /// - The maximum canvas dimension is zero
    /// - An explicit thread count of zero is given
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(invalid_parameter(
                "block_size",
                &self.block_size,
                &"must be greater than zero",
            ));
        }
        if !self.size_reduction_factor.is_finite() || self.size_reduction_factor < 1.0 {
            return Err(invalid_parameter(
                "size_reduction_factor",
                &self.size_reduction_factor,
                &"must be a finite value of at least 1",
            ));
        }
        if !self.alpha_adjustment.is_finite() {
            return Err(invalid_parameter(
                "alpha_adjustment",
                &self.alpha_adjustment,
                &"must be a finite value",
            ));
        }
        if self.max_canvas_dimension == 0 {
            return Err(invalid_parameter(
                "max_canvas_dimension",
                &self.max_canvas_dimension,
                &"must be greater than zero",
            ));
        }
        if self.threads == Some(0) {
            return Err(invalid_parameter(
                "threads",
                &0,
                &"must be greater than zero when given",
            ));
        }
        Ok(())
    }
}
