//! Error types for mosaic construction and the surrounding file handling

use std::fmt;
use std::path::PathBuf;

/// Main error type for all mosaic operations
///
/// The first six variants are precondition violations of the matching
/// engine. Each aborts the whole operation before any output is produced.
#[derive(Debug)]
pub enum MosaicError {
    /// No tile images were supplied
    EmptyTileSet,

    /// A tile cannot take part in a mosaic at the requested block size
    DegenerateTile {
        /// Position of the tile in the supplied sequence
        index: usize,
        /// Width of the offending image (after any size reduction)
        width: u32,
        /// Height of the offending image (after any size reduction)
        height: u32,
        /// Description of what made the tile unusable
        reason: String,
    },

    /// Block size exceeds an image dimension, so the block grid would be empty
    BlockTooLarge {
        /// Requested block size
        block_size: u32,
        /// Width of the image being summarized
        width: u32,
        /// Height of the image being summarized
        height: u32,
    },

    /// Matching was requested against an empty set of tile summaries
    EmptyTileSummarySet,

    /// A target block or tile summary does not have the expected granularity
    BlockSizeMismatch {
        /// Block size the matcher was working at
        expected: u32,
        /// Grid dimensions that were actually found (rows, cols)
        found: (usize, usize),
    },

    /// The output canvas would exceed the configured maximum side length
    CanvasTooLarge {
        /// Width the canvas would need
        width: u64,
        /// Height the canvas would need
        height: u64,
        /// Configured maximum for either side
        max_dimension: u32,
    },

    /// Composition was cancelled between block iterations
    Cancelled {
        /// Number of blocks matched before the cancellation was observed
        completed: usize,
        /// Total number of blocks in the grid
        total: usize,
    },

    /// Configuration parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Failed to load an image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save the generated mosaic to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Internal computation produced an inconsistent result
    Computation {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },
}

impl fmt::Display for MosaicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTileSet => write!(f, "No tile images were supplied"),
            Self::DegenerateTile {
                index,
                width,
                height,
                reason,
            } => {
                write!(f, "Tile {index} ({width}x{height}) is unusable: {reason}")
            }
            Self::BlockTooLarge {
                block_size,
                width,
                height,
            } => {
                write!(
                    f,
                    "Block size {block_size} does not fit inside a {width}x{height} image"
                )
            }
            Self::EmptyTileSummarySet => write!(f, "No tile summaries to match against"),
            Self::BlockSizeMismatch { expected, found } => {
                write!(
                    f,
                    "Expected a {expected}x{expected} block, found {}x{}",
                    found.0, found.1
                )
            }
            Self::CanvasTooLarge {
                width,
                height,
                max_dimension,
            } => {
                write!(
                    f,
                    "Output canvas {width}x{height} exceeds the maximum side of {max_dimension}px"
                )
            }
            Self::Cancelled { completed, total } => {
                write!(f, "Cancelled after matching {completed} of {total} blocks")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Computation { operation, reason } => {
                write!(f, "Computation error in {operation}: {reason}")
            }
        }
    }
}

impl std::error::Error for MosaicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for mosaic results
pub type Result<T> = std::result::Result<T, MosaicError>;

impl From<image::ImageError> for MosaicError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageLoad {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<std::io::Error> for MosaicError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> MosaicError {
    MosaicError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a computation error
pub fn computation_error(operation: &'static str, reason: &impl ToString) -> MosaicError {
    MosaicError::Computation {
        operation,
        reason: reason.to_string(),
    }
}

/// Create a degenerate tile error
pub fn degenerate_tile(index: usize, width: u32, height: u32, reason: &impl ToString) -> MosaicError {
    MosaicError::DegenerateTile {
        index,
        width,
        height,
        reason: reason.to_string(),
    }
}
