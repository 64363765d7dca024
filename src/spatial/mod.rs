//! Spatial data structures
//!
//! This module contains:
//! - Pixel buffers and block grids laid over them
//! - Tile handles and tile normalization

/// Block grids and grid dimension helpers
pub mod grid;
/// Tile normalization into a uniform square size
pub mod tiles;

pub use grid::{BlockGrid, PixelBuffer};
pub use tiles::{Tile, TileId};
