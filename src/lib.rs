//! Photo-mosaic construction by nearest-neighbour tile matching
//!
//! A target image is split into square blocks and every block is replaced
//! by the tile image whose fine-grained colour layout matches it best.
//! Tiles are first normalized to one common square size, then summarized
//! into per-sub-block mean colours that line up with the pixels of a block.

#![forbid(unsafe_code)]

/// Tile matching, composition, blending and the end-to-end pipeline
pub mod algorithm;
/// Colour summaries of images and tiles
pub mod analysis;
/// Input/output operations, configuration and error handling
pub mod io;
/// Pixel buffers, block grids and tile normalization
pub mod spatial;

pub use io::error::{MosaicError, Result};
