//! Alpha adjustment of pasted tiles toward the target colours
//!
//! Every pixel of a tile belongs to one sub-block, and each sub-block was
//! matched against one pixel of the target block. Blending pulls the tile
//! pixel toward that target pixel by `alpha`:
//! `out = round(tile - alpha * (tile - target))`.

use std::borrow::Cow;

use image::{GenericImageView, Rgb};
use num_traits::ToPrimitive;

use crate::spatial::grid::PixelBuffer;

/// Blend one channel value toward its target
pub fn blend_channel(tile: u8, target: u8, alpha: f64) -> u8 {
    let tile_value = f64::from(tile);
    let adjusted = tile_value - alpha * (tile_value - f64::from(target));
    adjusted.round().clamp(0.0, 255.0).to_u8().unwrap_or(tile)
}

/// Tile pixels as they should be pasted over a target block
///
/// An alpha of zero, or a block with no pixels, borrows the tile unchanged.
pub fn blend_tile<'a, V>(tile: &'a PixelBuffer, block: &V, alpha: f64) -> Cow<'a, PixelBuffer>
where
    V: GenericImageView<Pixel = Rgb<u8>>,
{
    let (block_width, block_height) = block.dimensions();
    if alpha <= 0.0 || block_width == 0 || block_height == 0 {
        return Cow::Borrowed(tile);
    }

    let sub_width = (tile.width() / block_width).max(1);
    let sub_height = (tile.height() / block_height).max(1);

    let mut blended = tile.clone();
    for (x, y, pixel) in blended.enumerate_pixels_mut() {
        let target_x = (x / sub_width).min(block_width - 1);
        let target_y = (y / sub_height).min(block_height - 1);
        let target = block.get_pixel(target_x, target_y);
        for (channel, &goal) in pixel.0.iter_mut().zip(target.0.iter()) {
            *channel = blend_channel(*channel, goal, alpha);
        }
    }
    Cow::Owned(blended)
}
