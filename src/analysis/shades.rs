//! Brightness palette for bucketed tile selection
//!
//! Tiles are ordered by mean brightness and the brightness axis is split
//! into buckets at the midpoints between neighbouring shades. Selecting a
//! tile for a block is then a binary search on the block's brightness.
//! This is nearest-neighbour matching collapsed to one dimension, useful
//! as a fast path when the tile set is a handful of flat shades.

use crate::analysis::summary::TileSummary;
use crate::io::error::{MosaicError, Result};
use crate::spatial::tiles::TileId;

/// One palette entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shade {
    /// Mean brightness of the tile
    pub brightness: f64,
    /// Tile with this brightness
    pub tile: TileId,
}

/// Tiles sorted darkest first, with bucket thresholds between them
#[derive(Debug, Clone)]
pub struct ShadePalette {
    shades: Vec<Shade>,
    thresholds: Vec<f64>,
}

impl ShadePalette {
    /// Build a palette from tile summaries
    ///
    /// Tiles of equal brightness collapse to the earliest one, which would
    /// win every tie between them anyway.
    ///
    /// # Errors
    ///
    /// Returns `EmptyTileSummarySet` if no summaries are supplied
    pub fn new(summaries: &[TileSummary]) -> Result<Self> {
        if summaries.is_empty() {
            return Err(MosaicError::EmptyTileSummarySet);
        }

        let mut shades: Vec<Shade> = summaries
            .iter()
            .map(|summary| Shade {
                brightness: summary.mean_colour().brightness(),
                tile: summary.tile(),
            })
            .collect();
        shades.sort_by(|a, b| a.brightness.total_cmp(&b.brightness));
        shades.dedup_by(|later, earlier| later.brightness.total_cmp(&earlier.brightness).is_eq());

        let thresholds = shades
            .windows(2)
            .filter_map(|pair| match pair {
                [darker, lighter] => Some(f64::midpoint(darker.brightness, lighter.brightness)),
                _ => None,
            })
            .collect();

        Ok(Self { shades, thresholds })
    }

    /// Palette entries, darkest first
    pub fn shades(&self) -> &[Shade] {
        &self.shades
    }

    /// Upper brightness bound of every bucket except the last
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Bucket index for a brightness value
    pub fn bucket_of(&self, brightness: f64) -> usize {
        self.thresholds
            .partition_point(|&threshold| threshold < brightness)
    }

    /// Tile whose bucket contains the given brightness
    ///
    /// A brightness sitting exactly on a threshold is equally close to both
    /// neighbours; the tile earlier in the input sequence wins.
    pub fn select(&self, brightness: f64) -> TileId {
        let bucket = self.bucket_of(brightness);
        let chosen = self.shades.get(bucket).map(|shade| shade.tile);

        let on_threshold = self
            .thresholds
            .get(bucket)
            .is_some_and(|&threshold| threshold == brightness);
        let neighbour = self.shades.get(bucket + 1).map(|shade| shade.tile);

        match (chosen, neighbour) {
            (Some(lower), Some(upper)) if on_threshold => lower.min(upper),
            (Some(lower), _) => lower,
            (None, _) => TileId::default(),
        }
    }
}
