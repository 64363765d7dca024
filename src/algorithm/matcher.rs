//! Nearest-neighbour tile selection for a single target block
//!
//! Each pixel of a target block is compared with the matching sub-block of
//! every candidate tile, so a tile keeps some of its internal structure in
//! the comparison instead of collapsing to one flat colour. The tile with
//! the lowest summed distance wins; ties go to the earliest tile.

use image::{GenericImageView, Rgb};

use crate::analysis::shades::ShadePalette;
use crate::analysis::summary::{AvgColour, TileSummary};
use crate::io::error::{MosaicError, Result, degenerate_tile};
use crate::spatial::tiles::TileId;

/// Colour channels that contribute to the match distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelMetric {
    /// Red and green only. Blue is deliberately left out; this mirrors the
    /// metric the mosaic tool has always produced its output with.
    #[default]
    RedGreen,
    /// All three channels
    Rgb,
}

impl ChannelMetric {
    /// Absolute channel difference between a pixel and a sub-block colour
    pub fn distance(self, pixel: Rgb<u8>, colour: &AvgColour) -> f64 {
        let [red, green, blue] = pixel.0;
        let red_green = (f64::from(red) - colour.red).abs() + (f64::from(green) - colour.green).abs();
        match self {
            Self::RedGreen => red_green,
            Self::Rgb => red_green + (f64::from(blue) - colour.blue).abs(),
        }
    }
}

/// How a tile is chosen for each target block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    /// Exhaustive search over every tile's sub-block summary
    #[default]
    Nearest,
    /// Bucket lookup on mean brightness only
    Shade,
}

/// Winning tile for a block and its total distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Selected tile
    pub tile: TileId,
    /// Summed distance of the selected tile, `None` for shade lookups
    pub distance: Option<f64>,
}

/// Total distance between a target block and one tile summary
///
/// # Errors
///
/// Returns `BlockSizeMismatch` if the block or the summary grid is not
/// `block_size x block_size` for the summary's block size
pub fn block_distance<V>(block: &V, summary: &TileSummary, metric: ChannelMetric) -> Result<f64>
where
    V: GenericImageView<Pixel = Rgb<u8>>,
{
    check_block(block, summary.block_size())?;
    check_summary(summary, summary.block_size())?;
    Ok(unchecked_distance(block, summary, metric, f64::INFINITY))
}

/// Select the best tile for a target block
///
/// Searches the borrowed summaries directly; for many blocks against one
/// tile set, build a [`TileMatcher`] once instead.
///
/// # Errors
///
/// Returns an error if:
/// - No summaries are supplied (`EmptyTileSummarySet`)
/// - The block is not square, or any summary was computed for a different
///   block size than the block's side (`BlockSizeMismatch`)
pub fn best_match<V>(block: &V, summaries: &[TileSummary], metric: ChannelMetric) -> Result<TileId>
where
    V: GenericImageView<Pixel = Rgb<u8>>,
{
    let (width, height) = block.dimensions();
    if width != height {
        return Err(MosaicError::BlockSizeMismatch {
            expected: width,
            found: (height as usize, width as usize),
        });
    }
    if summaries.is_empty() {
        return Err(MosaicError::EmptyTileSummarySet);
    }
    for summary in summaries {
        check_summary(summary, width)?;
    }
    nearest(block, summaries, metric)
        .map(|(tile, _)| tile)
        .ok_or(MosaicError::EmptyTileSummarySet)
}

/// Validated tile set ready for repeated block lookups
///
/// Shared read-only across worker threads during composition.
#[derive(Debug, Clone)]
pub struct TileMatcher {
    summaries: Vec<TileSummary>,
    tile_side: u32,
    block_size: u32,
    metric: ChannelMetric,
    palette: Option<ShadePalette>,
}

impl TileMatcher {
    /// Validate summaries against the block size and prepare the search
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No summaries are supplied (`EmptyTileSummarySet`)
    /// - Any summary grid is not `block_size x block_size` (`BlockSizeMismatch`)
    /// - The summaries describe tiles of different sides (`DegenerateTile`)
    pub fn new(
        summaries: Vec<TileSummary>,
        block_size: u32,
        metric: ChannelMetric,
        strategy: MatchStrategy,
    ) -> Result<Self> {
        let tile_side = summaries
            .first()
            .map(TileSummary::tile_side)
            .ok_or(MosaicError::EmptyTileSummarySet)?;
        for summary in &summaries {
            check_summary(summary, block_size)?;
            if summary.tile_side() != tile_side {
                return Err(degenerate_tile(
                    summary.tile().index(),
                    summary.tile_side(),
                    summary.tile_side(),
                    &format!("side differs from the common side {tile_side}"),
                ));
            }
        }

        let palette = match strategy {
            MatchStrategy::Nearest => None,
            MatchStrategy::Shade => Some(ShadePalette::new(&summaries)?),
        };

        Ok(Self {
            summaries,
            tile_side,
            block_size,
            metric,
            palette,
        })
    }

    /// Block size every lookup must use
    pub const fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Common side of every tile behind the summaries
    pub const fn tile_side(&self) -> u32 {
        self.tile_side
    }

    /// Summaries searched by this matcher, in input order
    pub fn summaries(&self) -> &[TileSummary] {
        &self.summaries
    }

    /// Strategy in use
    pub const fn strategy(&self) -> MatchStrategy {
        if self.palette.is_some() {
            MatchStrategy::Shade
        } else {
            MatchStrategy::Nearest
        }
    }

    /// Find the best tile for one target block
    ///
    /// # Errors
    ///
    /// Returns `BlockSizeMismatch` if the block is not
    /// `block_size x block_size`
    pub fn best_match<V>(&self, block: &V) -> Result<Match>
    where
        V: GenericImageView<Pixel = Rgb<u8>>,
    {
        check_block(block, self.block_size)?;

        if let Some(palette) = &self.palette {
            return Ok(Match {
                tile: palette.select(block_brightness(block)),
                distance: None,
            });
        }

        nearest(block, &self.summaries, self.metric)
            .map(|(tile, distance)| Match {
                tile,
                distance: Some(distance),
            })
            .ok_or(MosaicError::EmptyTileSummarySet)
    }
}

// Exhaustive search over already validated summaries
fn nearest<V>(block: &V, summaries: &[TileSummary], metric: ChannelMetric) -> Option<(TileId, f64)>
where
    V: GenericImageView<Pixel = Rgb<u8>>,
{
    let mut best: Option<(TileId, f64)> = None;
    for summary in summaries {
        let bound = best.map_or(f64::INFINITY, |(_, distance)| distance);
        let distance = unchecked_distance(block, summary, metric, bound);
        // Strictly lower only, so the earliest tile keeps a tie
        if distance < bound {
            best = Some((summary.tile(), distance));
        }
    }
    best
}

// Sums until the running total reaches `bound`; past that point the tile
// cannot win, so the partial sum is returned as-is.
fn unchecked_distance<V>(block: &V, summary: &TileSummary, metric: ChannelMetric, bound: f64) -> f64
where
    V: GenericImageView<Pixel = Rgb<u8>>,
{
    let colours = summary.colours();
    let mut total = 0.0;
    for (x, y, pixel) in block.pixels() {
        if let Some(colour) = colours.get(y as usize, x as usize) {
            total += metric.distance(pixel, colour);
        }
        if total >= bound {
            break;
        }
    }
    total
}

fn block_brightness<V>(block: &V) -> f64
where
    V: GenericImageView<Pixel = Rgb<u8>>,
{
    let (width, height) = block.dimensions();
    let count = (f64::from(width) * f64::from(height)).max(1.0);
    let total: f64 = block
        .pixels()
        .map(|(_, _, pixel)| AvgColour::from_pixel(pixel).brightness())
        .sum();
    total / count
}

fn check_block<V>(block: &V, block_size: u32) -> Result<()>
where
    V: GenericImageView<Pixel = Rgb<u8>>,
{
    let (width, height) = block.dimensions();
    if width != block_size || height != block_size {
        return Err(MosaicError::BlockSizeMismatch {
            expected: block_size,
            found: (height as usize, width as usize),
        });
    }
    Ok(())
}

fn check_summary(summary: &TileSummary, block_size: u32) -> Result<()> {
    let expected = block_size as usize;
    let found = summary.colours().dim();
    if found != (expected, expected) {
        return Err(MosaicError::BlockSizeMismatch {
            expected: block_size,
            found,
        });
    }
    Ok(())
}
