//! Tests for block assignment, canvas sizing and rendering

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::{Rgb, RgbImage};
    use tilemosaic::MosaicError;
    use tilemosaic::algorithm::composer::{
        CancelFlag, MosaicComposer, canvas_size, compose, fit_tile_side, render,
    };
    use tilemosaic::algorithm::matcher::{ChannelMetric, MatchStrategy, TileMatcher};
    use tilemosaic::analysis::summary::summarize_tiles;
    use tilemosaic::spatial::tiles::{Tile, TileId};

    const RED: [u8; 3] = [255, 0, 0];
    const BLUE: [u8; 3] = [0, 0, 255];
    const BLACK: [u8; 3] = [0, 0, 0];
    const WHITE: [u8; 3] = [255, 255, 255];

    fn solid_tiles(side: u32, colours: &[[u8; 3]]) -> Vec<Tile> {
        colours
            .iter()
            .enumerate()
            .map(|(index, &colour)| {
                Tile::new(TileId(index), RgbImage::from_pixel(side, side, Rgb(colour))).unwrap()
            })
            .collect()
    }

    fn matcher_for(tiles: &[Tile], block_size: u32) -> TileMatcher {
        let summaries = summarize_tiles(tiles, block_size).unwrap();
        TileMatcher::new(
            summaries,
            block_size,
            ChannelMetric::RedGreen,
            MatchStrategy::Nearest,
        )
        .unwrap()
    }

    fn half_and_half(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 { Rgb(BLACK) } else { Rgb(WHITE) }
        })
    }

    // Tests canvas size is the grid scaled by the tile side
    // Verified by scaling by the block size instead
    #[test]
    fn test_canvas_size() {
        assert_eq!(canvas_size((3, 5), 10, 1000).ok(), Some((50, 30)));
        assert!(matches!(
            canvas_size((3, 500), 10, 1000),
            Err(MosaicError::CanvasTooLarge { width: 5000, height: 30, max_dimension: 1000 })
        ));
    }

    // Tests the fitted side is the largest block multiple under the limit
    // Verified by ignoring the block multiple
    #[test]
    fn test_fit_tile_side() {
        assert_eq!(fit_tile_side((10, 20), 100, 5, 1000).ok(), Some(50));
        assert_eq!(fit_tile_side((10, 20), 30, 5, 1000).ok(), Some(30));
        assert_eq!(fit_tile_side((10, 20), 100, 7, 1000).ok(), Some(49));
        assert!(matches!(
            fit_tile_side((1000, 1000), 10, 5, 1000),
            Err(MosaicError::CanvasTooLarge { .. })
        ));
    }

    // Tests a solid red target maps every block to the red tile
    // Verified by preferring the last tile on ties
    #[test]
    fn test_compose_solid_target() {
        let tiles = solid_tiles(2, &[RED, BLUE]);
        let summaries = summarize_tiles(&tiles, 2).unwrap();
        let target = RgbImage::from_pixel(10, 10, Rgb(RED));

        let composition = compose(&target, &summaries, 2).unwrap();
        assert_eq!(composition.assignments.dim(), (5, 5));
        assert!(composition.assignments.iter().all(|&id| id == TileId(0)));
        assert_eq!(composition.canvas_size(), (10, 10));
        assert_eq!(composition.tile_side, 2);
    }

    // Tests remainder pixels produce no extra blocks
    // Verified by rounding the grid up
    #[test]
    fn test_compose_ignores_remainder() {
        let tiles = solid_tiles(4, &[BLACK, WHITE]);
        let summaries = summarize_tiles(&tiles, 2).unwrap();
        let target = RgbImage::from_pixel(11, 7, Rgb(WHITE));

        let composition = compose(&target, &summaries, 2).unwrap();
        assert_eq!(composition.assignments.dim(), (3, 5));
        assert_eq!(composition.canvas_size(), (20, 12));
        assert!(composition.assignments.iter().all(|&id| id == TileId(1)));
    }

    // Tests composition rejects missing summaries and oversized blocks
    // Verified by returning an empty assignment grid
    #[test]
    fn test_compose_errors() {
        let target = RgbImage::from_pixel(4, 4, Rgb(RED));
        assert!(matches!(
            compose(&target, &[], 2),
            Err(MosaicError::EmptyTileSummarySet)
        ));

        let summaries = summarize_tiles(&solid_tiles(8, &[RED]), 8).unwrap();
        assert!(matches!(
            compose(&target, &summaries, 8),
            Err(MosaicError::BlockTooLarge { block_size: 8, .. })
        ));
    }

    // Tests an oversized canvas fails before any block is matched
    // Verified by checking the canvas after matching
    #[test]
    fn test_canvas_limit_checked_first() {
        let tiles = solid_tiles(4, &[RED]);
        let matcher = matcher_for(&tiles, 2);
        let target = RgbImage::from_pixel(10, 10, Rgb(RED));
        let observed = AtomicUsize::new(0);

        let result = MosaicComposer::new(&matcher)
            .with_max_canvas_dimension(19)
            .compose_observed(&target, |_| {
                observed.fetch_add(1, Ordering::Relaxed);
            });
        assert!(matches!(
            result,
            Err(MosaicError::CanvasTooLarge { width: 20, height: 20, max_dimension: 19 })
        ));
        assert_eq!(observed.load(Ordering::Relaxed), 0);
    }

    // Tests a raised flag stops composition with a cancellation error
    // Verified by ignoring the flag
    #[test]
    fn test_cancelled_composition() {
        let tiles = solid_tiles(2, &[RED, BLUE]);
        let matcher = matcher_for(&tiles, 2);
        let target = RgbImage::from_pixel(8, 8, Rgb(RED));
        let flag = CancelFlag::new();
        flag.cancel();
        assert!(flag.is_cancelled());

        let result = MosaicComposer::new(&matcher)
            .with_cancel_flag(&flag)
            .compose(&target);
        assert!(matches!(
            result,
            Err(MosaicError::Cancelled { completed: 0, total: 16 })
        ));
    }

    // Tests the observer sees every block exactly once
    // Verified by reporting only the final count
    #[test]
    fn test_observer_counts_blocks() {
        let tiles = solid_tiles(2, &[RED, BLUE]);
        let matcher = matcher_for(&tiles, 2);
        let target = RgbImage::from_pixel(12, 8, Rgb(BLUE));
        let calls = AtomicUsize::new(0);
        let highest = AtomicUsize::new(0);

        let composition = MosaicComposer::new(&matcher)
            .compose_observed(&target, |done| {
                calls.fetch_add(1, Ordering::Relaxed);
                highest.fetch_max(done, Ordering::Relaxed);
            })
            .unwrap();
        assert_eq!(composition.assignments.len(), 24);
        assert_eq!(calls.load(Ordering::Relaxed), 24);
        assert_eq!(highest.load(Ordering::Relaxed), 24);
    }

    // Tests tiles land at (col * side, row * side)
    // Verified by placing tiles at the block origin instead
    #[test]
    fn test_render_positions() {
        let tiles = solid_tiles(3, &[BLACK, WHITE]);
        let matcher = matcher_for(&tiles, 1);
        let target = half_and_half(2, 1);

        let composer = MosaicComposer::new(&matcher);
        let composition = composer.compose(&target).unwrap();
        assert_eq!(composition.assignments.get(0, 0), Some(&TileId(0)));
        assert_eq!(composition.assignments.get(0, 1), Some(&TileId(1)));

        let canvas = composer.render(&target, &composition, &tiles, 0.0).unwrap();
        assert_eq!(canvas.dimensions(), (6, 3));
        for (x, _, pixel) in canvas.enumerate_pixels() {
            let expected = if x < 3 { BLACK } else { WHITE };
            assert_eq!(pixel, &Rgb(expected));
        }
    }

    // Tests multiple block rows render into their own bands
    // Verified by writing every row into the first band
    #[test]
    fn test_render_multiple_rows() {
        let tiles = solid_tiles(2, &[RED, BLUE]);
        let matcher = matcher_for(&tiles, 1);
        let target = RgbImage::from_fn(2, 3, |_, y| if y == 1 { Rgb(BLUE) } else { Rgb(RED) });

        let composition = MosaicComposer::new(&matcher).compose(&target).unwrap();
        let canvas = render(&target, &composition, &tiles, 1, 0.0).unwrap();
        assert_eq!(canvas.dimensions(), (4, 6));
        assert_eq!(canvas.get_pixel(3, 1), &Rgb(RED));
        assert_eq!(canvas.get_pixel(0, 2), &Rgb(BLUE));
        assert_eq!(canvas.get_pixel(3, 3), &Rgb(BLUE));
        assert_eq!(canvas.get_pixel(1, 5), &Rgb(RED));
    }

    // Tests a positive alpha pulls pasted tiles toward the target
    // Verified by ignoring alpha while rendering
    #[test]
    fn test_render_with_alpha() {
        let tiles = solid_tiles(2, &[[100, 100, 100]]);
        let matcher = matcher_for(&tiles, 1);
        let target = RgbImage::from_pixel(1, 1, Rgb([200, 0, 100]));

        let composition = MosaicComposer::new(&matcher).compose(&target).unwrap();
        let canvas = render(&target, &composition, &tiles, 1, 0.5).unwrap();
        assert!(canvas.pixels().all(|pixel| *pixel == Rgb([150, 50, 100])));
    }

    // Tests rendering fails when an assigned tile is unavailable
    // Verified by skipping unknown tiles
    #[test]
    fn test_render_missing_tile() {
        let tiles = solid_tiles(2, &[RED, BLUE]);
        let matcher = matcher_for(&tiles, 1);
        let target = RgbImage::from_pixel(1, 1, Rgb(BLUE));

        let composition = MosaicComposer::new(&matcher).compose(&target).unwrap();
        let only_red = solid_tiles(2, &[RED]);
        assert!(matches!(
            render(&target, &composition, &only_red, 1, 0.0),
            Err(MosaicError::Computation { .. })
        ));
    }
}
