//! Tests for block averaging and tile sub-block summaries

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use tilemosaic::MosaicError;
    use tilemosaic::analysis::summary::{AvgColour, TileSummary, summarize, summarize_tiles};
    use tilemosaic::spatial::tiles::{Tile, TileId};

    fn split_tile(side: u32, left: [u8; 3], right: [u8; 3]) -> RgbImage {
        RgbImage::from_fn(side, side, |x, _| {
            if x < side / 2 { Rgb(left) } else { Rgb(right) }
        })
    }

    // Tests a solid image averages to its own colour in every block
    // Verified by dividing sums by the block side instead of its area
    #[test]
    fn test_solid_image_exact_average() {
        let image = RgbImage::from_pixel(6, 4, Rgb([200, 100, 50]));
        let grid = summarize(&image, 2).unwrap();
        assert_eq!(grid.dim(), (2, 3));
        for colour in grid.iter() {
            assert_eq!(*colour, AvgColour::new(200.0, 100.0, 50.0));
        }
    }

    // Tests averages stay unrounded
    // Verified by rounding channel means to integers
    #[test]
    fn test_average_is_not_rounded() {
        let mut image = RgbImage::new(2, 2);
        image.put_pixel(0, 0, Rgb([0, 0, 0]));
        image.put_pixel(1, 0, Rgb([255, 255, 255]));
        image.put_pixel(0, 1, Rgb([10, 20, 30]));
        image.put_pixel(1, 1, Rgb([30, 20, 11]));

        let grid = summarize(&image, 2).unwrap();
        let colour = grid.get(0, 0).copied().unwrap();
        assert!((colour.red - 73.75).abs() < 1e-9);
        assert!((colour.green - 73.75).abs() < 1e-9);
        assert!((colour.blue - 74.0).abs() < 1e-9);
    }

    // Tests blocks follow raster order from the top-left
    // Verified by transposing the grid
    #[test]
    fn test_block_layout() {
        let image = RgbImage::from_fn(4, 2, |x, _| Rgb([if x < 2 { 0 } else { 255 }, 0, 0]));
        let grid = summarize(&image, 2).unwrap();
        assert_eq!(grid.dim(), (1, 2));
        assert_eq!(grid.get(0, 0).map(|c| c.red), Some(0.0));
        assert_eq!(grid.get(0, 1).map(|c| c.red), Some(255.0));
    }

    // Tests the partial right column and bottom row never leak into averages
    // Verified by folding edge pixels into the last block
    #[test]
    fn test_remainder_pixels_ignored() {
        let image = RgbImage::from_fn(5, 5, |x, y| {
            if x >= 4 || y >= 4 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let grid = summarize(&image, 2).unwrap();
        assert_eq!(grid.dim(), (2, 2));
        assert!(grid.iter().all(|colour| *colour == AvgColour::default()));
    }

    // Tests a block larger than the image is rejected
    // Verified by returning an empty grid
    #[test]
    fn test_block_larger_than_image() {
        let image = RgbImage::new(3, 8);
        assert!(matches!(
            summarize(&image, 4),
            Err(MosaicError::BlockTooLarge { block_size: 4, .. })
        ));
        assert!(matches!(
            summarize(&image, 0),
            Err(MosaicError::BlockTooLarge { .. })
        ));
    }

    // Tests brightness and pixel rounding of averaged colours
    // Verified by truncating instead of rounding
    #[test]
    fn test_colour_helpers() {
        let colour = AvgColour::new(127.5, 300.0, -4.0);
        assert_eq!(colour.to_pixel(), Rgb([128, 255, 0]));
        assert!((AvgColour::new(30.0, 60.0, 90.0).brightness() - 60.0).abs() < 1e-9);
        assert_eq!(
            AvgColour::from_pixel(Rgb([1, 2, 3])),
            AvgColour::new(1.0, 2.0, 3.0)
        );
    }

    // Tests a tile splits into block_size x block_size sub-blocks
    // Verified by summarizing the tile at the block size itself
    #[test]
    fn test_tile_summary_sub_blocks() {
        let tile = Tile::new(TileId(3), split_tile(8, [255, 0, 0], [0, 0, 255])).unwrap();
        let summary = TileSummary::new(&tile, 2).unwrap();

        assert_eq!(summary.tile(), TileId(3));
        assert_eq!(summary.tile_side(), 8);
        assert_eq!(summary.block_size(), 2);
        assert_eq!(summary.colours().dim(), (2, 2));
        assert_eq!(
            summary.colours().get(1, 0).copied(),
            Some(AvgColour::new(255.0, 0.0, 0.0))
        );
        assert_eq!(
            summary.colours().get(0, 1).copied(),
            Some(AvgColour::new(0.0, 0.0, 255.0))
        );

        let mean = summary.mean_colour();
        assert!((mean.red - 127.5).abs() < 1e-9);
        assert!((mean.blue - 127.5).abs() < 1e-9);
    }

    // Tests a tile side equal to the block size gives one-pixel sub-blocks
    // Verified by requiring sub-blocks of at least two pixels
    #[test]
    fn test_tile_summary_one_pixel_sub_blocks() {
        let tile = Tile::new(TileId(0), split_tile(2, [10, 10, 10], [20, 20, 20])).unwrap();
        let summary = TileSummary::new(&tile, 2).unwrap();
        assert_eq!(
            summary.colours().get(0, 0).copied(),
            Some(AvgColour::new(10.0, 10.0, 10.0))
        );
        assert_eq!(
            summary.colours().get(0, 1).copied(),
            Some(AvgColour::new(20.0, 20.0, 20.0))
        );
    }

    // Tests tiles smaller than the block size cannot be summarized
    // Verified by clamping the sub-block side to one
    #[test]
    fn test_tile_summary_block_too_large() {
        let tile = Tile::new(TileId(0), RgbImage::new(3, 3)).unwrap();
        assert!(matches!(
            TileSummary::new(&tile, 4),
            Err(MosaicError::BlockTooLarge { block_size: 4, width: 3, height: 3 })
        ));
    }

    // Tests parallel summarization keeps input order
    // Verified by collecting results in completion order
    #[test]
    fn test_summarize_tiles_order() {
        let tiles: Vec<Tile> = (0..16)
            .map(|index| {
                let shade = (index * 10) as u8;
                Tile::new(TileId(index), RgbImage::from_pixel(4, 4, Rgb([shade; 3]))).unwrap()
            })
            .collect();

        let summaries = summarize_tiles(&tiles, 2).unwrap();
        for (index, summary) in summaries.iter().enumerate() {
            assert_eq!(summary.tile(), TileId(index));
            assert!((summary.mean_colour().red - (index * 10) as f64).abs() < 1e-9);
        }
    }
}
