//! CLI entry point for the photo-mosaic builder

use clap::Parser;
use tilemosaic::io::cli::{Cli, MosaicProcessor};

fn main() -> tilemosaic::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let processor = MosaicProcessor::new(cli);
    processor.process()
}
