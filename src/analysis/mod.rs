//! Colour analysis of targets and tiles

/// Brightness palette for bucketed tile selection
pub mod shades;
/// Block-level mean colour summaries
pub mod summary;
