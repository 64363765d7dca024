/// Alpha adjustment of pasted tiles toward the target
pub mod blend;
/// Block-to-tile assignment and canvas rendering
pub mod composer;
/// End-to-end pipeline from raw images to a rendered mosaic
pub mod executor;
/// Per-block tile selection and distance metrics
pub mod matcher;
