//! Input/output, configuration and error handling

/// Command-line interface
pub mod cli;
/// Constants and runtime configuration
pub mod configuration;
/// Error types
pub mod error;
/// Image decoding, tile discovery and result export
pub mod image;
/// Progress display
pub mod progress;
