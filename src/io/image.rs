//! Image decoding, tile discovery and result export

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::algorithm::composer::AssignmentGrid;
use crate::io::configuration::SUPPORTED_EXTENSIONS;
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::spatial::grid::PixelBuffer;

/// Decode an image file into an RGB pixel buffer
///
/// # Errors
///
/// Returns `ImageLoad` if the file cannot be opened or decoded
pub fn load_image(path: &Path) -> Result<PixelBuffer> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|e| MosaicError::ImageLoad {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Decode many images in parallel, keeping the order of `paths`
///
/// `on_loaded` receives the running count of decoded images.
///
/// # Errors
///
/// Returns the `ImageLoad` error of the first failing path, in input order
pub fn load_images<F>(paths: &[PathBuf], on_loaded: F) -> Result<Vec<PixelBuffer>>
where
    F: Fn() + Sync,
{
    paths
        .par_iter()
        .map(|path| {
            let loaded = load_image(path);
            on_loaded();
            loaded
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

/// Whether a path has one of the supported image extensions
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// List every supported image below a directory, sorted by path
///
/// # Errors
///
/// Returns an error if:
/// - The path is not a directory (`InvalidParameter`)
/// - A directory cannot be read (`FileSystem`)
pub fn collect_image_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(invalid_parameter(
            "tiles",
            &dir.display(),
            &"must be a directory of images",
        ));
    }

    let mut paths = Vec::new();
    walk_directory(dir, &mut paths)?;
    paths.sort();
    Ok(paths)
}

fn walk_directory(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| MosaicError::FileSystem {
        path: dir.to_path_buf(),
        operation: "read directory",
        source: e,
    })?;

    for entry in entries {
        let path = entry
            .map_err(|e| MosaicError::FileSystem {
                path: dir.to_path_buf(),
                operation: "read directory entry",
                source: e,
            })?
            .path();
        if path.is_dir() {
            walk_directory(&path, paths)?;
        } else if is_supported_image(&path) {
            paths.push(path);
        }
    }
    Ok(())
}

/// Save a canvas, creating parent directories as needed
///
/// The format follows the file extension.
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created (`FileSystem`)
/// - The image cannot be encoded or written (`ImageExport`)
pub fn save_image(canvas: &PixelBuffer, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    canvas.save(path).map_err(|e| MosaicError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Render an assignment grid as CSV, one block row per line
pub fn assignments_to_csv(assignments: &AssignmentGrid) -> String {
    let mut csv = String::new();
    for row in assignments.as_array().rows() {
        let line = row
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(csv, "{line}");
    }
    csv
}

/// Write an assignment grid as CSV
///
/// # Errors
///
/// Returns `FileSystem` if the file or its parent directory cannot be written
pub fn write_assignments(assignments: &AssignmentGrid, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, assignments_to_csv(assignments)).map_err(|e| MosaicError::FileSystem {
        path: path.to_path_buf(),
        operation: "write assignments",
        source: e,
    })
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| MosaicError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }
    Ok(())
}
