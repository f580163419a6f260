//! Directory-tree grayscale conversion.
//!
//! Walks an extracted tile tree, converts every supported raster image
//! (`.png`, `.jpg`, `.jpeg`, any case) to grayscale, and writes it to the
//! same relative path under the output root. PNG stays PNG and JPEG stays
//! JPEG; other files are left untouched.

use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::MbtilerError;
use crate::format::is_supported_image_extension;
use crate::pixel::PixelBuffer;

/// Options for a grayscale conversion pass.
#[derive(Debug, Clone)]
pub struct GrayscaleOptions {
    /// Recurse into subdirectories. Defaults to true, matching the
    /// `zoom/column/row` tile layout.
    pub recursive: bool,
}

impl Default for GrayscaleOptions {
    fn default() -> Self {
        Self { recursive: true }
    }
}

/// Convert every supported image under `input_dir` to grayscale, mirroring
/// the tree under `output_dir`. Returns the number of images converted.
///
/// Files that fail to decode are logged and skipped; the pass continues.
pub fn convert_directory(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    options: &GrayscaleOptions,
) -> Result<usize, MbtilerError> {
    let input_root = input_dir.as_ref();
    let output_root = output_dir.as_ref();
    if !input_root.is_dir() {
        return Err(MbtilerError::NotADirectory {
            path: input_root.to_path_buf(),
        });
    }
    std::fs::create_dir_all(output_root).map_err(|e| MbtilerError::Io {
        path: output_root.to_path_buf(),
        source: e,
    })?;

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let mut count = 0usize;

    for entry in WalkDir::new(input_root).max_depth(max_depth) {
        let entry = entry.map_err(|e| MbtilerError::Io {
            path: input_root.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() || !is_supported_image_extension(entry.path()) {
            continue;
        }

        // Mirror the path relative to the input root.
        let relative = entry
            .path()
            .strip_prefix(input_root)
            .expect("walked path is under the input root");
        let destination = output_root.join(relative);

        let mut image = match PixelBuffer::load(entry.path()) {
            Ok(image) => image,
            Err(e) => {
                warn!("Skipping '{}': {}", entry.path().display(), e);
                continue;
            }
        };
        image.to_grayscale();
        image.save(&destination)?;

        info!(
            "Converted {} -> {}",
            entry.path().display(),
            destination.display()
        );
        count += 1;
    }

    info!("Converted {} images to grayscale", count);
    Ok(count)
}

// =============================================================================
// Tests
// =============================================================================
