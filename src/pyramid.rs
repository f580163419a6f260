//! Zoom-level downsampling.
//!
//! Rebuilds zoom level `Z-1` from the tiles of level `Z`: four sibling
//! tiles are composited onto a double-size canvas and resampled back to
//! native tile resolution with bilinear interpolation — a quad-tree
//! reduction, one level at a time.
//!
//! Tiles are read from a directory tree laid out as `Z/column/row.ext`
//! (the shape [`Tileset::extract`](crate::store::Tileset::extract)
//! produces) and written to the mirrored `Z-1/column/row.ext` layout.
//!
//! # Completeness policy
//!
//! A parent tile is produced only from a complete group: all four children
//! present, decodable, and identically sized. Anything less skips the
//! parent entirely — a missing child is never synthesized, and no partial
//! output tile is ever written. Skips are per-parent recoverable
//! conditions; they are counted and logged but never abort the run.
//!
//! # Parallelism
//!
//! Parent groups are independent (disjoint inputs and outputs), so they
//! are processed on the rayon thread pool. Each worker owns its decode and
//! resample buffers; the only shared state is a pair of atomic progress
//! counters, and directory creation, which is idempotent.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::error::MbtilerError;
use crate::pixel::PixelBuffer;

/// Options for one downsampling pass.
#[derive(Debug, Clone, Default)]
pub struct DownsampleOptions {
    /// Source zoom level. Defaults to the highest numeric directory name
    /// under the input root.
    pub zoom: Option<u8>,
    /// Convert each parent tile to grayscale after resampling.
    pub grayscale: bool,
    /// Always encode parent tiles as PNG instead of reusing the children's
    /// format.
    pub force_png: bool,
}

/// Outcome of a downsampling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownsampleReport {
    /// Zoom level the pass read from.
    pub source_zoom: u8,
    /// Parent tiles written at `source_zoom - 1`.
    pub written: u64,
    /// Parent groups skipped (incomplete, undecodable, or mismatched).
    pub skipped: u64,
    /// Complete groups that failed during resample or write.
    pub failed: u64,
}

/// Derive zoom level `Z-1` from the level-`Z` tiles under `input_dir`.
///
/// # Errors
///
/// - [`MbtilerError::NotADirectory`] when the input root is missing
/// - [`MbtilerError::NoZoomLevels`] when no numeric zoom directory exists
/// - [`MbtilerError::SourceZoomTooLow`] for source zoom 0
/// - [`MbtilerError::NoTiles`] when the source level holds zero tiles
pub fn downsample(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    options: &DownsampleOptions,
) -> Result<DownsampleReport, MbtilerError> {
    let input_root = input_dir.as_ref();
    let output_root = output_dir.as_ref();
    if !input_root.is_dir() {
        return Err(MbtilerError::NotADirectory {
            path: input_root.to_path_buf(),
        });
    }

    let source_zoom = match options.zoom {
        Some(zoom) => zoom,
        None => detect_max_zoom(input_root)?,
    };
    if source_zoom == 0 {
        return Err(MbtilerError::SourceZoomTooLow);
    }
    let target_zoom = source_zoom - 1;

    let children = enumerate_level(input_root, source_zoom)?;
    if children.is_empty() {
        return Err(MbtilerError::NoTiles {
            zoom: source_zoom,
            path: input_root.to_path_buf(),
        });
    }

    // Distinct parent coordinates; each parent is processed exactly once
    // no matter how many of its children are present.
    let parents: BTreeSet<(u32, u32)> = children
        .keys()
        .map(|(col, row)| (col / 2, row / 2))
        .collect();

    info!(
        "Downsampling zoom {} -> {}: {} source tiles, {} candidate parents",
        source_zoom,
        target_zoom,
        children.len(),
        parents.len()
    );

    let written = AtomicU64::new(0);
    let skipped = AtomicU64::new(0);
    let failed = AtomicU64::new(0);

    parents.par_iter().for_each(|&(parent_col, parent_row)| {
        match build_parent(&children, parent_col, parent_row, options) {
            Ok(Some((buffer, extension))) => {
                let output_path = output_root
                    .join(target_zoom.to_string())
                    .join(parent_col.to_string())
                    .join(format!("{parent_row}.{extension}"));
                match buffer.save(&output_path) {
                    Ok(()) => {
                        let total = written.fetch_add(1, Ordering::Relaxed) + 1;
                        if total % 100 == 0 {
                            debug!("Downsampled {} parent tiles...", total);
                        }
                    }
                    Err(e) => {
                        error!(
                            "Failed to write parent tile {}/{}/{}: {}",
                            target_zoom, parent_col, parent_row, e
                        );
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            Ok(None) => {
                skipped.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                error!(
                    "Failed to resample parent tile {}/{}/{}: {}",
                    target_zoom, parent_col, parent_row, e
                );
                failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    let report = DownsampleReport {
        source_zoom,
        written: written.into_inner(),
        skipped: skipped.into_inner(),
        failed: failed.into_inner(),
    };
    info!(
        "Downsampling completed: {} written, {} skipped, {} failed",
        report.written, report.skipped, report.failed
    );
    Ok(report)
}

/// Assemble and resample one parent tile.
///
/// Returns `Ok(None)` when the group is incomplete and must be skipped.
fn build_parent(
    children: &HashMap<(u32, u32), PathBuf>,
    parent_col: u32,
    parent_row: u32,
    options: &DownsampleOptions,
) -> Result<Option<(PixelBuffer, String)>, MbtilerError> {
    // Row-major 2x2 ordering: index i is child (2c + i%2, 2r + i/2).
    let mut decoded: Vec<PixelBuffer> = Vec::with_capacity(4);
    let mut first_extension: Option<String> = None;

    for i in 0..4u32 {
        let child_coord = (2 * parent_col + i % 2, 2 * parent_row + i / 2);
        let Some(path) = children.get(&child_coord) else {
            debug!(
                "Skipping parent ({}, {}): child {}/{} missing",
                parent_col, parent_row, child_coord.0, child_coord.1
            );
            return Ok(None);
        };
        match PixelBuffer::load(path) {
            Ok(buffer) => {
                if first_extension.is_none() {
                    first_extension = path
                        .extension()
                        .and_then(|e| e.to_str())
                        .map(crate::format::normalize_extension);
                }
                decoded.push(buffer);
            }
            Err(e) => {
                warn!(
                    "Skipping parent ({}, {}): cannot decode '{}': {}",
                    parent_col,
                    parent_row,
                    path.display(),
                    e
                );
                return Ok(None);
            }
        }
    }

    let child_width = decoded[0].width();
    let child_height = decoded[0].height();
    if child_width == 0 || child_height == 0 {
        warn!(
            "Skipping parent ({}, {}): zero-sized child tile",
            parent_col, parent_row
        );
        return Ok(None);
    }
    if decoded
        .iter()
        .any(|b| b.width() != child_width || b.height() != child_height)
    {
        warn!(
            "Skipping parent ({}, {}): child tile dimensions differ",
            parent_col, parent_row
        );
        return Ok(None);
    }

    let mut canvas = PixelBuffer::new(child_width * 2, child_height * 2);
    for (i, child) in decoded.iter().enumerate() {
        let x_offset = (i as u32 % 2) * child_width;
        let y_offset = (i as u32 / 2) * child_height;
        canvas.blit(child, x_offset, y_offset);
    }

    let mut parent = canvas.resize_linear(child_width, child_height)?;
    if options.grayscale {
        parent.to_grayscale();
    }

    let extension = if options.force_png {
        "png".to_string()
    } else {
        first_extension
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "png".to_string())
    };

    Ok(Some((parent, extension)))
}

/// Highest numeric directory name under the input root.
fn detect_max_zoom(input_root: &Path) -> Result<u8, MbtilerError> {
    let entries = std::fs::read_dir(input_root).map_err(|e| MbtilerError::Io {
        path: input_root.to_path_buf(),
        source: e,
    })?;

    let mut max_zoom: Option<u8> = None;
    for entry in entries {
        let entry = entry.map_err(|e| MbtilerError::Io {
            path: input_root.to_path_buf(),
            source: e,
        })?;
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(zoom) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<u8>().ok())
        {
            max_zoom = Some(max_zoom.map_or(zoom, |current| current.max(zoom)));
        }
    }

    max_zoom.ok_or_else(|| MbtilerError::NoZoomLevels {
        path: input_root.to_path_buf(),
    })
}

/// Map every `(column, row)` present at the given zoom to its file path.
fn enumerate_level(
    input_root: &Path,
    zoom: u8,
) -> Result<HashMap<(u32, u32), PathBuf>, MbtilerError> {
    let level_root = input_root.join(zoom.to_string());
    let mut tiles = HashMap::new();
    if !level_root.is_dir() {
        return Ok(tiles);
    }

    let column_dirs = std::fs::read_dir(&level_root).map_err(|e| MbtilerError::Io {
        path: level_root.clone(),
        source: e,
    })?;
    for column_entry in column_dirs {
        let column_entry = column_entry.map_err(|e| MbtilerError::Io {
            path: level_root.clone(),
            source: e,
        })?;
        let column_path = column_entry.path();
        if !column_path.is_dir() {
            continue;
        }
        let Some(column) = column_entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<u32>().ok())
        else {
            continue;
        };

        let row_files = std::fs::read_dir(&column_path).map_err(|e| MbtilerError::Io {
            path: column_path.clone(),
            source: e,
        })?;
        for row_entry in row_files {
            let row_entry = row_entry.map_err(|e| MbtilerError::Io {
                path: column_path.clone(),
                source: e,
            })?;
            let row_path = row_entry.path();
            if row_path.is_dir() {
                continue;
            }
            let Some(row) = row_path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u32>().ok())
            else {
                continue;
            };
            tiles.insert((column, row), row_path);
        }
    }

    Ok(tiles)
}

// =============================================================================
// Tests
// =============================================================================
