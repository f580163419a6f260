//! Archive integrity diagnostics.
//!
//! Two read-only analyses over the tile coverage of an archive, both driven
//! by the bounding box of the `(column, row)` coordinates present at a zoom
//! level:
//!
//! - [`health_check`] measures how much of the highest zoom level's bounding
//!   box is actually populated. Archives produced by an interrupted or
//!   failed ingest show up as sparse coverage; a ratio below
//!   [`HEALTH_RATIO_THRESHOLD`] marks the archive unhealthy.
//! - [`write_missing_report`] enumerates every absent tile inside each zoom
//!   level's bounding box and writes one `/zoom/column/row` line per missing
//!   tile, ready to feed into a tile fetcher. Rows are written as stored
//!   (TMS) by default, optionally flipped to the display convention, and
//!   optionally expanded to the four child coordinates at the next finer
//!   zoom for re-fetching at higher detail.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::error::MbtilerError;
use crate::store::Tileset;

/// Minimum populated fraction of the highest zoom level's bounding box for
/// an archive to count as healthy.
pub const HEALTH_RATIO_THRESHOLD: f64 = 0.25;

// =============================================================================
// Level statistics
// =============================================================================

/// Tile coverage of one zoom level's bounding box.
///
/// Rows are in the store (TMS) convention, as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelStats {
    pub zoom: u8,
    pub column_min: u32,
    pub column_max: u32,
    pub row_min: u32,
    pub row_max: u32,
    /// Tiles actually present at this level.
    pub present: u64,
}

impl LevelStats {
    /// Bounding-box coverage of one level; `None` when the level is empty.
    fn from_coords(zoom: u8, coords: &BTreeSet<(u32, u32)>) -> Option<Self> {
        let mut iter = coords.iter();
        let &(first_col, first_row) = iter.next()?;
        let mut stats = Self {
            zoom,
            column_min: first_col,
            column_max: first_col,
            row_min: first_row,
            row_max: first_row,
            present: 1,
        };
        for &(column, row) in iter {
            stats.column_min = stats.column_min.min(column);
            stats.column_max = stats.column_max.max(column);
            stats.row_min = stats.row_min.min(row);
            stats.row_max = stats.row_max.max(row);
            stats.present += 1;
        }
        Some(stats)
    }

    /// Tile count of a fully populated bounding box.
    pub fn expected(&self) -> u64 {
        let columns = (self.column_max - self.column_min + 1) as u64;
        let rows = (self.row_max - self.row_min + 1) as u64;
        columns * rows
    }

    /// Tiles absent from the bounding box.
    pub fn missing(&self) -> u64 {
        self.expected() - self.present
    }
}

// =============================================================================
// Health check
// =============================================================================

/// Outcome of a coverage health check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HealthReport {
    /// The archive holds no tiles at any zoom level.
    Empty,
    /// Coverage of the highest zoom level present.
    Coverage { stats: LevelStats, ratio: f64 },
}

impl HealthReport {
    /// An empty archive is unhealthy; a populated one is healthy when its
    /// coverage ratio reaches [`HEALTH_RATIO_THRESHOLD`].
    pub fn is_healthy(&self) -> bool {
        match self {
            Self::Empty => false,
            Self::Coverage { ratio, .. } => *ratio >= HEALTH_RATIO_THRESHOLD,
        }
    }
}

/// Measure the archive's tile coverage at its highest zoom level.
///
/// The highest level carries the bulk of a pyramid's tiles, so sparse
/// coverage there is the strongest signal of a truncated ingest. Coarser
/// levels are not inspected.
pub fn health_check(tileset: &Tileset) -> Result<HealthReport, MbtilerError> {
    let zoom_levels = tileset.zoom_levels()?;
    let Some(&zoom) = zoom_levels.last() else {
        info!("'{}' holds no tiles", tileset.path().display());
        return Ok(HealthReport::Empty);
    };

    let coords = tileset.level_coords(zoom)?;
    let Some(stats) = LevelStats::from_coords(zoom, &coords) else {
        return Ok(HealthReport::Empty);
    };
    let ratio = stats.present as f64 / stats.expected() as f64;
    info!(
        "Zoom {} coverage: {}/{} tiles in columns {}-{}, rows {}-{} (ratio {:.3})",
        zoom,
        stats.present,
        stats.expected(),
        stats.column_min,
        stats.column_max,
        stats.row_min,
        stats.row_max,
        ratio
    );
    Ok(HealthReport::Coverage { stats, ratio })
}

// =============================================================================
// Missing-tile report
// =============================================================================

/// Options for a missing-tile report.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingReportOptions {
    /// Write rows in the display (XYZ) convention instead of as stored.
    pub display_rows: bool,
    /// For each missing tile, list its four child coordinates at the next
    /// finer zoom level instead of the tile itself.
    pub upper_zoom: bool,
}

/// Summary of one missing-tile report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingReport {
    /// Coverage of every non-empty zoom level, ascending.
    pub levels: Vec<LevelStats>,
    /// Missing tiles across all levels (before upper-zoom expansion).
    pub missing: u64,
}

/// Write one `/zoom/column/row` line per tile absent from each zoom level's
/// bounding box to `output`, and return the per-level coverage summary.
pub fn write_missing_report(
    tileset: &Tileset,
    output: impl AsRef<Path>,
    options: &MissingReportOptions,
) -> Result<MissingReport, MbtilerError> {
    let output = output.as_ref();
    let file = File::create(output).map_err(|e| MbtilerError::Io {
        path: output.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    let mut report = MissingReport::default();

    for zoom in tileset.zoom_levels()? {
        let coords = tileset.level_coords(zoom)?;
        let Some(stats) = LevelStats::from_coords(zoom, &coords) else {
            debug!("Zoom {}: no tiles", zoom);
            continue;
        };

        for column in stats.column_min..=stats.column_max {
            for row in stats.row_min..=stats.row_max {
                if coords.contains(&(column, row)) {
                    continue;
                }
                write_missing_tile(&mut writer, zoom, column, row, options).map_err(|e| {
                    MbtilerError::Io {
                        path: output.to_path_buf(),
                        source: e,
                    }
                })?;
            }
        }

        info!(
            "Zoom {}: {} present, {} missing in a {}-tile bounding box",
            zoom,
            stats.present,
            stats.missing(),
            stats.expected()
        );
        report.missing += stats.missing();
        report.levels.push(stats);
    }

    writer.flush().map_err(|e| MbtilerError::Io {
        path: output.to_path_buf(),
        source: e,
    })?;
    Ok(report)
}

fn write_missing_tile(
    writer: &mut impl Write,
    zoom: u8,
    column: u32,
    row: u32,
    options: &MissingReportOptions,
) -> std::io::Result<()> {
    if options.upper_zoom {
        let child_zoom = zoom as u32 + 1;
        // Row-major 2x2 child ordering, matching the downsampler.
        for index in 0..4u64 {
            let child_column = 2 * column as u64 + index % 2;
            let child_row = 2 * row as u64 + index / 2;
            let out_row = if options.display_rows {
                flip_row_wide(child_row, child_zoom)
            } else {
                child_row
            };
            writeln!(writer, "/{child_zoom}/{child_column}/{out_row}")?;
        }
    } else {
        let out_row = if options.display_rows {
            flip_row_wide(row as u64, zoom as u32)
        } else {
            row as u64
        };
        writeln!(writer, "/{zoom}/{column}/{out_row}")?;
    }
    Ok(())
}

// Upper-zoom children can sit one level past the supported maximum zoom,
// where `2^zoom` no longer fits u32, so the report flips rows in u64.
fn flip_row_wide(row: u64, zoom: u32) -> u64 {
    (1u64 << zoom) - 1 - row
}

// =============================================================================
// Tests
// =============================================================================
