//! # mbtiler
//!
//! A toolkit for MBTiles tile pyramids. MBTiles archives persist raster
//! map tiles as blobs in a SQLite database, addressed by
//! `(zoom, column, row)` with rows counted from the south (TMS). This
//! crate streams those tiles out, converts them, and rebuilds coarser
//! zoom levels.
//!
//! ## Architecture
//!
//! - [`coord`] - row-convention conversion and tile corner geography
//! - [`pattern`] - placeholder-driven output path formatting
//! - [`format`] - blob signature sniffing and extension normalization
//! - [`store`] - MBTiles access: tile cursor, metadata CRUD, extraction
//! - [`pixel`] - owned RGBA buffers over the image codec
//! - [`pyramid`] - quad-tree downsampling to the next coarser level
//! - [`grayscale`] - recursive directory grayscale conversion
//! - [`integrity`] - coverage health check and missing-tile reporting
//! - [`config`] - CLI types; [`error`] - error taxonomy
//!
//! ## Example
//!
//! ```no_run
//! use mbtiler::pattern::PathPattern;
//! use mbtiler::store::Tileset;
//!
//! # fn main() -> Result<(), mbtiler::error::MbtilerError> {
//! let tileset = Tileset::open("map.mbtiles")?;
//! let pattern = PathPattern::parse("{z}/{x}/{y}.{ext}")?;
//! let count = tileset.extract("tiles", &pattern)?;
//! println!("extracted {count} tiles");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coord;
pub mod error;
pub mod format;
pub mod grayscale;
pub mod integrity;
pub mod pattern;
pub mod pixel;
pub mod pyramid;
pub mod store;

// Re-export commonly used types
pub use config::{
    CheckArgs, Cli, Command, DownsampleArgs, ExtractArgs, GrayscaleArgs, MetadataCommand,
    ReportMissingArgs,
};
pub use coord::{tile_corner_lonlat, to_display_row, to_store_row, MAX_ZOOM};
pub use error::{CoordError, MbtilerError, PatternError, PixelError, StoreError};
pub use format::{detect_extension, normalize_extension};
pub use grayscale::{convert_directory, GrayscaleOptions};
pub use integrity::{
    health_check, write_missing_report, HealthReport, LevelStats, MissingReport,
    MissingReportOptions, HEALTH_RATIO_THRESHOLD,
};
pub use pattern::{PathPattern, DEFAULT_PATTERN};
pub use pixel::PixelBuffer;
pub use pyramid::{downsample, DownsampleOptions, DownsampleReport};
pub use store::{Tile, TileCursor, Tileset};
