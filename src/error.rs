use std::path::PathBuf;

use thiserror::Error;

/// Errors from tile coordinate and row-convention math.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordError {
    /// Zoom level outside the supported range (0-62)
    #[error("Unsupported zoom level: {zoom} (supported range is 0-62)")]
    ZoomOutOfRange { zoom: i64 },

    /// Converted row falls outside [0, 2^zoom - 1]
    #[error("Tile row {row} is outside the representable range for zoom level {zoom}")]
    RowOutOfRange { row: i64, zoom: u8 },

    /// Stored column is negative or does not fit the coordinate type
    #[error("Tile column {column} is outside the representable range for zoom level {zoom}")]
    ColumnOutOfRange { column: i64, zoom: u8 },
}

/// Errors from the output path pattern formatter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatternError {
    /// A '{' without a matching '}'
    #[error("Unclosed placeholder in pattern: {pattern}")]
    UnclosedPlaceholder { pattern: String },

    /// An empty "{}" placeholder
    #[error("Empty placeholder in pattern: {pattern}")]
    EmptyPlaceholder { pattern: String },

    /// A placeholder that matches no known token
    #[error("Unknown placeholder '{{{token}}}' in pattern: {pattern}")]
    UnknownPlaceholder { token: String, pattern: String },
}

/// Errors from decoding, encoding, and saving pixel buffers.
#[derive(Debug, Error)]
pub enum PixelError {
    /// Blob could not be decoded as a raster image
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// Pixel buffer could not be encoded to the target format
    #[error("Failed to encode image: {message}")]
    Encode { message: String },

    /// Filesystem failure while saving an image
    #[error("Failed to write image to '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Parent directory chain could not be created
    #[error("Failed to create directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors from the backing MBTiles SQLite store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Archive could not be opened
    #[error("Unable to open MBTiles file '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    /// Query preparation or execution failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Metadata batch rejected because a key already exists
    #[error("Metadata key '{key}' already exists and overwrite is disabled")]
    MetadataKeyExists { key: String },
}

/// Top-level error for mbtiler operations.
///
/// Each operation either completes and reports a count, or fails with the
/// first fatal error. Per-parent decode and dimension-mismatch conditions
/// during downsampling are recovered locally and never surface here.
#[derive(Debug, Error)]
pub enum MbtilerError {
    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Pixel(#[from] PixelError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// No tiles found at the requested zoom level
    #[error("No tiles found at zoom level {zoom} under '{}'", path.display())]
    NoTiles { zoom: u8, path: PathBuf },

    /// Input directory missing or not a directory
    #[error("Input path is not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// Downsample input has no numeric zoom-level directories
    #[error("No zoom level directories found under '{}'", path.display())]
    NoZoomLevels { path: PathBuf },

    /// Zoom 0 has no coarser neighbor to derive
    #[error("Zoom level 0 has no coarser level to derive")]
    SourceZoomTooLow,

    /// Requested metadata key does not exist
    #[error("Metadata key '{key}' not found")]
    MetadataKeyNotFound { key: String },

    /// Filesystem failure outside the image save path
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
