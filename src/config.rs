//! Command-line interface types.
//!
//! Subcommands:
//!
//! - `extract` — write every tile of an archive to a directory tree
//! - `downsample` — derive the next coarser zoom level from a tile tree
//! - `grayscale` — convert an extracted tree to grayscale
//! - `metadata list|get|set` — inspect and update archive metadata
//! - `check` — coverage health check, optionally deleting unhealthy files
//! - `report-missing` — write a per-zoom missing-tile report
//!
//! Verbosity is a global flag: default warn, `-v` info, `-vv` debug.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::pattern::DEFAULT_PATTERN;

/// mbtiler - a toolkit for MBTiles tile pyramids.
#[derive(Parser, Debug)]
#[command(name = "mbtiler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract tiles from an MBTiles archive to a directory tree.
    Extract(ExtractArgs),

    /// Derive the next coarser zoom level from an extracted tile tree.
    Downsample(DownsampleArgs),

    /// Convert an extracted tile tree to grayscale.
    Grayscale(GrayscaleArgs),

    /// Inspect and update MBTiles metadata.
    Metadata {
        #[command(subcommand)]
        command: MetadataCommand,
    },

    /// Check tile coverage at the highest zoom level.
    Check(CheckArgs),

    /// Write a report of tiles missing from each zoom level's bounding box.
    ReportMissing(ReportMissingArgs),
}

#[derive(clap::Args, Debug)]
pub struct ExtractArgs {
    /// Path to the MBTiles file.
    pub mbtiles: PathBuf,

    /// Destination directory for the extracted tiles.
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Output filename pattern using placeholders like {z}, {x}, {y},
    /// {t}, {n}, {XX}, {ext}.
    #[arg(short, long, default_value = DEFAULT_PATTERN)]
    pub pattern: String,
}

#[derive(clap::Args, Debug)]
pub struct DownsampleArgs {
    /// Directory holding the source tile tree (zoom/column/row.ext).
    pub input_dir: PathBuf,

    /// Destination directory for the derived level.
    pub output_dir: PathBuf,

    /// Source zoom level. Defaults to the highest level present.
    #[arg(short, long)]
    pub zoom: Option<u8>,

    /// Convert derived tiles to grayscale.
    #[arg(long)]
    pub grayscale: bool,

    /// Force PNG output regardless of the source tile format.
    #[arg(long)]
    pub force_png: bool,
}

#[derive(clap::Args, Debug)]
pub struct GrayscaleArgs {
    /// Directory holding the source images.
    pub input_dir: PathBuf,

    /// Destination directory for the converted images.
    pub output_dir: PathBuf,

    /// Only convert files directly under the input directory.
    #[arg(long)]
    pub no_recursive: bool,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Path to the MBTiles file.
    pub mbtiles: PathBuf,

    /// Delete the archive file when it fails the health check.
    #[arg(long)]
    pub delete_unhealthy: bool,
}

#[derive(clap::Args, Debug)]
pub struct ReportMissingArgs {
    /// Path to the MBTiles file.
    pub mbtiles: PathBuf,

    /// Text file to write the missing-tile list to.
    pub output: PathBuf,

    /// Report rows in the display (XYZ) convention instead of as stored.
    #[arg(long)]
    pub display_rows: bool,

    /// List the four child tiles at the next finer zoom for each missing
    /// tile.
    #[arg(long)]
    pub upper_zoom: bool,
}

#[derive(Subcommand, Debug)]
pub enum MetadataCommand {
    /// List all metadata key/value pairs.
    List {
        /// Path to the MBTiles file.
        mbtiles: PathBuf,
    },

    /// Read a metadata value by key.
    Get {
        /// Path to the MBTiles file.
        mbtiles: PathBuf,
        /// Metadata key to retrieve.
        key: String,
    },

    /// Write a metadata entry.
    Set {
        /// Path to the MBTiles file.
        mbtiles: PathBuf,
        /// Metadata key to write.
        key: String,
        /// Metadata value to write.
        value: String,
        /// Fail if the key already exists instead of overwriting.
        #[arg(long)]
        no_overwrite: bool,
    },
}

// =============================================================================
// Tests
// =============================================================================
