//! mbtiler - command-line interface for MBTiles tile pyramids.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mbtiler::{
    config::{
        CheckArgs, Cli, Command, DownsampleArgs, ExtractArgs, GrayscaleArgs, MetadataCommand,
        ReportMissingArgs,
    },
    grayscale::{convert_directory, GrayscaleOptions},
    integrity::{
        health_check, write_missing_report, HealthReport, MissingReportOptions,
        HEALTH_RATIO_THRESHOLD,
    },
    pattern::PathPattern,
    pyramid::{downsample, DownsampleOptions},
    store::Tileset,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Extract(args) => run_extract(args),
        Command::Downsample(args) => run_downsample(args),
        Command::Grayscale(args) => run_grayscale(args),
        Command::Metadata { command } => run_metadata(command),
        Command::Check(args) => run_check(args),
        Command::ReportMissing(args) => run_report_missing(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing subsystem. Verbosity maps to warn/info/debug;
/// `RUST_LOG` overrides when set.
fn init_logging(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "mbtiler=warn",
        1 => "mbtiler=info",
        _ => "mbtiler=debug",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// =============================================================================
// Extract
// =============================================================================

fn run_extract(args: ExtractArgs) -> Result<(), mbtiler::MbtilerError> {
    let pattern = PathPattern::parse(&args.pattern)?;
    let tileset = Tileset::open(&args.mbtiles)?;
    let count = tileset.extract(&args.output_dir, &pattern)?;
    println!(
        "Extracted {} tiles to '{}'",
        count,
        args.output_dir.display()
    );
    Ok(())
}

// =============================================================================
// Downsample
// =============================================================================

fn run_downsample(args: DownsampleArgs) -> Result<(), mbtiler::MbtilerError> {
    let options = DownsampleOptions {
        zoom: args.zoom,
        grayscale: args.grayscale,
        force_png: args.force_png,
    };
    let report = downsample(&args.input_dir, &args.output_dir, &options)?;
    println!(
        "Downsampled zoom {} to {}: {} tiles written, {} parents skipped",
        report.source_zoom,
        report.source_zoom - 1,
        report.written,
        report.skipped
    );
    if report.failed > 0 {
        println!("{} parent tiles failed; see the log for details", report.failed);
    }
    Ok(())
}

// =============================================================================
// Grayscale
// =============================================================================

fn run_grayscale(args: GrayscaleArgs) -> Result<(), mbtiler::MbtilerError> {
    let options = GrayscaleOptions {
        recursive: !args.no_recursive,
    };
    let count = convert_directory(&args.input_dir, &args.output_dir, &options)?;
    println!(
        "Converted {} images to grayscale in '{}'",
        count,
        args.output_dir.display()
    );
    Ok(())
}

// =============================================================================
// Integrity
// =============================================================================

fn run_check(args: CheckArgs) -> Result<(), mbtiler::MbtilerError> {
    let tileset = Tileset::open(&args.mbtiles)?;
    let report = health_check(&tileset)?;
    match &report {
        HealthReport::Empty => {
            println!("'{}' holds no tiles", args.mbtiles.display());
        }
        HealthReport::Coverage { stats, ratio } => {
            println!(
                "Zoom {}: {} of {} tiles present in columns {}-{}, rows {}-{} (coverage {:.3})",
                stats.zoom,
                stats.present,
                stats.expected(),
                stats.column_min,
                stats.column_max,
                stats.row_min,
                stats.row_max,
                ratio
            );
        }
    }

    if report.is_healthy() {
        println!("Archive is healthy (coverage >= {HEALTH_RATIO_THRESHOLD})");
    } else {
        println!("Archive is unhealthy (coverage < {HEALTH_RATIO_THRESHOLD})");
        if args.delete_unhealthy {
            // Close the connection before removing the file.
            drop(tileset);
            std::fs::remove_file(&args.mbtiles).map_err(|e| mbtiler::MbtilerError::Io {
                path: args.mbtiles.clone(),
                source: e,
            })?;
            println!("Deleted '{}'", args.mbtiles.display());
        }
    }
    Ok(())
}

fn run_report_missing(args: ReportMissingArgs) -> Result<(), mbtiler::MbtilerError> {
    let tileset = Tileset::open(&args.mbtiles)?;
    let options = MissingReportOptions {
        display_rows: args.display_rows,
        upper_zoom: args.upper_zoom,
    };
    let report = write_missing_report(&tileset, &args.output, &options)?;
    for stats in &report.levels {
        println!(
            "Zoom {}: {} present, {} missing",
            stats.zoom,
            stats.present,
            stats.missing()
        );
    }
    println!(
        "{} missing tiles written to '{}'",
        report.missing,
        args.output.display()
    );
    Ok(())
}

// =============================================================================
// Metadata
// =============================================================================

fn run_metadata(command: MetadataCommand) -> Result<(), mbtiler::MbtilerError> {
    match command {
        MetadataCommand::List { mbtiles } => {
            let tileset = Tileset::open(&mbtiles)?;
            for (key, value) in tileset.metadata()? {
                println!("{key}={value}");
            }
            Ok(())
        }
        MetadataCommand::Get { mbtiles, key } => {
            let tileset = Tileset::open(&mbtiles)?;
            let metadata = tileset.metadata()?;
            match metadata.get(&key) {
                Some(value) => {
                    println!("{value}");
                    Ok(())
                }
                None => Err(mbtiler::MbtilerError::MetadataKeyNotFound { key }),
            }
        }
        MetadataCommand::Set {
            mbtiles,
            key,
            value,
            no_overwrite,
        } => {
            let mut tileset = Tileset::open(&mbtiles)?;
            tileset.set_metadata_entry(&key, &value, !no_overwrite)?;
            Ok(())
        }
    }
}
