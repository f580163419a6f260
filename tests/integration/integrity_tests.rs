//! End-to-end tests for the integrity diagnostics: coverage health checks
//! and missing-tile reports against fixture archives on disk.

use mbtiler::integrity::{health_check, write_missing_report, HealthReport, MissingReportOptions};
use mbtiler::store::Tileset;

use super::test_utils::{create_archive, create_pyramid_archive, solid_png};

#[test]
fn test_complete_pyramid_is_healthy() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fixture.mbtiles");
    create_pyramid_archive(&archive);

    let tileset = Tileset::open(&archive).unwrap();
    let report = health_check(&tileset).unwrap();
    assert!(report.is_healthy());
    match report {
        HealthReport::Coverage { stats, .. } => {
            assert_eq!(stats.zoom, 1);
            assert_eq!(stats.present, 4);
        }
        other => panic!("unexpected report: {other:?}"),
    }
}

#[test]
fn test_truncated_ingest_is_unhealthy() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fixture.mbtiles");
    // Two far-apart tiles at zoom 6: a 64-tile bounding box, coverage 1/32.
    let blob = solid_png(4, 4, [0, 0, 0, 255]);
    create_archive(&archive, &[(6, 0, 0, blob.clone()), (6, 7, 7, blob)]);

    let tileset = Tileset::open(&archive).unwrap();
    let report = health_check(&tileset).unwrap();
    assert!(!report.is_healthy());
}

#[test]
fn test_missing_report_matches_archive_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fixture.mbtiles");
    // Zoom 1 quad with the north-east tile absent (store row 1, column 1).
    let blob = solid_png(4, 4, [0, 0, 0, 255]);
    create_archive(
        &archive,
        &[
            (1, 0, 0, blob.clone()),
            (1, 0, 1, blob.clone()),
            (1, 1, 0, blob),
        ],
    );

    let tileset = Tileset::open(&archive).unwrap();
    let output = dir.path().join("missing.txt");
    let report =
        write_missing_report(&tileset, &output, &MissingReportOptions::default()).unwrap();
    assert_eq!(report.missing, 1);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "/1/1/1\n");

    // The same gap in the display convention.
    let options = MissingReportOptions {
        display_rows: true,
        ..Default::default()
    };
    write_missing_report(&tileset, &output, &options).unwrap();
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "/1/1/0\n");
}

#[test]
fn test_missing_report_complete_pyramid_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fixture.mbtiles");
    create_pyramid_archive(&archive);

    let tileset = Tileset::open(&archive).unwrap();
    let output = dir.path().join("missing.txt");
    let report =
        write_missing_report(&tileset, &output, &MissingReportOptions::default()).unwrap();
    assert_eq!(report.missing, 0);
    assert_eq!(report.levels.len(), 2);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
}
