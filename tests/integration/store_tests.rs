//! End-to-end tests for archive access: extraction layout, extension
//! resolution, pattern rendering, and metadata semantics on real files.

use std::collections::BTreeMap;

use mbtiler::pattern::{PathPattern, DEFAULT_PATTERN};
use mbtiler::store::Tileset;
use mbtiler::StoreError;

use super::test_utils::{create_archive, create_pyramid_archive, solid_png};

#[test]
fn test_extract_default_pattern_layout() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fixture.mbtiles");
    let expected = create_pyramid_archive(&archive);

    let tileset = Tileset::open(&archive).unwrap();
    let pattern = PathPattern::parse(DEFAULT_PATTERN).unwrap();
    let output = dir.path().join("tiles");
    let count = tileset.extract(&output, &pattern).unwrap();
    assert_eq!(count, expected);

    // Zoom 0 has a single tile; store row equals display row there.
    assert!(output.join("0/0/0.png").is_file());
    // At zoom 1 the stored row 0 is the southern row, display row 1.
    assert!(output.join("1/0/1.png").is_file());
    assert!(output.join("1/0/0.png").is_file());
    assert!(output.join("1/1/0.png").is_file());
    assert!(output.join("1/1/1.png").is_file());
}

#[test]
fn test_extract_zero_padded_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fixture.mbtiles");
    create_archive(&archive, &[(3, 5, 0, solid_png(4, 4, [0, 0, 0, 255]))]);

    let tileset = Tileset::open(&archive).unwrap();
    let pattern = PathPattern::parse("{ZZ}/{XXX}/{YYY}.{ext}").unwrap();
    let output = dir.path().join("tiles");
    tileset.extract(&output, &pattern).unwrap();

    // Store row 0 at zoom 3 is display row 7.
    assert!(output.join("03/005/007.png").is_file());
}

#[test]
fn test_extract_honors_metadata_format() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fixture.mbtiles");
    // PNG bytes, but the archive declares JPEG.
    create_archive(&archive, &[(0, 0, 0, solid_png(4, 4, [9, 9, 9, 255]))]);
    let mut tileset = Tileset::open(&archive).unwrap();
    tileset.set_metadata_entry("format", "jpeg", true).unwrap();

    let pattern = PathPattern::parse(DEFAULT_PATTERN).unwrap();
    let output = dir.path().join("tiles");
    tileset.extract(&output, &pattern).unwrap();
    assert!(output.join("0/0/0.jpg").is_file());
}

#[test]
fn test_extract_sniffs_unknown_blob_as_bin() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fixture.mbtiles");
    create_archive(&archive, &[(0, 0, 0, vec![0u8; 32])]);

    let tileset = Tileset::open(&archive).unwrap();
    let pattern = PathPattern::parse(DEFAULT_PATTERN).unwrap();
    let output = dir.path().join("tiles");
    tileset.extract(&output, &pattern).unwrap();
    assert!(output.join("0/0/0.bin").is_file());
}

#[test]
fn test_metadata_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fixture.mbtiles");

    {
        let mut tileset = Tileset::open(&archive).unwrap();
        let mut entries = BTreeMap::new();
        entries.insert("name".to_string(), "hills".to_string());
        entries.insert("format".to_string(), "png".to_string());
        tileset.set_metadata(&entries, true).unwrap();
    }

    let tileset = Tileset::open(&archive).unwrap();
    let metadata = tileset.metadata().unwrap();
    assert_eq!(metadata["name"], "hills");
    assert_eq!(tileset.metadata_keys().unwrap(), vec!["format", "name"]);
}

#[test]
fn test_metadata_no_overwrite_preserves_existing_value() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fixture.mbtiles");

    let mut tileset = Tileset::open(&archive).unwrap();
    tileset.set_metadata_entry("name", "original", false).unwrap();
    let err = tileset
        .set_metadata_entry("name", "replacement", false)
        .unwrap_err();
    assert!(matches!(err, StoreError::MetadataKeyExists { ref key } if key == "name"));
    assert_eq!(tileset.metadata().unwrap()["name"], "original");
}

#[test]
fn test_cursor_reports_remaining() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fixture.mbtiles");
    create_pyramid_archive(&archive);

    let tileset = Tileset::open(&archive).unwrap();
    let mut cursor = tileset.tiles().unwrap();
    assert_eq!(cursor.remaining(), 5);
    cursor.next().unwrap().unwrap();
    assert_eq!(cursor.remaining(), 4);
}
