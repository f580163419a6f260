//! Full-pipeline tests: extract an archive, derive the coarser level from
//! the extracted tree, then run the grayscale pass over the result.

use mbtiler::grayscale::{convert_directory, GrayscaleOptions};
use mbtiler::pattern::{PathPattern, DEFAULT_PATTERN};
use mbtiler::pixel::PixelBuffer;
use mbtiler::pyramid::{downsample, DownsampleOptions};
use mbtiler::store::Tileset;

use super::test_utils::create_pyramid_archive;

#[test]
fn test_extract_then_downsample() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fixture.mbtiles");
    create_pyramid_archive(&archive);

    let tileset = Tileset::open(&archive).unwrap();
    let pattern = PathPattern::parse(DEFAULT_PATTERN).unwrap();
    let extracted = dir.path().join("tiles");
    tileset.extract(&extracted, &pattern).unwrap();

    // The extracted tree's highest level (zoom 1) holds a complete quad,
    // so the derived zoom 0 has exactly one tile.
    let derived = dir.path().join("derived");
    let report = downsample(&extracted, &derived, &DownsampleOptions::default()).unwrap();
    assert_eq!(report.source_zoom, 1);
    assert_eq!(report.written, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failed, 0);

    let parent = PixelBuffer::load(&derived.join("0/0/0.png")).unwrap();
    assert_eq!(parent.width(), 8);
    assert_eq!(parent.height(), 8);
    // All four children are the same solid color; the parent must be too.
    for pixel in parent.pixels().chunks_exact(4) {
        assert!((pixel[0] as i32 - 100).abs() <= 1);
        assert!((pixel[1] as i32 - 150).abs() <= 1);
        assert!((pixel[2] as i32 - 200).abs() <= 1);
    }
}

#[test]
fn test_extract_downsample_grayscale_chain() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fixture.mbtiles");
    create_pyramid_archive(&archive);

    let tileset = Tileset::open(&archive).unwrap();
    let pattern = PathPattern::parse(DEFAULT_PATTERN).unwrap();
    let extracted = dir.path().join("tiles");
    tileset.extract(&extracted, &pattern).unwrap();

    let derived = dir.path().join("derived");
    downsample(&extracted, &derived, &DownsampleOptions::default()).unwrap();

    let gray = dir.path().join("gray");
    let count = convert_directory(&derived, &gray, &GrayscaleOptions::default()).unwrap();
    assert_eq!(count, 1);

    let tile = PixelBuffer::load(&gray.join("0/0/0.png")).unwrap();
    for pixel in tile.pixels().chunks_exact(4) {
        assert_eq!(pixel[0], pixel[1]);
        assert_eq!(pixel[1], pixel[2]);
    }
}

#[test]
fn test_downsample_grayscale_flag_matches_separate_pass() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fixture.mbtiles");
    create_pyramid_archive(&archive);

    let tileset = Tileset::open(&archive).unwrap();
    let pattern = PathPattern::parse(DEFAULT_PATTERN).unwrap();
    let extracted = dir.path().join("tiles");
    tileset.extract(&extracted, &pattern).unwrap();

    // Inline grayscale during downsampling.
    let inline = dir.path().join("inline");
    let options = DownsampleOptions {
        grayscale: true,
        ..Default::default()
    };
    downsample(&extracted, &inline, &options).unwrap();

    // Plain downsample followed by a grayscale pass.
    let plain = dir.path().join("plain");
    downsample(&extracted, &plain, &DownsampleOptions::default()).unwrap();
    let separate = dir.path().join("separate");
    convert_directory(&plain, &separate, &GrayscaleOptions::default()).unwrap();

    let a = PixelBuffer::load(&inline.join("0/0/0.png")).unwrap();
    let b = PixelBuffer::load(&separate.join("0/0/0.png")).unwrap();
    assert_eq!(a.pixels(), b.pixels());
}
