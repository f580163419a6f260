//! Shared helpers for building fixture MBTiles archives and tile images.

use std::path::Path;

use image::{ExtendedColorType, ImageEncoder};
use rusqlite::Connection;

/// Encode a solid-color RGBA PNG of the given size.
pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let mut pixels = vec![0u8; (width * height * 4) as usize];
    for pixel in pixels.chunks_exact_mut(4) {
        pixel.copy_from_slice(&rgba);
    }
    let mut png = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png)
        .write_image(&pixels, width, height, ExtendedColorType::Rgba8)
        .unwrap();
    png
}

/// Create an MBTiles file with the standard `tiles` schema and the given
/// `(zoom, column, store_row, blob)` rows.
pub fn create_archive(path: &Path, tiles: &[(i64, i64, i64, Vec<u8>)]) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE tiles (zoom_level INTEGER, tile_column INTEGER, \
         tile_row INTEGER, tile_data BLOB);",
    )
    .unwrap();
    for (zoom, column, row, data) in tiles {
        conn.execute(
            "INSERT INTO tiles(zoom_level, tile_column, tile_row, tile_data) \
             VALUES(?1, ?2, ?3, ?4)",
            (zoom, column, row, data),
        )
        .unwrap();
    }
}

/// A fixture archive holding a complete 2x2 quad at zoom 1 plus the single
/// zoom-0 tile. Store rows are TMS (south-counted).
pub fn create_pyramid_archive(path: &Path) -> usize {
    let mut tiles = Vec::new();
    tiles.push((0i64, 0i64, 0i64, solid_png(8, 8, [128, 128, 128, 255])));
    for (column, row_store) in [(0i64, 0i64), (0, 1), (1, 0), (1, 1)] {
        tiles.push((1, column, row_store, solid_png(8, 8, [100, 150, 200, 255])));
    }
    let count = tiles.len();
    create_archive(path, &tiles);
    count
}
