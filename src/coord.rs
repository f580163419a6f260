//! Tile coordinate math.
//!
//! MBTiles archives store tile rows in the TMS convention (counted from the
//! southern edge) while virtually every map client addresses tiles in the
//! XYZ convention (counted from the northern edge). This module converts
//! between the two and computes the WGS84 longitude/latitude of a tile's
//! northwest corner via the inverse Web Mercator projection.
//!
//! Both row conventions are bijective at a fixed zoom:
//! `row_display = 2^zoom - 1 - row_store`.

use crate::error::CoordError;

/// Highest zoom level for which `2^zoom` fits in a signed 64-bit value
/// with headroom for the row arithmetic.
pub const MAX_ZOOM: u8 = 62;

/// Validate that a zoom level is within the supported range.
pub fn check_zoom(zoom: i64) -> Result<u8, CoordError> {
    if !(0..=MAX_ZOOM as i64).contains(&zoom) {
        return Err(CoordError::ZoomOutOfRange { zoom });
    }
    Ok(zoom as u8)
}

/// Validate that a row index fits `[0, 2^zoom - 1]`.
///
/// Applies equally to store (TMS) and display (XYZ) rows; the two
/// conventions share one value range per zoom.
pub fn check_row(row: i64, zoom: u8) -> Result<u32, CoordError> {
    check_zoom(zoom as i64)?;
    let max_row = (1i64 << zoom) - 1;
    if row < 0 || row > max_row || row > u32::MAX as i64 {
        return Err(CoordError::RowOutOfRange { row, zoom });
    }
    Ok(row as u32)
}

/// Validate that a column index fits `[0, 2^zoom - 1]`.
pub fn check_column(column: i64, zoom: u8) -> Result<u32, CoordError> {
    check_zoom(zoom as i64)?;
    let max_column = (1i64 << zoom) - 1;
    if column < 0 || column > max_column || column > u32::MAX as i64 {
        return Err(CoordError::ColumnOutOfRange { column, zoom });
    }
    Ok(column as u32)
}

/// Convert a store (TMS) row to a display (XYZ) row.
///
/// # Errors
///
/// Returns [`CoordError::RowOutOfRange`] if the input row does not fit in
/// `[0, 2^zoom - 1]`, and [`CoordError::ZoomOutOfRange`] for zooms above
/// [`MAX_ZOOM`].
pub fn to_display_row(row_store: u32, zoom: u8) -> Result<u32, CoordError> {
    flip_row(row_store, zoom)
}

/// Convert a display (XYZ) row back to a store (TMS) row.
///
/// Inverse of [`to_display_row`]; the two round-trip for every valid input.
pub fn to_store_row(row_display: u32, zoom: u8) -> Result<u32, CoordError> {
    flip_row(row_display, zoom)
}

// The flip is its own inverse, so both directions share one implementation.
fn flip_row(row: u32, zoom: u8) -> Result<u32, CoordError> {
    check_zoom(zoom as i64)?;
    let max_row = (1i64 << zoom) - 1;
    let flipped = max_row - row as i64;
    if flipped < 0 || flipped > u32::MAX as i64 {
        return Err(CoordError::RowOutOfRange {
            row: row as i64,
            zoom,
        });
    }
    Ok(flipped as u32)
}

/// Longitude/latitude of a tile's northwest corner, in degrees.
///
/// Uses the standard inverse Web Mercator projection. `row` is the display
/// (XYZ) row. Total over valid coordinate ranges; callers are expected to
/// pass coordinates already validated against the zoom level.
pub fn tile_corner_lonlat(zoom: u8, column: u32, row: u32) -> (f64, f64) {
    let n = (1u64 << zoom) as f64;
    let lon = column as f64 / n * 360.0 - 180.0;
    let lat_rad = (std::f64::consts::PI * (1.0 - 2.0 * row as f64 / n))
        .sinh()
        .atan();
    (lon, lat_rad.to_degrees())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_one_flips() {
        assert_eq!(to_display_row(0, 1).unwrap(), 1);
        assert_eq!(to_display_row(1, 1).unwrap(), 0);
    }

    #[test]
    fn test_zoom_zero_identity() {
        assert_eq!(to_display_row(0, 0).unwrap(), 0);
        assert_eq!(to_store_row(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_round_trip() {
        for zoom in [1u8, 3, 8, 16] {
            let max = (1u32 << zoom) - 1;
            for row in [0, 1, max / 2, max] {
                let display = to_display_row(row, zoom).unwrap();
                assert_eq!(to_store_row(display, zoom).unwrap(), row);
            }
        }
    }

    #[test]
    fn test_row_out_of_range() {
        let err = to_display_row(2, 1).unwrap_err();
        assert_eq!(err, CoordError::RowOutOfRange { row: 2, zoom: 1 });
    }

    #[test]
    fn test_zoom_out_of_range() {
        assert!(check_zoom(63).is_err());
        assert!(check_zoom(-1).is_err());
        assert!(check_zoom(62).is_ok());
        assert!(check_zoom(0).is_ok());
    }

    #[test]
    fn test_max_zoom_round_trip() {
        // 2^62 - 1 overflows u32 for most rows; row 2^62 - 1 maps to 0.
        let max_row_store = (1u64 << 62) - 1;
        assert!(max_row_store > u32::MAX as u64);
        assert_eq!(to_display_row(u32::MAX, 32).unwrap(), 0);
    }

    #[test]
    fn test_check_row_bounds() {
        assert_eq!(check_row(0, 0).unwrap(), 0);
        assert_eq!(check_row(7, 3).unwrap(), 7);
        assert!(matches!(
            check_row(8, 3).unwrap_err(),
            CoordError::RowOutOfRange { row: 8, zoom: 3 }
        ));
        assert!(check_row(-1, 3).is_err());
    }

    #[test]
    fn test_check_column_bounds() {
        assert_eq!(check_column(3, 2).unwrap(), 3);
        assert!(matches!(
            check_column(4, 2).unwrap_err(),
            CoordError::ColumnOutOfRange { column: 4, zoom: 2 }
        ));
        assert!(check_column(-1, 2).is_err());
    }

    #[test]
    fn test_corner_origin() {
        let (lon, lat) = tile_corner_lonlat(0, 0, 0);
        assert!((lon - -180.0).abs() < 1e-9);
        // Top of the Web Mercator square
        assert!((lat - 85.0511287798).abs() < 1e-6);
    }

    #[test]
    fn test_corner_center() {
        let (lon, lat) = tile_corner_lonlat(1, 1, 1);
        assert!((lon - 0.0).abs() < 1e-9);
        assert!((lat - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_corner_monotonic_latitude() {
        // Rows count from the north, so latitude decreases with row.
        let (_, lat0) = tile_corner_lonlat(3, 0, 0);
        let (_, lat4) = tile_corner_lonlat(3, 0, 4);
        let (_, lat7) = tile_corner_lonlat(3, 0, 7);
        assert!(lat0 > lat4);
        assert!(lat4 > lat7);
    }
}
