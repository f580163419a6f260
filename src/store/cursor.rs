//! Sequential tile cursor over an MBTiles archive.
//!
//! The cursor snapshots the coordinate set of the `tiles` relation up front
//! (three integers per tile) and then pulls each blob on demand, so tile
//! data itself is never held for more than one tile at a time. This also
//! works for archives where `tiles` is a SQL view, which have no stable
//! rowid to page over.
//!
//! Per tile the cursor converts the stored TMS row to the display (XYZ)
//! convention and resolves the extension: the archive's declared `format`
//! metadata wins, otherwise the blob signature is sniffed.

use rusqlite::Connection;

use crate::coord;
use crate::error::{MbtilerError, StoreError};
use crate::format;

/// One tile streamed out of the store.
#[derive(Debug, Clone)]
pub struct Tile {
    pub zoom: u8,
    pub column: u32,
    /// Row in the display (XYZ) convention, counted from the north.
    pub row: u32,
    /// Row as persisted (TMS), counted from the south.
    pub row_store: u32,
    /// Encoded raster blob as stored.
    pub data: Vec<u8>,
    /// Normalized extension without a leading dot (`png`, `jpg`, ...).
    pub extension: String,
}

/// A one-shot scan over every tile in the archive.
///
/// Not safe for concurrent `next()` calls; create one cursor per scan.
/// Distinct cursors over the same read-only archive are independent.
pub struct TileCursor<'conn> {
    conn: &'conn Connection,
    coords: std::vec::IntoIter<(i64, i64, i64)>,
    metadata_extension: Option<String>,
}

impl<'conn> TileCursor<'conn> {
    pub(crate) fn new(
        conn: &'conn Connection,
        metadata_extension: Option<String>,
    ) -> Result<Self, StoreError> {
        let mut stmt = conn.prepare("SELECT zoom_level, tile_column, tile_row FROM tiles")?;
        let coords = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            conn,
            coords: coords.into_iter(),
            metadata_extension,
        })
    }

    /// Number of tiles remaining in the scan.
    pub fn remaining(&self) -> usize {
        self.coords.len()
    }

    /// Fetch the next tile, or `None` when the scan is exhausted.
    ///
    /// # Errors
    ///
    /// A zoom level outside 0-62 or an out-of-range row fails the whole
    /// iteration (corrupt archive); store failures propagate as
    /// [`StoreError`].
    pub fn next(&mut self) -> Result<Option<Tile>, MbtilerError> {
        let Some((zoom_raw, column_raw, row_raw)) = self.coords.next() else {
            return Ok(None);
        };

        let zoom = coord::check_zoom(zoom_raw)?;
        let row_store = coord::check_row(row_raw, zoom)?;
        let row = coord::to_display_row(row_store, zoom)?;
        let column = coord::check_column(column_raw, zoom)?;

        let data: Vec<u8> = self
            .conn
            .query_row(
                "SELECT tile_data FROM tiles \
                 WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3",
                (zoom_raw, column_raw, row_raw),
                |r| r.get::<_, Option<Vec<u8>>>(0),
            )
            .map_err(StoreError::from)?
            .unwrap_or_default();

        let extension = match &self.metadata_extension {
            Some(ext) => ext.clone(),
            None => format::detect_extension(&data).to_string(),
        };

        Ok(Some(Tile {
            zoom,
            column,
            row,
            row_store,
            data,
            extension,
        }))
    }
}
