//! MBTiles archive access.
//!
//! [`Tileset`] wraps one SQLite connection to an MBTiles file and exposes
//! the narrow contract the rest of the crate consumes:
//!
//! - a sequential [`TileCursor`] over every stored tile,
//! - key/value metadata CRUD against the `metadata` relation,
//! - tile extraction to a directory tree driven by a [`PathPattern`].
//!
//! The connection is owned for the lifetime of the `Tileset` and closed on
//! drop. Metadata writes run inside a single `BEGIN IMMEDIATE` transaction,
//! so a batch either lands whole or not at all.

mod cursor;

pub use cursor::{Tile, TileCursor};

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use rusqlite::{Connection, ErrorCode, TransactionBehavior};
use tracing::info;

use crate::coord;
use crate::error::{MbtilerError, StoreError};
use crate::format;
use crate::pattern::PathPattern;

/// An open MBTiles archive.
pub struct Tileset {
    conn: Connection,
    path: PathBuf,
}

impl Tileset {
    /// Open (or create) an MBTiles file.
    ///
    /// # Errors
    ///
    /// [`StoreError::Open`] when SQLite cannot open the path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|e| StoreError::Open {
            path: path.clone(),
            source: e,
        })?;
        Ok(Self { conn, path })
    }

    /// Path this archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start a sequential scan over all stored tiles.
    ///
    /// The cursor resolves each tile's extension from the archive's
    /// `format` metadata when declared, falling back to blob signature
    /// sniffing.
    pub fn tiles(&self) -> Result<TileCursor<'_>, StoreError> {
        let metadata_extension = self.format_extension()?;
        TileCursor::new(&self.conn, metadata_extension)
    }

    /// The archive's declared tile format as a normalized extension, if
    /// any. Archives without a metadata table simply have no declaration.
    pub fn format_extension(&self) -> Result<Option<String>, StoreError> {
        let mut stmt = match self
            .conn
            .prepare("SELECT value FROM metadata WHERE name = 'format' LIMIT 1")
        {
            Ok(stmt) => stmt,
            // No metadata table at all
            Err(_) => return Ok(None),
        };
        let value: Option<String> = stmt
            .query_row([], |row| row.get(0))
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(value
            .map(|v| format::normalize_extension(&v))
            .filter(|v| !v.is_empty()))
    }

    /// Distinct zoom levels present in the archive, ascending.
    ///
    /// A zoom level outside 0-62 fails the call (corrupt archive), matching
    /// the cursor's policy.
    pub fn zoom_levels(&self) -> Result<Vec<u8>, MbtilerError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT zoom_level FROM tiles ORDER BY zoom_level")
            .map_err(StoreError::from)?;
        let raw = stmt
            .query_map([], |row| row.get::<_, i64>(0))
            .map_err(StoreError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;
        raw.into_iter()
            .map(|zoom| coord::check_zoom(zoom).map_err(MbtilerError::from))
            .collect()
    }

    /// All `(column, store_row)` coordinates present at one zoom level.
    ///
    /// Rows stay in the store (TMS) convention; both indices are validated
    /// against the zoom level's range.
    pub fn level_coords(&self, zoom: u8) -> Result<BTreeSet<(u32, u32)>, MbtilerError> {
        let mut stmt = self
            .conn
            .prepare("SELECT tile_column, tile_row FROM tiles WHERE zoom_level = ?1")
            .map_err(StoreError::from)?;
        let raw = stmt
            .query_map([zoom], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(StoreError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;

        let mut coords = BTreeSet::new();
        for (column_raw, row_raw) in raw {
            let column = coord::check_column(column_raw, zoom)?;
            let row = coord::check_row(row_raw, zoom)?;
            coords.insert((column, row));
        }
        Ok(coords)
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// All metadata entries, ordered alphabetically by key.
    pub fn metadata(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, value FROM metadata ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            ))
        })?;
        let mut result = BTreeMap::new();
        for row in rows {
            let (name, value) = row?;
            result.insert(name, value);
        }
        Ok(result)
    }

    /// All metadata keys, ordered alphabetically.
    pub fn metadata_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT name FROM metadata ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(row.get::<_, Option<String>>(0)?.unwrap_or_default())
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Write a batch of metadata entries as one atomic transaction.
    ///
    /// With `overwrite = false`, any existing key fails the entire batch
    /// and nothing is written. The metadata table is created lazily on
    /// first write.
    pub fn set_metadata(
        &mut self,
        entries: &BTreeMap<String, String>,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        // Lazy table creation rolls back with the batch.
        tx.execute(
            "CREATE TABLE IF NOT EXISTS metadata (name TEXT PRIMARY KEY, value TEXT)",
            [],
        )?;
        {
            let sql = if overwrite {
                "INSERT INTO metadata(name, value) VALUES(?1, ?2) \
                 ON CONFLICT(name) DO UPDATE SET value = excluded.value"
            } else {
                "INSERT INTO metadata(name, value) VALUES(?1, ?2)"
            };
            let mut stmt = tx.prepare(sql)?;
            for (key, value) in entries {
                stmt.execute((key, value)).map_err(|e| match e {
                    rusqlite::Error::SqliteFailure(inner, _)
                        if inner.code == ErrorCode::ConstraintViolation =>
                    {
                        StoreError::MetadataKeyExists { key: key.clone() }
                    }
                    other => StoreError::Sqlite(other),
                })?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Write a single metadata entry.
    pub fn set_metadata_entry(
        &mut self,
        key: &str,
        value: &str,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        let mut entries = BTreeMap::new();
        entries.insert(key.to_string(), value.to_string());
        self.set_metadata(&entries, overwrite)
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    /// Extract every tile to `output_dir`, naming files with `pattern`.
    ///
    /// Returns the number of tiles written. When the rendered path has no
    /// extension and the tile's extension is known, a dot-extension is
    /// appended so files stay openable.
    pub fn extract(
        &self,
        output_dir: impl AsRef<Path>,
        pattern: &PathPattern,
    ) -> Result<usize, MbtilerError> {
        let output_root = output_dir.as_ref();
        std::fs::create_dir_all(output_root).map_err(|e| MbtilerError::Io {
            path: output_root.to_path_buf(),
            source: e,
        })?;

        let mut cursor = self.tiles().map_err(MbtilerError::from)?;
        let total = cursor.remaining();
        let mut count = 0usize;

        while let Some(tile) = cursor.next()? {
            let relative = pattern.render(tile.zoom, tile.column, tile.row, &tile.extension);
            let mut output_path = output_root.join(relative);
            if output_path.extension().is_none() && !tile.extension.is_empty() {
                output_path.set_extension(&tile.extension);
            }

            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| MbtilerError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            std::fs::write(&output_path, &tile.data).map_err(|e| MbtilerError::Io {
                path: output_path.clone(),
                source: e,
            })?;

            count += 1;
            if count % 100 == 0 {
                info!("Extracted {}/{} tiles...", count, total);
            }
        }

        info!("Extraction completed. Total tiles: {}", count);
        Ok(count)
    }
}

// =============================================================================
// Tests
// =============================================================================
