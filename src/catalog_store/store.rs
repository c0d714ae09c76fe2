//! SQLite-backed catalog store implementation.
//!
//! `SqliteCatalogStore` owns a single connection. Writes go through explicit
//! `BEGIN IMMEDIATE` / `COMMIT` pairs driven by the caller, so the importer
//! decides where batch boundaries fall.

use super::models::*;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::CatalogStore;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const TRACK_COLUMNS: &str = "t.track_id, t.name, t.album_id, t.media_type_id, t.genre_id, \
     t.composer, t.milliseconds, t.bytes, t.unit_price_cents";

/// SQLite-backed catalog store.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

/// Create the schema on an empty database, or check that an existing one
/// matches what this build expects.
fn bootstrap_schema(conn: &Connection) -> Result<()> {
    let latest_version = CATALOG_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &CATALOG_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!("Creating catalog db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        latest_schema.validate(conn)?;
        return Ok(());
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if db_version < BASE_DB_VERSION as i64 {
        bail!(
            "Database has {} tables but is not a catalog database (user_version {})",
            table_count,
            db_version
        );
    }
    let current_version = (db_version - BASE_DB_VERSION as i64) as usize;
    if current_version > latest_version {
        bail!(
            "Catalog db version {} is newer than the latest supported version {}",
            current_version,
            latest_version
        );
    }

    debug!("Validating catalog db schema version {}", current_version);
    CATALOG_VERSIONED_SCHEMAS[current_version].validate(conn)?;
    conn.execute("PRAGMA foreign_keys = ON;", [])?;
    Ok(())
}

impl SqliteCatalogStore {
    /// Open (or create) a catalog database file.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open catalog database: {:?}", db_path))?;

        bootstrap_schema(&conn)
            .with_context(|| format!("Failed to initialize catalog schema in {:?}", db_path))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::from_connection(conn)
    }

    /// Create an ephemeral catalog that lives as long as the store.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        bootstrap_schema(&conn).context("Failed to initialize in-memory catalog schema")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        };
        let counts = store.get_counts()?;
        info!(
            "Opened catalog: {} artists, {} albums, {} tracks, {} playlists",
            counts.artists, counts.albums, counts.tracks, counts.playlists
        );
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // =========================================================================
    // Internal Helper Methods
    // =========================================================================

    /// Parse a Track from a row selected with `TRACK_COLUMNS`.
    fn parse_track_row(row: &rusqlite::Row) -> rusqlite::Result<Track> {
        Ok(Track {
            id: row.get(0)?,
            name: row.get(1)?,
            album_id: row.get(2)?,
            media_type_id: row.get(3)?,
            genre_id: row.get(4)?,
            composer: row.get(5)?,
            milliseconds: row.get(6)?,
            bytes: row.get(7)?,
            unit_price: row.get::<_, Option<i64>>(8)?.map(UnitPrice::from_cents),
        })
    }

    fn count_rows(conn: &Connection, table: &str) -> Result<u64> {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
        Ok(count as u64)
    }

    fn insert_named(conn: &Connection, table: &str, column: &str, value: &str) -> Result<i64> {
        conn.prepare_cached(&format!("INSERT INTO {} ({}) VALUES (?1)", table, column))?
            .execute(params![value])
            .with_context(|| format!("Failed to insert into {}: {:?}", table, value))?;
        Ok(conn.last_insert_rowid())
    }

    fn list_named(conn: &Connection, sql: &str) -> Result<Vec<(i64, String)>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl CatalogStore for SqliteCatalogStore {
    // =========================================================================
    // Transactions
    // =========================================================================

    fn begin(&self) -> Result<()> {
        let conn = self.conn();
        if !conn.is_autocommit() {
            bail!("A transaction is already open");
        }
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let conn = self.conn();
        if conn.is_autocommit() {
            bail!("No open transaction to commit");
        }
        conn.execute_batch("COMMIT")
            .context("Failed to commit transaction")?;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        let conn = self.conn();
        if conn.is_autocommit() {
            return Ok(());
        }
        conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        !self.conn().is_autocommit()
    }

    // =========================================================================
    // Create
    // =========================================================================

    fn insert_artist(&self, name: &str) -> Result<Artist> {
        let id = Self::insert_named(&self.conn(), "artists", "name", name)?;
        Ok(Artist {
            id,
            name: name.to_string(),
        })
    }

    fn insert_album(&self, title: &str, artist_id: i64) -> Result<Album> {
        let conn = self.conn();
        conn.prepare_cached("INSERT INTO albums (title, artist_id) VALUES (?1, ?2)")?
            .execute(params![title, artist_id])
            .with_context(|| format!("Failed to insert album {:?}", title))?;
        Ok(Album {
            id: conn.last_insert_rowid(),
            title: title.to_string(),
            artist_id,
        })
    }

    fn insert_genre(&self, name: &str) -> Result<Genre> {
        let id = Self::insert_named(&self.conn(), "genres", "name", name)?;
        Ok(Genre {
            id,
            name: name.to_string(),
        })
    }

    fn insert_media_type(&self, name: &str) -> Result<MediaType> {
        let id = Self::insert_named(&self.conn(), "media_types", "name", name)?;
        Ok(MediaType {
            id,
            name: name.to_string(),
        })
    }

    fn insert_playlist(&self, name: &str) -> Result<Playlist> {
        let id = Self::insert_named(&self.conn(), "playlists", "name", name)?;
        Ok(Playlist {
            id,
            name: name.to_string(),
        })
    }

    fn insert_track(&self, track: &NewTrack) -> Result<Track> {
        let conn = self.conn();
        conn.prepare_cached(
            "INSERT INTO tracks (name, album_id, media_type_id, genre_id, composer,
                                 milliseconds, bytes, unit_price_cents)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?
        .execute(params![
            track.name,
            track.album_id,
            track.media_type_id,
            track.genre_id,
            track.composer,
            track.milliseconds,
            track.bytes,
            track.unit_price.map(|p| p.cents()),
        ])
        .with_context(|| format!("Failed to insert track {:?}", track.name))?;
        Ok(Track::from_new(conn.last_insert_rowid(), track))
    }

    fn insert_playlist_track(&self, playlist_id: i64, track_id: i64) -> Result<PlaylistTrack> {
        let conn = self.conn();
        conn.prepare_cached("INSERT INTO playlist_tracks (playlist_id, track_id) VALUES (?1, ?2)")?
            .execute(params![playlist_id, track_id])
            .with_context(|| {
                format!(
                    "Failed to link track {} to playlist {}",
                    track_id, playlist_id
                )
            })?;
        Ok(PlaylistTrack {
            id: conn.last_insert_rowid(),
            playlist_id,
            track_id,
        })
    }

    // =========================================================================
    // Update / Delete
    // =========================================================================

    fn rename_artist(&self, id: i64, name: &str) -> Result<()> {
        let updated = self.conn().execute(
            "UPDATE artists SET name = ?1 WHERE artist_id = ?2",
            params![name, id],
        )?;
        if updated == 0 {
            bail!("Artist {} not found", id);
        }
        Ok(())
    }

    fn rename_playlist(&self, id: i64, name: &str) -> Result<()> {
        let updated = self.conn().execute(
            "UPDATE playlists SET name = ?1 WHERE playlist_id = ?2",
            params![name, id],
        )?;
        if updated == 0 {
            bail!("Playlist {} not found", id);
        }
        Ok(())
    }

    fn delete_playlist(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "DELETE FROM playlist_tracks WHERE playlist_id = ?1",
            params![id],
        )?;
        let deleted = conn.execute("DELETE FROM playlists WHERE playlist_id = ?1", params![id])?;
        if deleted == 0 {
            bail!("Playlist {} not found", id);
        }
        Ok(())
    }

    fn delete_playlist_track(&self, id: i64) -> Result<()> {
        let deleted = self.conn().execute(
            "DELETE FROM playlist_tracks WHERE playlist_track_id = ?1",
            params![id],
        )?;
        if deleted == 0 {
            bail!("Playlist track {} not found", id);
        }
        Ok(())
    }

    // =========================================================================
    // Bulk reads (cache warm-up)
    // =========================================================================

    fn list_artists(&self) -> Result<Vec<Artist>> {
        let rows = Self::list_named(
            &self.conn(),
            "SELECT artist_id, name FROM artists ORDER BY artist_id",
        )?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| Artist { id, name })
            .collect())
    }

    fn list_albums(&self) -> Result<Vec<Album>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT album_id, title, artist_id FROM albums ORDER BY album_id")?;
        let albums = stmt
            .query_map([], |r| {
                Ok(Album {
                    id: r.get(0)?,
                    title: r.get(1)?,
                    artist_id: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(albums)
    }

    fn list_genres(&self) -> Result<Vec<Genre>> {
        let rows = Self::list_named(
            &self.conn(),
            "SELECT genre_id, name FROM genres ORDER BY genre_id",
        )?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| Genre { id, name })
            .collect())
    }

    fn list_media_types(&self) -> Result<Vec<MediaType>> {
        let rows = Self::list_named(
            &self.conn(),
            "SELECT media_type_id, name FROM media_types ORDER BY media_type_id",
        )?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| MediaType { id, name })
            .collect())
    }

    fn list_playlists(&self) -> Result<Vec<Playlist>> {
        let rows = Self::list_named(
            &self.conn(),
            "SELECT playlist_id, name FROM playlists ORDER BY playlist_id",
        )?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| Playlist { id, name })
            .collect())
    }

    fn list_tracks_with_album_title(&self) -> Result<Vec<TrackWithAlbumTitle>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, a.title FROM tracks t
             LEFT JOIN albums a ON a.album_id = t.album_id
             ORDER BY t.track_id",
            TRACK_COLUMNS
        ))?;
        let tracks = stmt
            .query_map([], |r| {
                Ok(TrackWithAlbumTitle {
                    track: Self::parse_track_row(r)?,
                    album_title: r.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    fn list_playlist_track_names(&self) -> Result<Vec<PlaylistTrackNames>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT p.name, t.name, a.title FROM playlist_tracks pt
             JOIN playlists p ON p.playlist_id = pt.playlist_id
             JOIN tracks t ON t.track_id = pt.track_id
             LEFT JOIN albums a ON a.album_id = t.album_id
             ORDER BY pt.playlist_track_id",
        )?;
        let names = stmt
            .query_map([], |r| {
                Ok(PlaylistTrackNames {
                    playlist_name: r.get(0)?,
                    track_name: r.get(1)?,
                    album_title: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    fn get_album(&self, id: i64) -> Result<Option<Album>> {
        let album = self
            .conn()
            .query_row(
                "SELECT album_id, title, artist_id FROM albums WHERE album_id = ?1",
                params![id],
                |r| {
                    Ok(Album {
                        id: r.get(0)?,
                        title: r.get(1)?,
                        artist_id: r.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(album)
    }

    fn get_track(&self, id: i64) -> Result<Option<Track>> {
        let track = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM tracks t WHERE t.track_id = ?1", TRACK_COLUMNS),
                params![id],
                Self::parse_track_row,
            )
            .optional()?;
        Ok(track)
    }

    fn find_artist_by_name(&self, name: &str) -> Result<Option<Artist>> {
        let artist = self
            .conn()
            .query_row(
                "SELECT artist_id, name FROM artists WHERE name = ?1 ORDER BY artist_id LIMIT 1",
                params![name],
                |r| {
                    Ok(Artist {
                        id: r.get(0)?,
                        name: r.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(artist)
    }

    fn find_playlist_by_name(&self, name: &str) -> Result<Option<Playlist>> {
        let playlist = self
            .conn()
            .query_row(
                "SELECT playlist_id, name FROM playlists WHERE name = ?1 ORDER BY playlist_id LIMIT 1",
                params![name],
                |r| {
                    Ok(Playlist {
                        id: r.get(0)?,
                        name: r.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(playlist)
    }

    fn find_track_by_name_and_album(&self, name: &str, album_id: i64) -> Result<Option<Track>> {
        let track = self
            .conn()
            .query_row(
                &format!(
                    "SELECT {} FROM tracks t WHERE t.name = ?1 AND t.album_id = ?2
                     ORDER BY t.track_id LIMIT 1",
                    TRACK_COLUMNS
                ),
                params![name, album_id],
                Self::parse_track_row,
            )
            .optional()?;
        Ok(track)
    }

    fn get_playlist_tracks(&self, playlist_id: i64) -> Result<Vec<Track>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM playlist_tracks pt
             JOIN tracks t ON t.track_id = pt.track_id
             WHERE pt.playlist_id = ?1
             ORDER BY pt.playlist_track_id",
            TRACK_COLUMNS
        ))?;
        let tracks = stmt
            .query_map(params![playlist_id], Self::parse_track_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    fn get_counts(&self) -> Result<CatalogCounts> {
        let conn = self.conn();
        Ok(CatalogCounts {
            artists: Self::count_rows(&conn, "artists")?,
            albums: Self::count_rows(&conn, "albums")?,
            genres: Self::count_rows(&conn, "genres")?,
            media_types: Self::count_rows(&conn, "media_types")?,
            tracks: Self::count_rows(&conn, "tracks")?,
            playlists: Self::count_rows(&conn, "playlists")?,
            playlist_tracks: Self::count_rows(&conn, "playlist_tracks")?,
        })
    }

    fn top_cost_per_minute(&self, limit: usize) -> Result<Vec<PlaylistCostPerMinute>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT p.playlist_id, p.name,
                    COALESCE(SUM(t.unit_price_cents), 0),
                    SUM(t.milliseconds),
                    (COALESCE(SUM(t.unit_price_cents), 0) / 100.0)
                        / (SUM(t.milliseconds) / 60000.0)
             FROM playlists p
             JOIN playlist_tracks pt ON pt.playlist_id = p.playlist_id
             JOIN tracks t ON t.track_id = pt.track_id
             GROUP BY p.playlist_id, p.name
             HAVING SUM(t.milliseconds) > 0
             ORDER BY 5 DESC, p.name ASC, p.playlist_id ASC
             LIMIT ?1",
        )?;
        let ranking = stmt
            .query_map(params![limit as i64], |r| {
                Ok(PlaylistCostPerMinute {
                    playlist_id: r.get(0)?,
                    playlist_name: r.get(1)?,
                    total_price: r.get::<_, i64>(2)? as f64 / 100.0,
                    total_milliseconds: r.get(3)?,
                    cost_per_minute: r.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ranking)
    }

    fn find_genre_ignore_case(&self, name: &str) -> Result<Option<Genre>> {
        let genre = self
            .conn()
            .query_row(
                "SELECT genre_id, name FROM genres WHERE LOWER(name) = LOWER(?1)
                 ORDER BY genre_id LIMIT 1",
                params![name],
                |r| {
                    Ok(Genre {
                        id: r.get(0)?,
                        name: r.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(genre)
    }

    fn count_playlists_only_in_genre(&self, genre_id: i64) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM playlists p
             WHERE EXISTS (
                 SELECT 1 FROM playlist_tracks pt1 WHERE pt1.playlist_id = p.playlist_id
             )
             AND NOT EXISTS (
                 SELECT 1 FROM playlist_tracks pt2
                 JOIN tracks t2 ON t2.track_id = pt2.track_id
                 WHERE pt2.playlist_id = p.playlist_id
                   AND (t2.genre_id IS NULL OR t2.genre_id <> ?1)
             )",
            params![genre_id],
            |r| r.get(0),
        )?;
        Ok(count as u64)
    }
}
