//! Test fixtures: temporary catalogs, CSV files and a store that fails on
//! demand.

use super::constants::*;
use anyhow::{bail, Result};
use catalog_loader::catalog_store::*;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;

// ============================================================================
// CSV rows
// ============================================================================

/// One CSV data line. Fields default to a valid AC/DC rock track.
#[derive(Clone, Debug)]
pub struct CsvRow {
    pub playlist: String,
    pub track: String,
    pub composer: String,
    pub milliseconds: String,
    pub bytes: String,
    pub unit_price: String,
    pub album: String,
    pub artist: String,
    pub genre: String,
    pub media_type: String,
}

pub fn row(playlist: &str, track: &str) -> CsvRow {
    CsvRow {
        playlist: playlist.to_string(),
        track: track.to_string(),
        composer: "Angus Young".to_string(),
        milliseconds: "60000".to_string(),
        bytes: "1000".to_string(),
        unit_price: "0.99".to_string(),
        album: ALBUM_BACK_IN_BLACK.to_string(),
        artist: ARTIST_ACDC.to_string(),
        genre: GENRE_ROCK.to_string(),
        media_type: MEDIA_MP3.to_string(),
    }
}

impl CsvRow {
    pub fn composer(mut self, composer: &str) -> Self {
        self.composer = composer.to_string();
        self
    }

    pub fn milliseconds(mut self, milliseconds: &str) -> Self {
        self.milliseconds = milliseconds.to_string();
        self
    }

    pub fn bytes(mut self, bytes: &str) -> Self {
        self.bytes = bytes.to_string();
        self
    }

    pub fn price(mut self, unit_price: &str) -> Self {
        self.unit_price = unit_price.to_string();
        self
    }

    pub fn album(mut self, album: &str, artist: &str) -> Self {
        self.album = album.to_string();
        self.artist = artist.to_string();
        self
    }

    pub fn genre(mut self, genre: &str) -> Self {
        self.genre = genre.to_string();
        self
    }

    pub fn to_line(&self) -> String {
        [
            self.playlist.as_str(),
            self.track.as_str(),
            self.composer.as_str(),
            self.milliseconds.as_str(),
            self.bytes.as_str(),
            self.unit_price.as_str(),
            self.album.as_str(),
            self.artist.as_str(),
            self.genre.as_str(),
            self.media_type.as_str(),
        ]
        .join(",")
    }
}

// ============================================================================
// Temporary catalog
// ============================================================================

/// A temporary directory holding a catalog database file and CSV inputs.
pub struct TestCatalog {
    pub dir: TempDir,
    pub db_path: PathBuf,
}

impl TestCatalog {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("catalog.db");
        TestCatalog { dir, db_path }
    }

    /// Open (or reopen) the catalog database file.
    pub fn open_store(&self) -> SqliteCatalogStore {
        SqliteCatalogStore::open(&self.db_path).unwrap()
    }

    /// Write a CSV with the standard header followed by `rows`.
    pub fn csv(&self, name: &str, rows: &[CsvRow]) -> PathBuf {
        let lines: Vec<String> = rows.iter().map(CsvRow::to_line).collect();
        write_csv(self, name, &lines)
    }
}

pub fn write_csv(catalog: &TestCatalog, name: &str, lines: &[String]) -> PathBuf {
    write_csv_with_header(catalog, name, Some(CSV_HEADER), lines)
}

pub fn write_csv_with_header(
    catalog: &TestCatalog,
    name: &str,
    header: Option<&str>,
    lines: &[String],
) -> PathBuf {
    let path = catalog.dir.path().join(name);
    let mut content = String::new();
    if let Some(header) = header {
        content.push_str(header);
        content.push('\n');
    }
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// Failing store
// ============================================================================

/// Delegates to a real store but fails the `fail_on_commit`-th commit
/// (1-based) without committing.
pub struct FailingCommitStore {
    pub inner: SqliteCatalogStore,
    fail_on_commit: u64,
    commits: AtomicU64,
}

impl FailingCommitStore {
    pub fn new(inner: SqliteCatalogStore, fail_on_commit: u64) -> Self {
        FailingCommitStore {
            inner,
            fail_on_commit,
            commits: AtomicU64::new(0),
        }
    }

    pub fn commit_attempts(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }
}

impl CatalogStore for FailingCommitStore {
    fn begin(&self) -> Result<()> {
        self.inner.begin()
    }

    fn commit(&self) -> Result<()> {
        let attempt = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_on_commit {
            bail!("simulated failure on commit #{}", attempt);
        }
        self.inner.commit()
    }

    fn rollback(&self) -> Result<()> {
        self.inner.rollback()
    }

    fn in_transaction(&self) -> bool {
        self.inner.in_transaction()
    }

    fn insert_artist(&self, name: &str) -> Result<Artist> {
        self.inner.insert_artist(name)
    }

    fn insert_album(&self, title: &str, artist_id: i64) -> Result<Album> {
        self.inner.insert_album(title, artist_id)
    }

    fn insert_genre(&self, name: &str) -> Result<Genre> {
        self.inner.insert_genre(name)
    }

    fn insert_media_type(&self, name: &str) -> Result<MediaType> {
        self.inner.insert_media_type(name)
    }

    fn insert_playlist(&self, name: &str) -> Result<Playlist> {
        self.inner.insert_playlist(name)
    }

    fn insert_track(&self, track: &NewTrack) -> Result<Track> {
        self.inner.insert_track(track)
    }

    fn insert_playlist_track(&self, playlist_id: i64, track_id: i64) -> Result<PlaylistTrack> {
        self.inner.insert_playlist_track(playlist_id, track_id)
    }

    fn rename_artist(&self, id: i64, name: &str) -> Result<()> {
        self.inner.rename_artist(id, name)
    }

    fn rename_playlist(&self, id: i64, name: &str) -> Result<()> {
        self.inner.rename_playlist(id, name)
    }

    fn delete_playlist(&self, id: i64) -> Result<()> {
        self.inner.delete_playlist(id)
    }

    fn delete_playlist_track(&self, id: i64) -> Result<()> {
        self.inner.delete_playlist_track(id)
    }

    fn list_artists(&self) -> Result<Vec<Artist>> {
        self.inner.list_artists()
    }

    fn list_albums(&self) -> Result<Vec<Album>> {
        self.inner.list_albums()
    }

    fn list_genres(&self) -> Result<Vec<Genre>> {
        self.inner.list_genres()
    }

    fn list_media_types(&self) -> Result<Vec<MediaType>> {
        self.inner.list_media_types()
    }

    fn list_playlists(&self) -> Result<Vec<Playlist>> {
        self.inner.list_playlists()
    }

    fn list_tracks_with_album_title(&self) -> Result<Vec<TrackWithAlbumTitle>> {
        self.inner.list_tracks_with_album_title()
    }

    fn list_playlist_track_names(&self) -> Result<Vec<PlaylistTrackNames>> {
        self.inner.list_playlist_track_names()
    }

    fn get_album(&self, id: i64) -> Result<Option<Album>> {
        self.inner.get_album(id)
    }

    fn get_track(&self, id: i64) -> Result<Option<Track>> {
        self.inner.get_track(id)
    }

    fn find_artist_by_name(&self, name: &str) -> Result<Option<Artist>> {
        self.inner.find_artist_by_name(name)
    }

    fn find_playlist_by_name(&self, name: &str) -> Result<Option<Playlist>> {
        self.inner.find_playlist_by_name(name)
    }

    fn find_track_by_name_and_album(&self, name: &str, album_id: i64) -> Result<Option<Track>> {
        self.inner.find_track_by_name_and_album(name, album_id)
    }

    fn get_playlist_tracks(&self, playlist_id: i64) -> Result<Vec<Track>> {
        self.inner.get_playlist_tracks(playlist_id)
    }

    fn get_counts(&self) -> Result<CatalogCounts> {
        self.inner.get_counts()
    }

    fn top_cost_per_minute(&self, limit: usize) -> Result<Vec<PlaylistCostPerMinute>> {
        self.inner.top_cost_per_minute(limit)
    }

    fn find_genre_ignore_case(&self, name: &str) -> Result<Option<Genre>> {
        self.inner.find_genre_ignore_case(name)
    }

    fn count_playlists_only_in_genre(&self, genre_id: i64) -> Result<u64> {
        self.inner.count_playlists_only_in_genre(genre_id)
    }
}
