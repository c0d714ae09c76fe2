//! CatalogStore trait definition.
//!
//! This is the boundary between the importer/reports and the relational
//! store. The importer only ever inserts; reads serve cache warm-up, lookups
//! and the analytical reports.

use super::models::*;
use anyhow::Result;

/// Trait for catalog storage backends.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Transactions
    // =========================================================================

    /// Open a write transaction. Fails if one is already open.
    fn begin(&self) -> Result<()>;

    /// Commit the open transaction, making its writes durable.
    fn commit(&self) -> Result<()>;

    /// Discard the open transaction.
    fn rollback(&self) -> Result<()>;

    /// Whether a transaction is currently open.
    fn in_transaction(&self) -> bool;

    // =========================================================================
    // Create
    // =========================================================================

    fn insert_artist(&self, name: &str) -> Result<Artist>;

    fn insert_album(&self, title: &str, artist_id: i64) -> Result<Album>;

    fn insert_genre(&self, name: &str) -> Result<Genre>;

    fn insert_media_type(&self, name: &str) -> Result<MediaType>;

    fn insert_playlist(&self, name: &str) -> Result<Playlist>;

    fn insert_track(&self, track: &NewTrack) -> Result<Track>;

    fn insert_playlist_track(&self, playlist_id: i64, track_id: i64) -> Result<PlaylistTrack>;

    // =========================================================================
    // Update / Delete
    // =========================================================================

    fn rename_artist(&self, id: i64, name: &str) -> Result<()>;

    fn rename_playlist(&self, id: i64, name: &str) -> Result<()>;

    /// Delete a playlist together with its association rows.
    fn delete_playlist(&self, id: i64) -> Result<()>;

    fn delete_playlist_track(&self, id: i64) -> Result<()>;

    // =========================================================================
    // Bulk reads (cache warm-up)
    // =========================================================================

    fn list_artists(&self) -> Result<Vec<Artist>>;

    fn list_albums(&self) -> Result<Vec<Album>>;

    fn list_genres(&self) -> Result<Vec<Genre>>;

    fn list_media_types(&self) -> Result<Vec<MediaType>>;

    fn list_playlists(&self) -> Result<Vec<Playlist>>;

    /// All tracks, each paired with the title of its album.
    fn list_tracks_with_album_title(&self) -> Result<Vec<TrackWithAlbumTitle>>;

    /// Natural keys of every existing playlist/track association.
    fn list_playlist_track_names(&self) -> Result<Vec<PlaylistTrackNames>>;

    // =========================================================================
    // Lookups
    // =========================================================================

    fn get_album(&self, id: i64) -> Result<Option<Album>>;

    fn get_track(&self, id: i64) -> Result<Option<Track>>;

    fn find_artist_by_name(&self, name: &str) -> Result<Option<Artist>>;

    fn find_playlist_by_name(&self, name: &str) -> Result<Option<Playlist>>;

    fn find_track_by_name_and_album(&self, name: &str, album_id: i64) -> Result<Option<Track>>;

    /// Tracks associated with a playlist, in association order.
    fn get_playlist_tracks(&self, playlist_id: i64) -> Result<Vec<Track>>;

    // =========================================================================
    // Analytics
    // =========================================================================

    fn get_counts(&self) -> Result<CatalogCounts>;

    /// Playlists ranked by `sum(price) / (sum(ms) / 60000)`, highest first,
    /// ties broken by playlist name. Playlists whose total duration is zero
    /// are left out.
    fn top_cost_per_minute(&self, limit: usize) -> Result<Vec<PlaylistCostPerMinute>>;

    /// First genre (lowest id) whose name matches case-insensitively.
    fn find_genre_ignore_case(&self, name: &str) -> Result<Option<Genre>>;

    /// Number of playlists with at least one track where every track has
    /// the given genre.
    fn count_playlists_only_in_genre(&self, genre_id: i64) -> Result<u64>;
}
