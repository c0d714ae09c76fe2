//! Shared constants for end-to-end tests
//!
//! When the CSV layout or the demo rows change, update only this file.

/// Header line of every generated CSV file.
pub const CSV_HEADER: &str = "playlist_name,track_name,composer,milliseconds,bytes,unit_price,album_title,artist_name,genre_name,media_type_name";

// ============================================================================
// Catalog names
// ============================================================================

pub const PLAYLIST_ROCK: &str = "Rock Classics";
pub const PLAYLIST_JAZZ: &str = "Late Night Jazz";
pub const PLAYLIST_MIXED: &str = "Mixed Bag";

pub const ARTIST_ACDC: &str = "AC/DC";
pub const ARTIST_MILES: &str = "Miles Davis";

pub const ALBUM_BACK_IN_BLACK: &str = "Back in Black";
pub const ALBUM_KIND_OF_BLUE: &str = "Kind of Blue";

pub const GENRE_ROCK: &str = "Rock";
pub const GENRE_JAZZ: &str = "Jazz";

pub const MEDIA_MP3: &str = "MP3";
