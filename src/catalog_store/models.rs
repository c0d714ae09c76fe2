//! Catalog records as stored in SQLite.
//!
//! Records reference each other by integer id only; relationship traversal
//! happens through explicit queries on the store.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// Fixed-point price
// =============================================================================

/// A price with two fractional digits, held as whole cents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitPrice(i64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseUnitPriceError {
    #[error("empty price")]
    Empty,
    #[error("invalid character in price: {0:?}")]
    InvalidDigit(String),
    #[error("price out of range: {0}")]
    Overflow(String),
}

impl UnitPrice {
    pub fn from_cents(cents: i64) -> Self {
        UnitPrice(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl FromStr for UnitPrice {
    type Err = ParseUnitPriceError;

    /// Parses `[+-]digits[.digits]`. Digits past the second fractional place
    /// are rounded half-up, matching a DECIMAL(10, 2) column.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        if whole.is_empty() && fraction.is_empty() {
            return Err(ParseUnitPriceError::Empty);
        }
        if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(ParseUnitPriceError::InvalidDigit(s.to_string()));
        }

        let overflow = || ParseUnitPriceError::Overflow(s.to_string());
        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };

        let mut fraction_digits = fraction.bytes().map(|b| i64::from(b - b'0'));
        let tenths = fraction_digits.next().unwrap_or(0);
        let hundredths = fraction_digits.next().unwrap_or(0);
        let round_up = fraction_digits.next().is_some_and(|d| d >= 5);

        let cents = whole_value
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(overflow)?;

        Ok(UnitPrice(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Core Entities
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub artist_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaType {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: i64,
    pub name: String,
}

/// Track fields supplied by the caller; the store assigns the id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewTrack {
    pub name: String,
    pub album_id: Option<i64>,
    pub media_type_id: i64,
    pub genre_id: Option<i64>,
    pub composer: Option<String>,
    pub milliseconds: Option<i64>,
    pub bytes: Option<i64>,
    pub unit_price: Option<UnitPrice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: i64,
    pub name: String,
    pub album_id: Option<i64>,
    pub media_type_id: i64,
    pub genre_id: Option<i64>,
    pub composer: Option<String>,
    pub milliseconds: Option<i64>,
    pub bytes: Option<i64>,
    pub unit_price: Option<UnitPrice>,
}

impl Track {
    pub fn from_new(id: i64, new_track: &NewTrack) -> Self {
        Track {
            id,
            name: new_track.name.clone(),
            album_id: new_track.album_id,
            media_type_id: new_track.media_type_id,
            genre_id: new_track.genre_id,
            composer: new_track.composer.clone(),
            milliseconds: new_track.milliseconds,
            bytes: new_track.bytes,
            unit_price: new_track.unit_price,
        }
    }
}

/// Join row between a playlist and a track.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistTrack {
    pub id: i64,
    pub playlist_id: i64,
    pub track_id: i64,
}

// =============================================================================
// Natural-key projections
// =============================================================================

/// A track together with the title of its owning album (if any).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackWithAlbumTitle {
    pub track: Track,
    pub album_title: Option<String>,
}

/// The names identifying an existing playlist/track association.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaylistTrackNames {
    pub playlist_name: String,
    pub track_name: String,
    pub album_title: Option<String>,
}

// =============================================================================
// Aggregates
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub artists: u64,
    pub albums: u64,
    pub genres: u64,
    pub media_types: u64,
    pub tracks: u64,
    pub playlists: u64,
    pub playlist_tracks: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlaylistCostPerMinute {
    pub playlist_id: i64,
    pub playlist_name: String,
    pub total_price: f64,
    pub total_milliseconds: i64,
    pub cost_per_minute: f64,
}
