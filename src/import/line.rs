//! Validation of a single CSV data line.

use crate::catalog_store::UnitPrice;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

pub const FIELD_COUNT: usize = 10;

const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "playlist_name",
    "track_name",
    "composer",
    "milliseconds",
    "bytes",
    "unit_price",
    "album_title",
    "artist_name",
    "genre_name",
    "media_type_name",
];

/// Why a line was skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkipReason {
    #[error("blank line")]
    Blank,
    #[error("expected 10 fields, found {0}")]
    TooFewFields(usize),
    #[error("empty field {0}")]
    EmptyField(&'static str),
}

/// The ten trimmed, non-empty fields of a valid data line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvLine<'a> {
    pub line_number: u64,
    pub playlist_name: &'a str,
    pub track_name: &'a str,
    pub composer: &'a str,
    pub raw_milliseconds: &'a str,
    pub raw_bytes: &'a str,
    pub raw_unit_price: &'a str,
    pub album_title: &'a str,
    pub artist_name: &'a str,
    pub genre_name: &'a str,
    pub media_type_name: &'a str,
}

impl<'a> CsvLine<'a> {
    /// Split `raw` on commas and validate it. Fields beyond the tenth are
    /// ignored.
    pub fn parse(line_number: u64, raw: &'a str) -> Result<Self, SkipReason> {
        if raw.trim().is_empty() {
            return Err(SkipReason::Blank);
        }

        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
        if fields.len() < FIELD_COUNT {
            return Err(SkipReason::TooFewFields(fields.len()));
        }
        if let Some(index) = fields[..FIELD_COUNT].iter().position(|f| f.is_empty()) {
            return Err(SkipReason::EmptyField(FIELD_NAMES[index]));
        }

        Ok(CsvLine {
            line_number,
            playlist_name: fields[0],
            track_name: fields[1],
            composer: fields[2],
            raw_milliseconds: fields[3],
            raw_bytes: fields[4],
            raw_unit_price: fields[5],
            album_title: fields[6],
            artist_name: fields[7],
            genre_name: fields[8],
            media_type_name: fields[9],
        })
    }

    /// Duration in milliseconds, `None` if the field is not an integer.
    pub fn milliseconds(&self) -> Option<i64> {
        self.parse_lenient("milliseconds", self.raw_milliseconds)
    }

    /// Size in bytes, `None` if the field is not an integer.
    pub fn bytes(&self) -> Option<i64> {
        self.parse_lenient("bytes", self.raw_bytes)
    }

    /// Unit price, `None` if the field is not a decimal number.
    pub fn unit_price(&self) -> Option<UnitPrice> {
        self.parse_lenient("unit_price", self.raw_unit_price)
    }

    fn parse_lenient<T>(&self, field: &str, value: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!(
                    "Line {}: leaving {} unset, cannot parse {:?}: {}",
                    self.line_number, field, value, e
                );
                None
            }
        }
    }
}
