//! CSV playlist import.
//!
//! Lines are resolved against the identity caches and written through to the
//! store inside batched transactions. A batch is committed every
//! `batch_size` processed lines; skipped lines never count towards a batch.

use super::cache::{AssociationKey, CatalogCaches, TrackKey};
use super::error::ImportError;
use super::line::CsvLine;
use super::progress::{ImportSummary, ProgressReporter};
use crate::catalog_store::{CatalogStore, NewTrack};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, error, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 500;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportSettings {
    /// Processed lines per committed transaction.
    pub batch_size: usize,
    /// Processed lines between throughput log lines.
    pub progress_interval: u64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        ImportSettings {
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Import the CSV file at `csv_path` into `store`.
///
/// The first line is a header and is discarded. On a fatal error the open
/// batch is rolled back; batches committed before it stay in the store.
pub fn load(
    store: &dyn CatalogStore,
    csv_path: &Path,
    settings: &ImportSettings,
) -> Result<ImportSummary, ImportError> {
    let file = File::open(csv_path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ImportError::SourceNotFound(csv_path.to_path_buf()),
        _ => ImportError::Io(e),
    })?;
    info!("Importing playlists from {}", csv_path.display());

    let mut lines = LossyLines::new(BufReader::new(file));
    let reporter = ProgressReporter::new(settings.progress_interval);

    match lines.next() {
        Some(header) => {
            let header = header?;
            debug!("Discarding header: {}", header);
        }
        None => {
            warn!("CSV source {} is empty, nothing to import", csv_path.display());
            let summary = ImportSummary::default();
            reporter.finish(&summary);
            return Ok(summary);
        }
    }

    let caches = CatalogCaches::warm(store)?;
    let mut importer = CsvPlaylistImporter {
        store,
        batch_size: settings.batch_size.max(1),
        caches,
        summary: ImportSummary::default(),
        reporter,
        pending_lines: 0,
    };

    match importer.run(lines) {
        Ok(()) => {
            importer.reporter.finish(&importer.summary);
            Ok(importer.summary)
        }
        Err(e) => {
            error!("Import aborted: {}", e);
            if store.in_transaction() {
                match store.rollback() {
                    Ok(()) => warn!(
                        "Rolled back open batch ({} uncommitted lines)",
                        importer.pending_lines
                    ),
                    Err(rollback_err) => error!("Rollback failed: {:#}", rollback_err),
                }
            }
            importer.reporter.finish(&importer.summary);
            Err(e)
        }
    }
}

/// Line iterator that decodes UTF-8 lossily, replacing malformed bytes with
/// U+FFFD instead of failing. Strips the `\n` or `\r\n` terminator.
struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LossyLines<R> {
    fn new(reader: R) -> Self {
        LossyLines {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.ends_with(b"\n") {
                    self.buf.pop();
                    if self.buf.ends_with(b"\r") {
                        self.buf.pop();
                    }
                }
                let line = match String::from_utf8_lossy(&self.buf) {
                    Cow::Borrowed(valid) => valid.to_string(),
                    Cow::Owned(replaced) => {
                        debug!("Replaced invalid UTF-8 in line: {}", replaced);
                        replaced
                    }
                };
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

struct CsvPlaylistImporter<'a> {
    store: &'a dyn CatalogStore,
    batch_size: usize,
    caches: CatalogCaches,
    summary: ImportSummary,
    reporter: ProgressReporter,
    pending_lines: usize,
}

impl CsvPlaylistImporter<'_> {
    fn run<I>(&mut self, lines: I) -> Result<(), ImportError>
    where
        I: Iterator<Item = std::io::Result<String>>,
    {
        self.store.begin()?;

        // Line 1 was the header.
        for (line_number, raw) in (2u64..).zip(lines) {
            let raw = raw?;
            let line = match CsvLine::parse(line_number, &raw) {
                Ok(line) => line,
                Err(reason) => {
                    debug!("Skipping line {}: {}", line_number, reason);
                    self.summary.skipped += 1;
                    continue;
                }
            };

            self.import_line(&line)?;
            self.summary.processed += 1;
            self.pending_lines += 1;
            self.reporter.on_line_processed(&self.summary);

            if self.pending_lines >= self.batch_size {
                self.commit_batch()?;
                self.store.begin()?;
            }
        }

        if self.pending_lines > 0 {
            self.commit_batch()?;
        } else {
            self.store.rollback()?;
        }
        Ok(())
    }

    fn commit_batch(&mut self) -> Result<(), ImportError> {
        self.store
            .commit()
            .map_err(|reason| ImportError::Commit {
                committed_lines: self.summary.committed_lines,
                reason,
            })?;
        self.summary.batches_committed += 1;
        self.summary.committed_lines += self.pending_lines as u64;
        self.pending_lines = 0;
        self.reporter.on_batch_committed(&self.summary);
        Ok(())
    }

    /// Resolve or create every entity referenced by `line`.
    fn import_line(&mut self, line: &CsvLine) -> anyhow::Result<()> {
        let store = self.store;
        let caches = &mut self.caches;
        let summary = &mut self.summary;

        let (playlist, created) = caches
            .playlists
            .get_or_try_insert_with(line.playlist_name.to_string(), || {
                store.insert_playlist(line.playlist_name)
            })?;
        summary.new_playlists += u64::from(created);

        let (artist, created) = caches
            .artists
            .get_or_try_insert_with(line.artist_name.to_string(), || {
                store.insert_artist(line.artist_name)
            })?;
        summary.new_artists += u64::from(created);

        // An album keeps the artist it was first created with.
        let (album, created) = caches
            .albums
            .get_or_try_insert_with(line.album_title.to_string(), || {
                store.insert_album(line.album_title, artist.id)
            })?;
        summary.new_albums += u64::from(created);

        let (genre, created) = caches
            .genres
            .get_or_try_insert_with(line.genre_name.to_string(), || {
                store.insert_genre(line.genre_name)
            })?;
        summary.new_genres += u64::from(created);

        let (media_type, created) = caches
            .media_types
            .get_or_try_insert_with(line.media_type_name.to_string(), || {
                store.insert_media_type(line.media_type_name)
            })?;
        summary.new_media_types += u64::from(created);

        let (track, created) = caches.tracks.get_or_try_insert_with(
            TrackKey::new(line.track_name, line.album_title),
            || {
                store.insert_track(&NewTrack {
                    name: line.track_name.to_string(),
                    album_id: Some(album.id),
                    media_type_id: media_type.id,
                    genre_id: Some(genre.id),
                    composer: Some(line.composer.to_string()),
                    milliseconds: line.milliseconds(),
                    bytes: line.bytes(),
                    unit_price: line.unit_price(),
                })
            },
        )?;
        summary.new_tracks += u64::from(created);

        let association = AssociationKey::new(line.playlist_name, line.track_name, line.album_title);
        if !caches.associations.contains(&association) {
            store.insert_playlist_track(playlist.id, track.id)?;
            caches.associations.insert(association);
            summary.new_playlist_tracks += 1;
        }

        Ok(())
    }
}
