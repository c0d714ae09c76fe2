//! Import counters and periodic progress logging.

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::info;

/// Counters accumulated over one import run.
///
/// `committed_lines` is the number of processed lines whose writes are
/// durable; it lags `processed` while a batch is open.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub processed: u64,
    pub skipped: u64,
    pub new_playlists: u64,
    pub new_tracks: u64,
    pub new_albums: u64,
    pub new_artists: u64,
    pub new_genres: u64,
    pub new_media_types: u64,
    pub new_playlist_tracks: u64,
    pub batches_committed: u64,
    pub committed_lines: u64,
}

impl ImportSummary {
    /// Every counter, one per line, for terminal output.
    pub fn render_text(&self) -> String {
        let rows = [
            ("processed", self.processed),
            ("skipped", self.skipped),
            ("new playlists", self.new_playlists),
            ("new tracks", self.new_tracks),
            ("new albums", self.new_albums),
            ("new artists", self.new_artists),
            ("new genres", self.new_genres),
            ("new media types", self.new_media_types),
            ("new playlist tracks", self.new_playlist_tracks),
            ("batches committed", self.batches_committed),
            ("committed lines", self.committed_lines),
        ];
        let mut out = String::from("Import summary\n");
        for (label, value) in rows {
            out.push_str(&format!("  {:<20} {}\n", format!("{}:", label), value));
        }
        out
    }
}

/// Logs throughput snapshots, batch notices and the final summary.
pub struct ProgressReporter {
    started_at: Instant,
    interval: u64,
}

impl ProgressReporter {
    pub fn new(interval: u64) -> Self {
        ProgressReporter {
            started_at: Instant::now(),
            interval: interval.max(1),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    fn lines_per_second(&self, lines: u64) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            lines as f64 / secs
        } else {
            0.0
        }
    }

    /// Whether a throughput snapshot is due after `processed` lines.
    pub fn is_due(&self, processed: u64) -> bool {
        processed > 0 && processed % self.interval == 0
    }

    /// Call after each processed line. Logs a snapshot every `interval`
    /// lines and returns whether it did.
    pub fn on_line_processed(&self, summary: &ImportSummary) -> bool {
        if !self.is_due(summary.processed) {
            return false;
        }
        info!(
            "Processed {} lines ({} skipped), {:.0} lines/sec",
            summary.processed,
            summary.skipped,
            self.lines_per_second(summary.processed)
        );
        true
    }

    pub fn on_batch_committed(&self, summary: &ImportSummary) {
        info!(
            "Committed batch #{} ({} lines durable)",
            summary.batches_committed, summary.committed_lines
        );
    }

    pub fn finish(&self, summary: &ImportSummary) {
        info!(
            "Import finished in {:.2}s: {} processed, {} skipped, {} batches committed",
            self.elapsed().as_secs_f64(),
            summary.processed,
            summary.skipped,
            summary.batches_committed
        );
        info!(
            "New: {} playlists, {} tracks, {} albums, {} artists, {} genres, {} media types, {} playlist tracks",
            summary.new_playlists,
            summary.new_tracks,
            summary.new_albums,
            summary.new_artists,
            summary.new_genres,
            summary.new_media_types,
            summary.new_playlist_tracks
        );
    }
}
