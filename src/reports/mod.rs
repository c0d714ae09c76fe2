//! Read-only reports over the final catalog state.

use crate::catalog_store::{CatalogStore, PlaylistCostPerMinute};
use anyhow::Result;
use serde::Serialize;
use tracing::info;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub tracks: u64,
    pub playlists: u64,
    pub albums: u64,
}

/// Playlists whose every track belongs to one genre.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenreExclusivePlaylists {
    pub genre: String,
    pub genre_found: bool,
    pub playlists: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogReport {
    pub totals: Totals,
    pub top_cost_per_minute: Vec<PlaylistCostPerMinute>,
    pub genre_exclusive: GenreExclusivePlaylists,
}

pub fn totals(store: &dyn CatalogStore) -> Result<Totals> {
    let counts = store.get_counts()?;
    Ok(Totals {
        tracks: counts.tracks,
        playlists: counts.playlists,
        albums: counts.albums,
    })
}

pub fn top_cost_per_minute(
    store: &dyn CatalogStore,
    limit: usize,
) -> Result<Vec<PlaylistCostPerMinute>> {
    store.top_cost_per_minute(limit)
}

/// Count playlists made only of tracks in `genre_name`. Reports zero when no
/// genre by that name exists.
pub fn genre_exclusive_playlists(
    store: &dyn CatalogStore,
    genre_name: &str,
) -> Result<GenreExclusivePlaylists> {
    match store.find_genre_ignore_case(genre_name)? {
        Some(genre) => Ok(GenreExclusivePlaylists {
            genre: genre.name,
            genre_found: true,
            playlists: store.count_playlists_only_in_genre(genre.id)?,
        }),
        None => {
            info!("Genre {:?} not found", genre_name);
            Ok(GenreExclusivePlaylists {
                genre: genre_name.to_string(),
                genre_found: false,
                playlists: 0,
            })
        }
    }
}

pub fn build_report(
    store: &dyn CatalogStore,
    top_playlists: usize,
    genre_name: &str,
) -> Result<CatalogReport> {
    Ok(CatalogReport {
        totals: totals(store)?,
        top_cost_per_minute: top_cost_per_minute(store, top_playlists)?,
        genre_exclusive: genre_exclusive_playlists(store, genre_name)?,
    })
}

impl CatalogReport {
    pub fn render_text(&self) -> String {
        let mut out = String::from("Totals\n");
        out.push_str(&format!("  tracks:    {}\n", self.totals.tracks));
        out.push_str(&format!("  playlists: {}\n", self.totals.playlists));
        out.push_str(&format!("  albums:    {}\n", self.totals.albums));

        out.push_str(&format!(
            "\nTop {} playlists by cost per minute\n",
            self.top_cost_per_minute.len()
        ));
        for (rank, entry) in self.top_cost_per_minute.iter().enumerate() {
            out.push_str(&format!(
                "  {}. {} - {:.4} $/min ({:.2} over {:.2} min)\n",
                rank + 1,
                entry.playlist_name,
                entry.cost_per_minute,
                entry.total_price,
                entry.total_milliseconds as f64 / 60_000.0
            ));
        }

        let exclusive = &self.genre_exclusive;
        let suffix = if exclusive.genre_found {
            ""
        } else {
            " (genre not found)"
        };
        out.push_str(&format!(
            "\nPlaylists with only {} tracks: {}{}\n",
            exclusive.genre, exclusive.playlists, suffix
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::{NewTrack, SqliteCatalogStore, UnitPrice};

    struct Fixture {
        store: SqliteCatalogStore,
        album_id: i64,
        media_type_id: i64,
    }

    impl Fixture {
        fn new() -> Self {
            let store = SqliteCatalogStore::in_memory().unwrap();
            let artist = store.insert_artist("Artist").unwrap();
            let album = store.insert_album("Album", artist.id).unwrap();
            let media_type = store.insert_media_type("MP3").unwrap();
            Fixture {
                store,
                album_id: album.id,
                media_type_id: media_type.id,
            }
        }

        fn track(&self, name: &str, genre_id: Option<i64>, cents: i64, ms: i64) -> i64 {
            self.store
                .insert_track(&NewTrack {
                    name: name.to_string(),
                    album_id: Some(self.album_id),
                    media_type_id: self.media_type_id,
                    genre_id,
                    milliseconds: Some(ms),
                    unit_price: Some(UnitPrice::from_cents(cents)),
                    ..Default::default()
                })
                .unwrap()
                .id
        }

        fn playlist(&self, name: &str, track_ids: &[i64]) {
            let playlist = self.store.insert_playlist(name).unwrap();
            for track_id in track_ids {
                self.store
                    .insert_playlist_track(playlist.id, *track_id)
                    .unwrap();
            }
        }
    }

    #[test]
    fn test_cost_per_minute_ranking() {
        let f = Fixture::new();
        let pricey = f.track("Pricey", None, 120, 60_000);
        let cheap = f.track("Cheap", None, 60, 60_000);
        f.playlist("B", &[cheap]);
        f.playlist("A", &[pricey]);

        let ranking = top_cost_per_minute(&f.store, 5).unwrap();

        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].playlist_name, "A");
        assert!((ranking[0].cost_per_minute - 1.20).abs() < 1e-9);
        assert_eq!(ranking[1].playlist_name, "B");
        assert!((ranking[1].cost_per_minute - 0.60).abs() < 1e-9);
    }

    #[test]
    fn test_ranking_ties_break_by_name_and_respect_limit() {
        let f = Fixture::new();
        let t = f.track("Same", None, 100, 60_000);
        f.playlist("Zulu", &[t]);
        f.playlist("Alpha", &[t]);
        f.playlist("Mike", &[t]);

        let ranking = top_cost_per_minute(&f.store, 2).unwrap();
        let names: Vec<&str> = ranking.iter().map(|r| r.playlist_name.as_str()).collect();

        assert_eq!(names, vec!["Alpha", "Mike"]);
    }

    #[test]
    fn test_ranking_skips_zero_duration_and_empty_playlists() {
        let f = Fixture::new();
        let silent = f.track("Silence", None, 99, 0);
        f.playlist("Silent", &[silent]);
        f.playlist("Empty", &[]);

        assert!(top_cost_per_minute(&f.store, 5).unwrap().is_empty());
    }

    #[test]
    fn test_genre_exclusive_count() {
        let f = Fixture::new();
        let jazz = f.store.insert_genre("Jazz").unwrap();
        let rock = f.store.insert_genre("Rock").unwrap();
        let j1 = f.track("J1", Some(jazz.id), 99, 1000);
        let j2 = f.track("J2", Some(jazz.id), 99, 1000);
        let r1 = f.track("R1", Some(rock.id), 99, 1000);
        let unknown = f.track("U", None, 99, 1000);
        f.playlist("All Jazz", &[j1, j2]);
        f.playlist("Mixed", &[j1, r1]);
        f.playlist("Jazz And Unknown", &[j2, unknown]);
        f.playlist("Nothing", &[]);

        let report = genre_exclusive_playlists(&f.store, "JAZZ").unwrap();

        assert!(report.genre_found);
        assert_eq!(report.genre, "Jazz");
        assert_eq!(report.playlists, 1);
    }

    #[test]
    fn test_missing_genre_reports_zero() {
        let f = Fixture::new();

        let report = genre_exclusive_playlists(&f.store, "jazz").unwrap();

        assert!(!report.genre_found);
        assert_eq!(report.playlists, 0);
        let text = build_report(&f.store, 5, "jazz").unwrap().render_text();
        assert!(text.contains("0 (genre not found)"));
    }

    #[test]
    fn test_render_text_lists_ranking_and_genre_count() {
        let f = Fixture::new();
        let jazz = f.store.insert_genre("Jazz").unwrap();
        let pricey = f.track("Pricey", Some(jazz.id), 120, 60_000);
        let cheap = f.track("Cheap", None, 60, 60_000);
        f.playlist("B", &[cheap]);
        f.playlist("A", &[pricey]);

        let text = build_report(&f.store, 5, "jazz").unwrap().render_text();

        assert!(text.starts_with("Totals\n  tracks:    2\n"));
        assert!(text.contains("Top 2 playlists by cost per minute"));
        assert!(text.contains("  1. A - 1.2000 $/min (1.20 over 1.00 min)\n"));
        assert!(text.contains("  2. B - 0.6000 $/min (0.60 over 1.00 min)\n"));
        assert!(text.ends_with("Playlists with only Jazz tracks: 1\n"));
    }

    #[test]
    fn test_totals() {
        let f = Fixture::new();
        let t = f.track("T", None, 1, 1);
        f.playlist("P", &[t]);

        assert_eq!(
            totals(&f.store).unwrap(),
            Totals {
                tracks: 1,
                playlists: 1,
                albums: 1,
            }
        );
    }
}
