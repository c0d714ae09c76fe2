//! In-memory natural-key identity caches.
//!
//! Every cache is filled from the store once, before the first line is read,
//! and afterwards only grows through `get_or_try_insert_with`, which pairs
//! each new entry with exactly one store write.

use crate::catalog_store::{
    Album, Artist, CatalogStore, Genre, MediaType, Playlist, PlaylistTrackNames, Track,
};
use anyhow::Result;
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use tracing::info;

/// Natural key of a track: its name plus the title of its album.
/// Tracks without an album use an empty title.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrackKey {
    pub name: String,
    pub album_title: String,
}

impl TrackKey {
    pub fn new(name: &str, album_title: &str) -> Self {
        TrackKey {
            name: name.to_string(),
            album_title: album_title.to_string(),
        }
    }
}

/// Natural key of a playlist/track association.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssociationKey {
    pub playlist_name: String,
    pub track_name: String,
    pub album_title: String,
}

impl AssociationKey {
    pub fn new(playlist_name: &str, track_name: &str, album_title: &str) -> Self {
        AssociationKey {
            playlist_name: playlist_name.to_string(),
            track_name: track_name.to_string(),
            album_title: album_title.to_string(),
        }
    }
}

impl From<PlaylistTrackNames> for AssociationKey {
    fn from(names: PlaylistTrackNames) -> Self {
        AssociationKey {
            playlist_name: names.playlist_name,
            track_name: names.track_name,
            album_title: names.album_title.unwrap_or_default(),
        }
    }
}

/// Unbounded natural-key -> entity map for one entity kind.
#[derive(Debug)]
pub struct IdentityCache<K, V> {
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash, V: Clone> IdentityCache<K, V> {
    pub fn new() -> Self {
        IdentityCache {
            entries: HashMap::new(),
        }
    }

    /// Build a cache from existing rows. When two rows share a key the
    /// first one seen is kept.
    pub fn warm(rows: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut entries = HashMap::new();
        for (key, value) in rows {
            entries.entry(key).or_insert(value);
        }
        IdentityCache { entries }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    /// Return the cached entity for `key`, or call `create` to persist a new
    /// one and cache it. The flag is `true` when `create` ran.
    ///
    /// Nothing is cached if `create` fails.
    pub fn get_or_try_insert_with<F>(&mut self, key: K, create: F) -> Result<(V, bool)>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(existing) = self.entries.get(&key) {
            return Ok((existing.clone(), false));
        }
        let created = create()?;
        self.entries.insert(key, created.clone());
        Ok((created, true))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, V: Clone> Default for IdentityCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// All identity caches used by one import run.
#[derive(Debug, Default)]
pub struct CatalogCaches {
    pub playlists: IdentityCache<String, Playlist>,
    pub artists: IdentityCache<String, Artist>,
    pub albums: IdentityCache<String, Album>,
    pub genres: IdentityCache<String, Genre>,
    pub media_types: IdentityCache<String, MediaType>,
    pub tracks: IdentityCache<TrackKey, Track>,
    pub associations: HashSet<AssociationKey>,
}

impl CatalogCaches {
    /// Load every existing entity and association from the store.
    pub fn warm(store: &dyn CatalogStore) -> Result<Self> {
        let playlists =
            IdentityCache::warm(store.list_playlists()?.into_iter().map(|p| (p.name.clone(), p)));
        let artists =
            IdentityCache::warm(store.list_artists()?.into_iter().map(|a| (a.name.clone(), a)));
        let albums =
            IdentityCache::warm(store.list_albums()?.into_iter().map(|a| (a.title.clone(), a)));
        let genres =
            IdentityCache::warm(store.list_genres()?.into_iter().map(|g| (g.name.clone(), g)));
        let media_types = IdentityCache::warm(
            store
                .list_media_types()?
                .into_iter()
                .map(|m| (m.name.clone(), m)),
        );
        let tracks = IdentityCache::warm(store.list_tracks_with_album_title()?.into_iter().map(
            |t| {
                let key = TrackKey {
                    name: t.track.name.clone(),
                    album_title: t.album_title.unwrap_or_default(),
                };
                (key, t.track)
            },
        ));
        let associations: HashSet<AssociationKey> = store
            .list_playlist_track_names()?
            .into_iter()
            .map(AssociationKey::from)
            .collect();

        info!(
            "Warmed caches: {} playlists, {} artists, {} albums, {} genres, {} media types, {} tracks, {} associations",
            playlists.len(),
            artists.len(),
            albums.len(),
            genres.len(),
            media_types.len(),
            tracks.len(),
            associations.len()
        );

        Ok(CatalogCaches {
            playlists,
            artists,
            albums,
            genres,
            media_types,
            tracks,
            associations,
        })
    }
}
