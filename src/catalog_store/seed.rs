//! Demo catalog used to try the reports without a CSV file.

use super::models::{NewTrack, UnitPrice};
use super::trait_def::CatalogStore;
use anyhow::Result;
use tracing::{info, warn};

/// Insert a tiny demo catalog when the store has no artists yet.
///
/// Returns `true` if the demo rows were written.
pub fn seed_if_empty(store: &dyn CatalogStore) -> Result<bool> {
    if store.get_counts()?.artists > 0 {
        info!("Catalog already has artists, skipping demo seed");
        return Ok(false);
    }

    store.begin()?;
    match insert_demo_rows(store) {
        Ok(()) => {
            store.commit()?;
            info!("Seeded demo catalog");
            Ok(true)
        }
        Err(e) => {
            warn!("Demo seed failed, rolling back: {:#}", e);
            store.rollback()?;
            Err(e)
        }
    }
}

fn insert_demo_rows(store: &dyn CatalogStore) -> Result<()> {
    let acdc = store.insert_artist("AC/DC")?;
    let miles = store.insert_artist("Miles Davis")?;
    store.insert_artist("The Beatles")?;

    let back_in_black = store.insert_album("Back in Black", acdc.id)?;
    let kind_of_blue = store.insert_album("Kind of Blue", miles.id)?;

    let rock = store.insert_genre("Rock")?;
    let jazz = store.insert_genre("Jazz")?;
    let mp3 = store.insert_media_type("MP3")?;

    let hells_bells = store.insert_track(&NewTrack {
        name: "Hells Bells".to_string(),
        album_id: Some(back_in_black.id),
        media_type_id: mp3.id,
        genre_id: Some(rock.id),
        milliseconds: Some(312_000),
        unit_price: Some(UnitPrice::from_cents(99)),
        ..Default::default()
    })?;
    let so_what = store.insert_track(&NewTrack {
        name: "So What".to_string(),
        album_id: Some(kind_of_blue.id),
        media_type_id: mp3.id,
        genre_id: Some(jazz.id),
        milliseconds: Some(545_000),
        unit_price: Some(UnitPrice::from_cents(129)),
        ..Default::default()
    })?;

    let favoritos = store.insert_playlist("Favoritos")?;
    store.insert_playlist_track(favoritos.id, hells_bells.id)?;
    store.insert_playlist_track(favoritos.id, so_what.id)?;
    Ok(())
}
