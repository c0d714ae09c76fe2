//! SQLite schema definitions for the music catalog database.
//!
//! Primary keys are integer rowid aliases, so identities are assigned by the
//! store on insert. Names and titles are indexed for lookups but carry no
//! UNIQUE constraint: deduplication by natural key is the importer's job.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

// =============================================================================
// Foreign keys
// =============================================================================

const ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "artist_id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const ALBUM_FK: ForeignKey = ForeignKey {
    foreign_table: "albums",
    foreign_column: "album_id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const GENRE_FK: ForeignKey = ForeignKey {
    foreign_table: "genres",
    foreign_column: "genre_id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const MEDIA_TYPE_FK: ForeignKey = ForeignKey {
    foreign_table: "media_types",
    foreign_column: "media_type_id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const PLAYLIST_FK: ForeignKey = ForeignKey {
    foreign_table: "playlists",
    foreign_column: "playlist_id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const TRACK_FK: ForeignKey = ForeignKey {
    foreign_table: "tracks",
    foreign_column: "track_id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const EMPLOYEE_FK: ForeignKey = ForeignKey {
    foreign_table: "employees",
    foreign_column: "employee_id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const CUSTOMER_FK: ForeignKey = ForeignKey {
    foreign_table: "customers",
    foreign_column: "customer_id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const INVOICE_FK: ForeignKey = ForeignKey {
    foreign_table: "invoices",
    foreign_column: "invoice_id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const INVOICE_TRACK_FK: ForeignKey = ForeignKey {
    foreign_table: "tracks",
    foreign_column: "track_id",
    on_delete: ForeignKeyOnChange::Restrict,
};

// =============================================================================
// Catalog Tables
// =============================================================================

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("artist_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_artists_name", "name")],
};

const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("album_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTIST_FK)
        ),
    ],
    indices: &[
        ("idx_albums_title", "title"),
        ("idx_albums_artist", "artist_id"),
    ],
};

const GENRES_TABLE: Table = Table {
    name: "genres",
    columns: &[
        sqlite_column!("genre_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_genres_name", "name")],
};

const MEDIA_TYPES_TABLE: Table = Table {
    name: "media_types",
    columns: &[
        sqlite_column!("media_type_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_media_types_name", "name")],
};

const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("track_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("album_id", &SqlType::Integer, foreign_key = Some(&ALBUM_FK)),
        sqlite_column!(
            "media_type_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MEDIA_TYPE_FK)
        ),
        sqlite_column!("genre_id", &SqlType::Integer, foreign_key = Some(&GENRE_FK)),
        sqlite_column!("composer", &SqlType::Text),
        sqlite_column!("milliseconds", &SqlType::Integer),
        sqlite_column!("bytes", &SqlType::Integer),
        sqlite_column!("unit_price_cents", &SqlType::Integer),
    ],
    indices: &[
        ("idx_tracks_name", "name"),
        ("idx_tracks_album", "album_id"),
        ("idx_tracks_genre", "genre_id"),
    ],
};

const PLAYLISTS_TABLE: Table = Table {
    name: "playlists",
    columns: &[
        sqlite_column!("playlist_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_playlists_name", "name")],
};

/// Playlist <-> Track association, with its own identity.
const PLAYLIST_TRACKS_TABLE: Table = Table {
    name: "playlist_tracks",
    columns: &[
        sqlite_column!("playlist_track_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "playlist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PLAYLIST_FK)
        ),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACK_FK)
        ),
    ],
    indices: &[
        ("idx_playlist_tracks_playlist", "playlist_id"),
        ("idx_playlist_tracks_track", "track_id"),
    ],
};

// =============================================================================
// Sales Tables (not populated by the CSV import)
// =============================================================================

const EMPLOYEES_TABLE: Table = Table {
    name: "employees",
    columns: &[
        sqlite_column!("employee_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("last_name", &SqlType::Text, non_null = true),
        sqlite_column!("first_name", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text),
        sqlite_column!("reports_to", &SqlType::Integer, foreign_key = Some(&EMPLOYEE_FK)),
        sqlite_column!("hire_date", &SqlType::Text),
        sqlite_column!("email", &SqlType::Text),
    ],
    indices: &[],
};

const CUSTOMERS_TABLE: Table = Table {
    name: "customers",
    columns: &[
        sqlite_column!("customer_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("first_name", &SqlType::Text),
        sqlite_column!("last_name", &SqlType::Text),
        sqlite_column!("company", &SqlType::Text),
        sqlite_column!("address", &SqlType::Text),
        sqlite_column!("city", &SqlType::Text),
        sqlite_column!("state", &SqlType::Text),
        sqlite_column!("country", &SqlType::Text),
        sqlite_column!("postal_code", &SqlType::Text),
        sqlite_column!("phone", &SqlType::Text),
        sqlite_column!("fax", &SqlType::Text),
        sqlite_column!("email", &SqlType::Text),
        sqlite_column!(
            "support_rep_id",
            &SqlType::Integer,
            foreign_key = Some(&EMPLOYEE_FK)
        ),
    ],
    indices: &[("idx_customers_support_rep", "support_rep_id")],
};

const INVOICES_TABLE: Table = Table {
    name: "invoices",
    columns: &[
        sqlite_column!("invoice_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "customer_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&CUSTOMER_FK)
        ),
        sqlite_column!("invoice_date", &SqlType::Text),
        sqlite_column!("billing_address", &SqlType::Text),
        sqlite_column!("billing_city", &SqlType::Text),
        sqlite_column!("billing_state", &SqlType::Text),
        sqlite_column!("billing_country", &SqlType::Text),
        sqlite_column!("billing_postal_code", &SqlType::Text),
        sqlite_column!("total_cents", &SqlType::Integer),
    ],
    indices: &[("idx_invoices_customer", "customer_id")],
};

const INVOICE_ITEMS_TABLE: Table = Table {
    name: "invoice_items",
    columns: &[
        sqlite_column!("invoice_line_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "invoice_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&INVOICE_FK)
        ),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&INVOICE_TRACK_FK)
        ),
        sqlite_column!("unit_price_cents", &SqlType::Integer),
        sqlite_column!("quantity", &SqlType::Integer),
    ],
    indices: &[
        ("idx_invoice_items_invoice", "invoice_id"),
        ("idx_invoice_items_track", "track_id"),
    ],
};

// =============================================================================
// Versioned Schema Definition
// =============================================================================

/// Catalog schema versions, oldest first. Tables are listed parents first so
/// foreign keys always point at an existing table.
pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        ALBUMS_TABLE,
        GENRES_TABLE,
        MEDIA_TYPES_TABLE,
        TRACKS_TABLE,
        PLAYLISTS_TABLE,
        PLAYLIST_TRACKS_TABLE,
        EMPLOYEES_TABLE,
        CUSTOMERS_TABLE,
        INVOICES_TABLE,
        INVOICE_ITEMS_TABLE,
    ],
}];
