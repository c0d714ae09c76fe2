//! Catalog Loader Library
//!
//! Loads a denormalized playlist CSV into a normalized SQLite music catalog
//! and runs reports over the result. Modules are exposed for the binary and
//! for end-to-end tests.

pub mod catalog_store;
pub mod config;
pub mod import;
pub mod reports;
pub mod sqlite_persistence;

pub use catalog_store::{CatalogStore, SqliteCatalogStore};
pub use import::{load, ImportError, ImportSettings, ImportSummary};
