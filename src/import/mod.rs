//! CSV playlist ingestion.

mod cache;
mod error;
mod line;
mod pipeline;
mod progress;

pub use cache::{AssociationKey, CatalogCaches, IdentityCache, TrackKey};
pub use error::ImportError;
pub use line::{CsvLine, SkipReason, FIELD_COUNT};
pub use pipeline::{load, ImportSettings, DEFAULT_BATCH_SIZE, DEFAULT_PROGRESS_INTERVAL};
pub use progress::{ImportSummary, ProgressReporter};
