use std::path::PathBuf;
use thiserror::Error;

/// Fatal import failures. Problems with a single line or field never end
/// up here; they are counted and the import moves on.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("I/O error while reading CSV: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),

    #[error("Batch commit failed after {committed_lines} committed lines: {reason:#}")]
    Commit {
        committed_lines: u64,
        reason: anyhow::Error,
    },
}
