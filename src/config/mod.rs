mod file_config;

pub use file_config::{FileConfig, ImportFileConfig, ReportsFileConfig};

use crate::import::{ImportSettings, DEFAULT_BATCH_SIZE, DEFAULT_PROGRESS_INTERVAL};
use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_REPORT_GENRE: &str = "jazz";
pub const DEFAULT_TOP_PLAYLISTS: usize = 5;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub csv_path: Option<PathBuf>,
    pub batch_size: usize,
    pub progress_interval: u64,
    pub report_genre: String,
    pub top_playlists: usize,
    pub seed_demo: bool,
    pub json: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            db_path: None,
            csv_path: None,
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            report_genre: DEFAULT_REPORT_GENRE.to_string(),
            top_playlists: DEFAULT_TOP_PLAYLISTS,
            seed_demo: false,
            json: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` means an in-memory database.
    pub db_path: Option<PathBuf>,
    pub csv_path: PathBuf,
    pub import: ImportSettings,
    pub report_genre: String,
    pub top_playlists: usize,
    pub seed_demo: bool,
    pub json: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone());

        let csv_path = file
            .csv_path
            .map(PathBuf::from)
            .or_else(|| cli.csv_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("csv_path must be specified via --csv or in config file")
            })?;

        let import_file = file.import.unwrap_or_default();
        let batch_size = import_file.batch_size.unwrap_or(cli.batch_size);
        if batch_size == 0 {
            bail!("batch_size must be greater than 0");
        }
        let progress_interval = import_file
            .progress_interval
            .unwrap_or(cli.progress_interval);
        if progress_interval == 0 {
            bail!("progress_interval must be greater than 0");
        }

        let reports_file = file.reports.unwrap_or_default();
        let report_genre = reports_file
            .genre
            .unwrap_or_else(|| cli.report_genre.clone());
        if report_genre.trim().is_empty() {
            bail!("Report genre must not be empty");
        }
        let top_playlists = reports_file.top_playlists.unwrap_or(cli.top_playlists);

        let seed_demo = file.seed_demo.unwrap_or(cli.seed_demo);

        Ok(Self {
            db_path,
            csv_path,
            import: ImportSettings {
                batch_size,
                progress_interval,
            },
            report_genre,
            top_playlists,
            seed_demo,
            json: cli.json,
        })
    }
}
