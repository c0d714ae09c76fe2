use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub db_path: Option<String>,
    pub csv_path: Option<String>,
    pub seed_demo: Option<bool>,

    pub import: Option<ImportFileConfig>,
    pub reports: Option<ReportsFileConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ImportFileConfig {
    pub batch_size: Option<usize>,
    pub progress_interval: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ReportsFileConfig {
    pub genre: Option<String>,
    pub top_playlists: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let config: FileConfig = toml::from_str(
            r#"
            db_path = "/data/catalog.db"
            csv_path = "/data/playlists.csv"
            seed_demo = true

            [import]
            batch_size = 250
            progress_interval = 100

            [reports]
            genre = "Rock"
            top_playlists = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path.as_deref(), Some("/data/catalog.db"));
        assert_eq!(config.csv_path.as_deref(), Some("/data/playlists.csv"));
        assert_eq!(config.seed_demo, Some(true));
        let import = config.import.unwrap();
        assert_eq!(import.batch_size, Some(250));
        assert_eq!(import.progress_interval, Some(100));
        let reports = config.reports.unwrap();
        assert_eq!(reports.genre.as_deref(), Some("Rock"));
        assert_eq!(reports.top_playlists, Some(10));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.db_path.is_none());
        assert!(config.import.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "csv_path = \"in.csv\"").unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.csv_path.as_deref(), Some("in.csv"));
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "batch_size = = 3").unwrap();

        assert!(FileConfig::load(file.path()).is_err());
    }
}
