use anyhow::{Context, Result};
use catalog_loader::catalog_store::{seed_if_empty, SqliteCatalogStore};
use catalog_loader::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_REPORT_GENRE, DEFAULT_TOP_PLAYLISTS,
};
use catalog_loader::import::{self, ImportSummary, DEFAULT_BATCH_SIZE, DEFAULT_PROGRESS_INTERVAL};
use catalog_loader::reports::{self, CatalogReport};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir().context("Error resolving current directory")?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
#[command(name = "catalog-loader")]
#[command(about = "Import a playlist CSV into a SQLite music catalog and report on it")]
struct CliArgs {
    /// Path to the playlist CSV file (first line is a header).
    #[clap(long = "csv", value_parser = parse_path)]
    pub csv_path: Option<PathBuf>,

    /// Path to the SQLite catalog database file. In-memory when omitted.
    #[clap(long = "db", value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Path to a TOML config file. Its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Number of processed lines per committed transaction.
    #[clap(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Number of processed lines between progress log lines.
    #[clap(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_interval: u64,

    /// Genre used by the single-genre playlist report.
    #[clap(long, default_value = DEFAULT_REPORT_GENRE)]
    pub report_genre: String,

    /// How many playlists to list in the cost-per-minute ranking.
    #[clap(long, default_value_t = DEFAULT_TOP_PLAYLISTS)]
    pub top_playlists: usize,

    /// Insert a small demo catalog first if the database has no artists.
    #[clap(long, default_value_t = false)]
    pub seed_demo: bool,

    /// Print the import summary and reports as JSON.
    #[clap(long, default_value_t = false)]
    pub json: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            csv_path: self.csv_path.clone(),
            batch_size: self.batch_size,
            progress_interval: self.progress_interval,
            report_genre: self.report_genre.clone(),
            top_playlists: self.top_playlists,
            seed_demo: self.seed_demo,
            json: self.json,
        }
    }
}

#[derive(Serialize)]
struct RunOutput<'a> {
    import: &'a ImportSummary,
    report: &'a CatalogReport,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let store = match &config.db_path {
        Some(db_path) => {
            info!("Opening SQLite catalog database at {:?}...", db_path);
            SqliteCatalogStore::open(db_path)?
        }
        None => {
            info!("No database path configured, using an in-memory catalog");
            SqliteCatalogStore::in_memory()?
        }
    };

    if config.seed_demo {
        seed_if_empty(&store)?;
    }

    let summary = import::load(&store, &config.csv_path, &config.import)?;
    let report = reports::build_report(&store, config.top_playlists, &config.report_genre)?;

    if config.json {
        let output = RunOutput {
            import: &summary,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", summary.render_text());
        println!();
        print!("{}", report.render_text());
    }

    Ok(())
}
