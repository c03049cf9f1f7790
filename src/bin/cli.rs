//! xword-ingest CLI
//!
//! Script-invoked entry point for single-date and range ingestion.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use xword_ingest::{
    config::{load_runtime_config, process_env},
    error::Result,
    models::Config,
    pipeline::{IngestOptions, Ingestor, RangeRunner},
    storage::{ClueStore, LocalStore, RestStore},
    utils::{date, log as report},
};

/// xword-ingest - Daily Crossword Clue Ingestion
#[derive(Parser, Debug)]
#[command(
    name = "xword-ingest",
    version,
    about = "Fetch crossword puzzles and load their clues through staging"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/ingest.toml", global = true)]
    config: PathBuf,

    /// Use a filesystem store rooted at this directory instead of the REST store
    #[arg(long, global = true)]
    local_store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest a single puzzle date
    Date {
        /// Puzzle date (YYYY-MM-DD), defaults to today in UTC
        date: Option<String>,

        /// Fetch and build only; leave staging and the permanent store untouched
        #[arg(long)]
        dry_run: bool,

        /// Leave staged rows in place after promotion
        #[arg(long)]
        keep_staging: bool,

        /// Enable debug logging and dump every built row
        #[arg(long)]
        debug: bool,
    },

    /// Ingest every date in an inclusive range
    Range {
        /// First date (YYYY-MM-DD)
        start: String,

        /// Last date (YYYY-MM-DD)
        end: String,

        /// Delay between dates in milliseconds (default from config)
        #[arg(long)]
        delay: Option<u64>,
    },

    /// Validate configuration and environment
    Validate,
}

/// Initialize logging; `RUST_LOG` still wins over the default filter.
fn init_logging(level: &str, debug: bool) {
    let level = if debug { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
    report::init(level);
}

/// Select the backend: local directory when requested, REST store otherwise.
fn open_store(config: &Config, local: Option<&PathBuf>) -> Result<Arc<dyn ClueStore>> {
    match local {
        Some(dir) => {
            log::info!("Using local store at {}", dir.display());
            Ok(Arc::new(LocalStore::new(dir)))
        }
        None => Ok(Arc::new(RestStore::from_config(&config.store)?)),
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let debug = matches!(cli.command, Command::Date { debug: true, .. });

    let config = Config::load_or_default(&cli.config);
    init_logging(&config.logging.level, debug);

    let config = load_runtime_config(&cli.config, process_env, cli.local_store.is_none())?;
    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Date {
            date: raw,
            dry_run,
            keep_staging,
            debug,
        } => {
            let date = match raw {
                Some(raw) => date::parse_iso_date(&raw)?,
                None => date::today_utc(),
            };

            let store = open_store(&config, cli.local_store.as_ref())?;
            let ingestor = Ingestor::from_config(&config, store)?;
            let options = IngestOptions {
                dry_run,
                keep_staging: keep_staging || config.ingest.keep_staging,
                debug,
            };

            let report = ingestor.ingest_date(date, options).await?;
            report::summary(
                &format!("Ingest {}", report.key),
                &[
                    ("Expected", report.expected.to_string()),
                    ("Built", report.built.to_string()),
                    ("Inserted", report.inserted.to_string()),
                    ("Dry run", report.dry_run.to_string()),
                    ("Phase", report.phase.to_string()),
                ],
            );
        }

        Command::Range { start, end, delay } => {
            let start = date::parse_iso_date(&start)?;
            let end = date::parse_iso_date(&end)?;
            let delay_ms = delay.unwrap_or(config.ingest.delay_ms);

            let store = open_store(&config, cli.local_store.as_ref())?;
            let ingestor = Ingestor::from_config(&config, store)?;
            let options = IngestOptions {
                keep_staging: config.ingest.keep_staging,
                ..IngestOptions::default()
            };

            let summary = RangeRunner::new(&ingestor, delay_ms)
                .with_options(options)
                .run(start, end)
                .await?;
            summary.print();

            std::process::exit(summary.exit_code());
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            report::success(&format!(
                "Config OK (source '{}' at {})",
                config.source.slug, config.source.endpoint
            ));
        }
    }

    Ok(())
}
