//! Gazette CLI
//!
//! Local execution entry point. A scheduler is expected to invoke `run`
//! periodically.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use clap::{Parser, Subcommand};
use gazette::{
    error::{AppError, Result},
    models::Config,
    pipeline::{self, Auxiliary},
    services::{AdapterSet, HttpGateway},
    storage::{LocalStorage, SnapshotStore},
};

/// Gazette - Feed aggregation into one daily snapshot
#[derive(Parser, Debug)]
#[command(
    name = "gazette",
    version,
    about = "Aggregates community and official feeds into one news snapshot"
)]
struct Cli {
    /// Path to storage directory holding config.toml and news_data.json
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Explicit config file; failing to load it is an error
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch all sources and publish a new snapshot
    Run {
        /// Weather block (JSON object) to embed
        #[arg(long)]
        weather: Option<PathBuf>,

        /// Advertisement block (JSON array) to embed
        #[arg(long)]
        ads: Option<PathBuf>,

        /// Also write run_report.json
        #[arg(long)]
        report: bool,
    },

    /// Validate configuration
    Validate,

    /// Show current snapshot info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Resolve configuration: explicit path, then `{storage_dir}/config.toml`,
/// then built-in defaults; environment overrides apply last.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            log::info!("Loaded configuration from {}", path.display());
            config
        }
        None => {
            let path = cli.storage_dir.join("config.toml");
            if path.exists() {
                Config::load_or_default(&path)
            } else {
                log::info!("No config.toml in {}, using defaults", cli.storage_dir.display());
                Config::default()
            }
        }
    };
    config.apply_env()?;
    Ok(config)
}

/// Read an auxiliary JSON block; unreadable input is skipped with a warning.
fn read_block(path: Option<&Path>, expect_array: bool) -> Option<serde_json::Value> {
    let path = path?;
    let parsed = std::fs::read_to_string(path)
        .map_err(AppError::from)
        .and_then(|content| Ok(serde_json::from_str::<serde_json::Value>(&content)?));

    match parsed {
        Ok(value) if (expect_array && value.is_array()) || (!expect_array && value.is_object()) => {
            Some(value)
        }
        Ok(_) => {
            log::warn!(
                "Ignoring {}: expected a JSON {}",
                path.display(),
                if expect_array { "array" } else { "object" }
            );
            None
        }
        Err(e) => {
            log::warn!("Ignoring {}: {}", path.display(), e);
            None
        }
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let storage = LocalStorage::new(&cli.storage_dir);

    match &cli.command {
        Command::Run {
            weather,
            ads,
            report,
        } => {
            config.validate()?;
            let started = Instant::now();

            let gateway = Arc::new(HttpGateway::new(&config.fetch)?);
            let adapters = AdapterSet::new(gateway);
            let aux = Auxiliary {
                weather: read_block(weather.as_deref(), false),
                ads: read_block(ads.as_deref(), true),
            };

            let mut run_report =
                pipeline::run_pipeline(&config, &adapters, &storage, aux, Utc::now()).await?;
            run_report.finished_at = Some(Utc::now());
            run_report.log_summary();

            if *report {
                storage.save_report(&run_report).await?;
                log::info!("Run report written to {}", storage.root_dir().display());
            }

            log::info!(
                "Run complete in {:.1}s: {} items, {} new, {} failed sources",
                started.elapsed().as_secs_f64(),
                run_report.total_items(),
                run_report.total_added(),
                run_report.failed_sources().count()
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} categories, {} sources, gateway {})",
                config.categories.len(),
                config.source_count(),
                config.gateway.base_url
            );
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());

            match storage.load_snapshot().await? {
                Some(snapshot) => {
                    log::info!("Edition: {}", snapshot.meta.edition);
                    if let Some(updated) = snapshot.meta.updated_at {
                        log::info!("Last updated: {}", updated.to_rfc3339());
                    }
                    for (key, bucket) in &snapshot.categories {
                        log::info!("  {} ({}): {} items", key, bucket.label, bucket.count);
                    }
                    log::info!("Total: {} items", snapshot.total_items());
                }
                None => log::info!("No snapshot found yet."),
            }
        }
    }

    Ok(())
}
