//! Stargazer Watch CLI
//!
//! Local and cron entry point. For AWS Lambda, use `stargazer-watch-lambda`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stargazer_watch::{
    config::apply_env_overrides,
    error::{AppError, Result},
    models::Config,
    pipeline::{self, RunStatus},
    storage::{LocalStorage, StarStorage},
};

/// Stargazer Watch - incremental GitHub stargazer tracker
#[derive(Parser, Debug)]
#[command(
    name = "stargazer-watch",
    version,
    about = "Tracks new stargazers of a GitHub repository"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Directory holding the snapshot and CSV files (overrides paths.state_dir)
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one full tracking pass and update state
    Run,

    /// Collect and diff only; print new stargazers without writing anything
    Collect,

    /// Validate configuration and print the effective values
    Validate,

    /// Show current snapshot info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, default_level: &str) {
    let level = if verbose { "debug" } else { default_level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_logging(cli.verbose, &level);

    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        );
        Config::default()
    });
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    log::info!("Loaded configuration from {}", cli.config.display());

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    let state_dir = cli
        .storage_dir
        .unwrap_or_else(|| PathBuf::from(&config.paths.state_dir));
    let storage = LocalStorage::new(&state_dir);

    match cli.command {
        Command::Run => {
            log::info!("Tracking stargazers of {}", config.repo_slug());
            match pipeline::run_guarded(pipeline::run_tracker(&config, &storage)).await {
                RunStatus::Completed(report) => {
                    log::info!(
                        "{} new stargazer(s), {} known in total{}",
                        report.new_stargazers,
                        report.total_known,
                        if report.incomplete {
                            " (page limit reached, may be incomplete)"
                        } else {
                            ""
                        }
                    );
                    for error in &report.sink_errors {
                        log::warn!("Sink error: {}", error);
                    }
                }
                RunStatus::Failed(message) => {
                    log::error!("Run failed, state left untouched: {}", message);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Command::Collect => {
            let preview = pipeline::preview_tracker(&config, &storage).await?;
            log::info!(
                "Fetched {} page(s) ({} start, cap {}), {} new of {} collected{}",
                preview.collected.pages_fetched,
                if preview.collected.cold_start { "cold" } else { "warm" },
                preview.collected.cap,
                preview.diff.len(),
                preview.collected.entries.len(),
                if preview.collected.is_incomplete() {
                    ", may be incomplete"
                } else {
                    ""
                }
            );
            for login in &preview.diff.added {
                println!("{login}");
            }
        }

        Command::Validate => {
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| AppError::config(format!("Cannot render config: {e}")))?;
            println!("{rendered}");
            log::info!("Config OK for {}", config.repo_slug());
        }

        Command::Info => {
            let snapshot_key = config.snapshot_key();
            log::info!("Repository: {}", config.repo_url());
            log::info!("State directory: {}", state_dir.display());

            let snapshot = storage.load_snapshot(&snapshot_key).await?;
            if snapshot.is_empty() {
                log::info!("No snapshot yet; next run is a cold start");
            } else {
                let mut watermark: Vec<_> = snapshot
                    .watermark(config.collector.watermark_size)
                    .into_iter()
                    .collect();
                watermark.sort_unstable();
                log::info!("Known stargazers: {}", snapshot.len());
                log::info!("Watermark: {}", watermark.join(", "));
            }

            let ledger_key = config.ledger_key();
            match storage.read_bytes(&ledger_key).await? {
                Some(bytes) => log::info!(
                    "Ledger: {} ({} record(s))",
                    storage.location(&ledger_key),
                    bytes
                        .split(|b| *b == b'\n')
                        .filter(|line| !line.is_empty())
                        .count()
                        .saturating_sub(1)
                ),
                None => log::info!("Ledger: not created yet"),
            }
        }
    }

    log::info!("Done!");

    Ok(ExitCode::SUCCESS)
}
