//! AWS Lambda entry point for Stargazer Watch
//!
//! Deploy with `cargo lambda build --release --features lambda`
//! and trigger on a schedule (e.g. an EventBridge rule).
//!
//! Environment:
//! - `S3_BUCKET`, `S3_PREFIX`: where the snapshot and CSV files live
//! - `CONFIG_S3_KEY`: optional TOML config object under the prefix
//! - the same overrides the CLI accepts (`GITHUB_OWNER`, `GITHUB_REPO`, ...)

use std::time::Instant;

use lambda_runtime::{Error as LambdaError, LambdaEvent, service_fn};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stargazer_watch::{
    config::{apply_env_overrides, load_config_from_storage},
    error::Result,
    models::Config,
    pipeline::{RunStatus, run_guarded, run_tracker},
    storage::S3Storage,
};

/// Lambda response payload.
#[derive(Debug, Default, Serialize)]
struct TrackResponse {
    /// Whether the run completed
    success: bool,

    /// Stargazers discovered by this run
    new_stargazers: usize,

    /// Snapshot size after the run
    total_known: usize,

    /// Page cap was reached before known stargazers
    incomplete: bool,

    /// Error message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,

    /// Execution time in milliseconds
    execution_time_ms: u64,
}

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> std::result::Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Stargazer Watch Lambda starting...");
    lambda_runtime::run(service_fn(handler)).await
}

/// Handler for scheduled invocations; the event payload is ignored.
#[instrument(skip(event))]
async fn handler(event: LambdaEvent<Value>) -> std::result::Result<TrackResponse, LambdaError> {
    let start = Instant::now();
    info!("Received event: {:?}", event.payload);

    let env = |name: &str| std::env::var(name).ok();
    let bucket = env("S3_BUCKET").unwrap_or_else(|| "stargazer-watch".to_string());
    let prefix = env("S3_PREFIX").unwrap_or_default();
    let storage = S3Storage::connect(bucket, prefix).await;

    let status = match load_lambda_config(&storage).await {
        Ok(config) => run_guarded(run_tracker(&config, &storage)).await,
        Err(e) => RunStatus::Failed(e.to_string()),
    };

    let execution_time_ms = start.elapsed().as_millis() as u64;
    let response = match status {
        RunStatus::Completed(report) => {
            info!(
                "Run completed: {} new, {} known in {}ms",
                report.new_stargazers, report.total_known, execution_time_ms
            );
            TrackResponse {
                success: true,
                new_stargazers: report.new_stargazers,
                total_known: report.total_known,
                incomplete: report.incomplete,
                error: None,
                execution_time_ms,
            }
        }
        RunStatus::Failed(message) => {
            error!("Run failed: {}", message);
            TrackResponse {
                error: Some(message),
                execution_time_ms,
                ..TrackResponse::default()
            }
        }
    };
    Ok(response)
}

/// Config from the optional S3 object, then environment overrides.
async fn load_lambda_config(storage: &S3Storage) -> Result<Config> {
    let mut config = match std::env::var("CONFIG_S3_KEY") {
        Ok(key) if !key.is_empty() => load_config_from_storage(storage, &key).await?,
        _ => Config::default(),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}
