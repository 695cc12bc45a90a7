// src/pipeline/run.rs

//! One tracking run, end to end.
//!
//! Order of effects:
//! 1. Load the previous snapshot (read errors other than absence abort here)
//! 2. Collect, diff, enrich, rank
//! 3. Append the ledger and overwrite the latest batch (failure aborts)
//! 4. Notify and insert table rows (failures are logged only)
//! 5. Overwrite the snapshot, last
//!
//! If the snapshot write fails, the next run discovers the same logins again.
//! The ledger skips logins it already holds, but notification and table
//! insertion are at-least-once and repeat for that batch.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use serde::Serialize;

use crate::error::Result;
use crate::models::{Config, Snapshot};
use crate::pipeline::diff::{StarDiff, calculate_diff};
use crate::pipeline::rank::{RunSummary, rank_records};
use crate::services::{
    CollectOutcome, DetailEnricher, GitHubProfileClient, HttpPageFetcher, IncrementalCollector,
    PageSource, ProfileSource, StargazerExtractor, TableSink, WebhookNotifier,
};
use crate::storage::StarStorage;
use crate::utils::http::create_async_client;

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Logins not present in the previous snapshot
    pub new_stargazers: usize,
    /// New logins that produced a record
    pub enriched: usize,
    pub enrichment_failures: usize,
    /// Snapshot size after the run
    pub total_known: usize,
    /// Page cap ran out before known stargazers were reached
    pub incomplete: bool,
    pub pages_fetched: u32,
    pub cold_start: bool,
    pub notified: bool,
    pub table_rows: usize,
    /// Sink failures that did not stop the run
    pub sink_errors: Vec<String>,
}

/// Final status of a guarded run.
#[derive(Debug)]
pub enum RunStatus {
    Completed(RunReport),
    Failed(String),
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Completed(_) => None,
            Self::Failed(message) => Some(message.as_str()),
        }
    }
}

/// Collection result without any side effects.
#[derive(Debug, Clone)]
pub struct Preview {
    pub previous: Snapshot,
    pub collected: CollectOutcome,
    pub diff: StarDiff,
}

/// A run's collaborators, borrowed for its duration.
pub struct Tracker<'a> {
    config: &'a Config,
    pages: &'a dyn PageSource,
    profiles: &'a dyn ProfileSource,
    storage: &'a dyn StarStorage,
    notifier: Option<&'a WebhookNotifier>,
    table: Option<&'a TableSink>,
}

impl<'a> Tracker<'a> {
    pub fn new(
        config: &'a Config,
        pages: &'a dyn PageSource,
        profiles: &'a dyn ProfileSource,
        storage: &'a dyn StarStorage,
    ) -> Self {
        Self {
            config,
            pages,
            profiles,
            storage,
            notifier: None,
            table: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Option<&'a WebhookNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_table(mut self, table: Option<&'a TableSink>) -> Self {
        self.table = table;
        self
    }

    /// Load state, collect and diff.
    pub async fn preview(&self) -> Result<Preview> {
        let extractor = StargazerExtractor::new(&self.config.selectors)?;
        let previous = self
            .storage
            .load_snapshot(&self.config.snapshot_key())
            .await?;

        let collected = IncrementalCollector::new(self.pages, &extractor, &self.config.collector)
            .with_request_delay(Duration::from_millis(self.config.crawler.request_delay_ms))
            .collect(&self.config.repo_slug(), &previous)
            .await;

        let diff = calculate_diff(&previous, &collected.entries);
        log::info!(
            "Collected {} stargazer(s) over {} page(s), {} new",
            collected.entries.len(),
            collected.pages_fetched,
            diff.len()
        );

        Ok(Preview {
            previous,
            collected,
            diff,
        })
    }

    pub async fn run(&self) -> Result<RunReport> {
        let config = self.config;
        let web_base = config.github.web_base.as_str();
        let Preview {
            previous,
            collected,
            diff,
        } = self.preview().await?;

        let now = Utc::now();
        let enriched = DetailEnricher::new(
            self.profiles,
            config.backoff_policy(),
            config.crawler.max_concurrent,
        )
        .enrich(&diff.added, now)
        .await;

        let mut report = RunReport {
            new_stargazers: diff.len(),
            enriched: enriched.records.len(),
            enrichment_failures: enriched.failures.len(),
            incomplete: collected.cap_exhausted,
            pages_fetched: collected.pages_fetched,
            cold_start: collected.cold_start,
            ..RunReport::default()
        };
        if !enriched.failures.is_empty() {
            log::warn!(
                "No profile for {} new stargazer(s): {}",
                enriched.failures.len(),
                enriched.failures.join(", ")
            );
        }

        self.storage
            .append_ledger(&config.ledger_key(), &enriched.records, web_base)
            .await?;
        self.storage
            .write_latest(&config.latest_key(), &enriched.records, web_base)
            .await?;

        let summary = RunSummary {
            date: now.date_naive(),
            repo_slug: config.repo_slug(),
            repo_url: config.repo_url(),
            web_base: web_base.to_string(),
            total_new: diff.len(),
            ranked: rank_records(&enriched.records),
            display_count: config.report.display_count,
            incomplete: collected.cap_exhausted,
        };

        if let Some(notifier) = self.notifier {
            if diff.has_changes() || config.report.notify_when_empty {
                match notifier.send(&summary).await {
                    Ok(()) => report.notified = true,
                    Err(e) => {
                        log::error!("Notification failed: {}", e);
                        report.sink_errors.push(e.to_string());
                    }
                }
            } else {
                log::info!("No new stargazers, skipping notification");
            }
        }

        if let Some(table) = self.table {
            match table.insert(&enriched.records, web_base).await {
                Ok(rows) => report.table_rows = rows,
                Err(e) => {
                    log::error!("Table insert failed: {}", e);
                    report.sink_errors.push(e.to_string());
                }
            }
        }

        let merged = previous.merged_with(&diff.added);
        self.storage
            .write_snapshot(&config.snapshot_key(), &merged)
            .await?;
        report.total_known = merged.len();

        log::info!(
            "Run complete: {} new, {} known{}",
            report.new_stargazers,
            report.total_known,
            if report.incomplete {
                " (may be incomplete)"
            } else {
                ""
            }
        );
        Ok(report)
    }
}

/// Run against GitHub and the configured sinks.
pub async fn run_tracker(config: &Config, storage: &dyn StarStorage) -> Result<RunReport> {
    let client = create_async_client(&config.crawler)?;
    let pages = HttpPageFetcher::new(client.clone(), &config.github.web_base);
    let profiles = GitHubProfileClient::new(
        client.clone(),
        &config.github.api_base,
        config.github.token.clone(),
    );
    let notifier = config
        .notify
        .webhook_url
        .as_ref()
        .map(|url| WebhookNotifier::new(client.clone(), url, config.notify.format));
    let table = TableSink::from_config(client, &config.table)?;

    Tracker::new(config, &pages, &profiles, storage)
        .with_notifier(notifier.as_ref())
        .with_table(table.as_ref())
        .run()
        .await
}

/// Collect and diff against GitHub without enrichment, sinks or writes.
pub async fn preview_tracker(config: &Config, storage: &dyn StarStorage) -> Result<Preview> {
    let client = create_async_client(&config.crawler)?;
    let pages = HttpPageFetcher::new(client.clone(), &config.github.web_base);
    let profiles = GitHubProfileClient::new(client, &config.github.api_base, None);

    Tracker::new(config, &pages, &profiles, storage)
        .preview()
        .await
}

/// Drive a run to a status, converting errors and panics into `Failed`.
pub async fn run_guarded<F>(run: F) -> RunStatus
where
    F: Future<Output = Result<RunReport>>,
{
    match AssertUnwindSafe(run).catch_unwind().await {
        Ok(Ok(report)) => RunStatus::Completed(report),
        Ok(Err(e)) => {
            log::error!("Run failed: {}", e);
            RunStatus::Failed(e.to_string())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            log::error!("Run panicked: {}", message);
            RunStatus::Failed(format!("panicked: {message}"))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
