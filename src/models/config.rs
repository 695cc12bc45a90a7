//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{ListingSelectors, TableTarget};
use crate::utils::retry::BackoffPolicy;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Repository whose stargazers are tracked
    #[serde(default)]
    pub target: TargetConfig,

    /// GitHub endpoints and credentials
    #[serde(default)]
    pub github: GitHubConfig,

    /// HTTP behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Incremental pagination settings
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Profile lookup retry settings
    #[serde(default)]
    pub enrich: EnrichConfig,

    /// Summary rendering settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Webhook notification settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// External table sink settings
    #[serde(default)]
    pub table: TableConfig,

    /// State and artifact locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Stargazers listing markup selectors
    #[serde(default)]
    pub selectors: ListingSelectors,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let slug = slug_pattern();
        if !slug.is_match(&self.target.owner) {
            return Err(AppError::validation(format!(
                "target.owner '{}' is not a valid account name",
                self.target.owner
            )));
        }
        if !slug.is_match(&self.target.repo) {
            return Err(AppError::validation(format!(
                "target.repo '{}' is not a valid repository name",
                self.target.repo
            )));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.collector.first_run_max_pages == 0 {
            return Err(AppError::validation(
                "collector.first_run_max_pages must be > 0",
            ));
        }
        if self.collector.regular_max_pages <= self.collector.first_run_max_pages {
            return Err(AppError::validation(
                "collector.regular_max_pages must be greater than collector.first_run_max_pages",
            ));
        }
        if self.collector.watermark_size == 0 {
            return Err(AppError::validation("collector.watermark_size must be > 0"));
        }
        if self.enrich.max_attempts == 0 {
            return Err(AppError::validation("enrich.max_attempts must be > 0"));
        }
        if self.enrich.min_delay_ms > self.enrich.max_delay_ms {
            return Err(AppError::validation(
                "enrich.min_delay_ms must not exceed enrich.max_delay_ms",
            ));
        }
        if self.report.display_count == 0 {
            return Err(AppError::validation("report.display_count must be > 0"));
        }
        if let Some(url) = &self.table.url {
            TableTarget::from_url(url)?;
        }
        Ok(())
    }

    /// `owner/repo` slug of the tracked repository.
    pub fn repo_slug(&self) -> String {
        format!("{}/{}", self.target.owner, self.target.repo)
    }

    /// Public web link of the tracked repository.
    pub fn repo_url(&self) -> String {
        format!(
            "{}/{}",
            self.github.web_base.trim_end_matches('/'),
            self.repo_slug()
        )
    }

    /// Storage key of the persisted snapshot.
    pub fn snapshot_key(&self) -> String {
        format!("{}_stargazers.json", self.target.repo)
    }

    /// Storage key of the append-only ledger.
    pub fn ledger_key(&self) -> String {
        format!("{}_stargazers_ledger.csv", self.target.repo)
    }

    /// Storage key of the latest-batch file.
    pub fn latest_key(&self) -> String {
        format!("{}_stargazers_latest.csv", self.target.repo)
    }

    /// Backoff policy derived from the enrichment settings.
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::from(&self.enrich)
    }
}

fn slug_pattern() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("static regex"))
}

/// Tracked repository.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TargetConfig {
    /// Repository owner (user or organization)
    #[serde(default)]
    pub owner: String,

    /// Repository name
    #[serde(default)]
    pub repo: String,
}

/// GitHub endpoints and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Base URL of the web UI serving the stargazers listing
    #[serde(default = "defaults::web_base")]
    pub web_base: String,

    /// Base URL of the REST API used for profile lookups
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Personal access token for the REST API
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            web_base: defaults::web_base(),
            api_base: defaults::api_base(),
            token: None,
        }
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between listing page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent profile lookups
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Incremental pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Page cap when no previous snapshot exists
    #[serde(default = "defaults::first_run_max_pages")]
    pub first_run_max_pages: u32,

    /// Page cap when a previous snapshot exists
    #[serde(default = "defaults::regular_max_pages")]
    pub regular_max_pages: u32,

    /// Number of trailing snapshot entries used as the stop signal
    #[serde(default = "defaults::watermark_size")]
    pub watermark_size: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            first_run_max_pages: defaults::first_run_max_pages(),
            regular_max_pages: defaults::regular_max_pages(),
            watermark_size: defaults::watermark_size(),
        }
    }
}

/// Profile lookup retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Attempts per identifier, including the first
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: usize,

    /// Base delay doubled on every retry
    #[serde(default = "defaults::base_delay")]
    pub base_delay_ms: u64,

    /// Lower bound on any retry wait
    #[serde(default = "defaults::min_delay")]
    pub min_delay_ms: u64,

    /// Upper bound on any retry wait
    #[serde(default = "defaults::max_delay")]
    pub max_delay_ms: u64,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            base_delay_ms: defaults::base_delay(),
            min_delay_ms: defaults::min_delay(),
            max_delay_ms: defaults::max_delay(),
        }
    }
}

/// Summary rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of ranked entries rendered in the notification
    #[serde(default = "defaults::display_count")]
    pub display_count: usize,

    /// Post a notification even when nothing new was found
    #[serde(default)]
    pub notify_when_empty: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            display_count: defaults::display_count(),
            notify_when_empty: false,
        }
    }
}

/// Shape of the webhook message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    #[default]
    Text,
    Card,
}

/// Webhook notification settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    /// Webhook endpoint; notifications are disabled when unset
    #[serde(default, skip_serializing)]
    pub webhook_url: Option<String>,

    /// Message shape
    #[serde(default)]
    pub format: MessageFormat,
}

/// External table sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Shared table URL holding the app and table identifiers; sink is disabled when unset
    #[serde(default)]
    pub url: Option<String>,

    /// Base URL of the table service API
    #[serde(default = "defaults::table_api_base")]
    pub api_base: String,

    /// Pre-issued access token
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,

    /// App credentials exchanged for a tenant token when no access token is set
    #[serde(default, skip_serializing)]
    pub app_id: Option<String>,

    #[serde(default, skip_serializing)]
    pub app_secret: Option<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_base: defaults::table_api_base(),
            access_token: None,
            app_id: None,
            app_secret: None,
        }
    }
}

/// State and artifact locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the snapshot and CSV artifacts
    #[serde(default = "defaults::state_dir")]
    pub state_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_dir: defaults::state_dir(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // GitHub defaults
    pub fn web_base() -> String {
        "https://github.com".into()
    }
    pub fn api_base() -> String {
        "https://api.github.com".into()
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; stargazer-watch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn request_delay() -> u64 {
        500
    }
    pub fn max_concurrent() -> usize {
        5
    }

    // Collector defaults
    pub fn first_run_max_pages() -> u32 {
        5
    }
    pub fn regular_max_pages() -> u32 {
        10
    }
    pub fn watermark_size() -> usize {
        3
    }

    // Enrichment defaults
    pub fn max_attempts() -> usize {
        3
    }
    pub fn base_delay() -> u64 {
        1_000
    }
    pub fn min_delay() -> u64 {
        2_000
    }
    pub fn max_delay() -> u64 {
        10_000
    }

    // Report defaults
    pub fn display_count() -> usize {
        10
    }

    // Sink defaults
    pub fn table_api_base() -> String {
        "https://open.feishu.cn".into()
    }

    // Paths defaults
    pub fn state_dir() -> String {
        "storage".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.target.owner = "rust-lang".to_string();
        config.target.repo = "rust".to_string();
        config
    }

    #[test]
    fn validate_default_target_fails() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn validate_configured_target_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_slash_in_repo() {
        let mut config = valid_config();
        config.target.repo = "rust/extra".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = valid_config();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_warm_cap_above_cold_cap() {
        let mut config = valid_config();
        config.collector.regular_max_pages = config.collector.first_run_max_pages;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_malformed_table_url() {
        let mut config = valid_config();
        config.table.url = Some("https://example.com/not-a-table".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [target]
            owner = "octo"
            repo = "hello"

            [notify]
            format = "card"
            "#,
        )
        .unwrap();

        assert_eq!(config.repo_slug(), "octo/hello");
        assert_eq!(config.notify.format, MessageFormat::Card);
        assert_eq!(config.collector.first_run_max_pages, 5);
        assert_eq!(config.collector.regular_max_pages, 10);
        assert_eq!(config.collector.watermark_size, 3);
        assert_eq!(config.snapshot_key(), "hello_stargazers.json");
    }

    #[test]
    fn repo_url_trims_trailing_slash() {
        let mut config = valid_config();
        config.github.web_base = "https://github.com/".to_string();
        assert_eq!(config.repo_url(), "https://github.com/rust-lang/rust");
    }
}
