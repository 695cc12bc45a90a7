// src/config.rs

//! Configuration loading utilities.
//!
//! A run's configuration is built once at startup: file (or stored object),
//! then environment overrides, then validation. Components only ever see the
//! resulting `Config` by reference.

use std::str::FromStr;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::storage::StarStorage;

/// Load configuration from a TOML object in storage.
pub async fn load_config_from_storage(storage: &dyn StarStorage, key: &str) -> Result<Config> {
    log::info!("Loading config from {}", storage.location(key));
    let bytes = storage
        .read_bytes(key)
        .await?
        .ok_or_else(|| AppError::config(format!("Config not found: {}", storage.location(key))))?;

    let s = String::from_utf8(bytes)
        .map_err(|e| AppError::config(format!("Config {key} is not valid UTF-8: {e}")))?;
    Ok(toml::from_str(&s)?)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Empty values are ignored. Numeric variables that fail to parse are
/// reported as configuration errors.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("GITHUB_OWNER") {
        config.target.owner = v;
    }
    if let Some(v) = get("GITHUB_REPO") {
        config.target.repo = v;
    }
    if let Some(v) = get("GITHUB_TOKEN") {
        config.github.token = Some(v);
    }
    if let Some(v) = get("WEBHOOK_URL") {
        config.notify.webhook_url = Some(v);
    }
    if let Some(v) = get("TABLE_URL") {
        config.table.url = Some(v);
    }
    if let Some(v) = get("TABLE_APP_ID") {
        config.table.app_id = Some(v);
    }
    if let Some(v) = get("TABLE_APP_SECRET") {
        config.table.app_secret = Some(v);
    }
    if let Some(v) = get("TABLE_ACCESS_TOKEN") {
        config.table.access_token = Some(v);
    }
    if let Some(v) = get("CRAWL_TIMEOUT_SECS") {
        config.crawler.timeout_secs = parse_var("CRAWL_TIMEOUT_SECS", &v)?;
    }
    if let Some(v) = get("MAX_CONCURRENT") {
        config.crawler.max_concurrent = parse_var("MAX_CONCURRENT", &v)?;
    }
    if let Some(v) = get("FIRST_RUN_MAX_PAGES") {
        config.collector.first_run_max_pages = parse_var("FIRST_RUN_MAX_PAGES", &v)?;
    }
    if let Some(v) = get("REGULAR_MAX_PAGES") {
        config.collector.regular_max_pages = parse_var("REGULAR_MAX_PAGES", &v)?;
    }
    if let Some(v) = get("DISPLAY_COUNT") {
        config.report.display_count = parse_var("DISPLAY_COUNT", &v)?;
    }
    Ok(())
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::config(format!("{name}='{value}' is invalid: {e}")))
}
