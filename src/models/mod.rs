// src/models/mod.rs

//! Domain models for the stargazer tracker.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod record;
mod selectors;
mod snapshot;
mod table;

// Re-export all public types
pub use config::{
    CollectorConfig, Config, CrawlerConfig, EnrichConfig, GitHubConfig, LoggingConfig,
    MessageFormat, NotifyConfig, PathsConfig, ReportConfig, TableConfig, TargetConfig,
};
pub use record::{StargazerRecord, UserProfile};
pub use selectors::ListingSelectors;
pub use snapshot::Snapshot;
pub use table::TableTarget;

#[cfg(test)]
pub(crate) use record::fixtures;
