//! Service layer for the stargazer tracker.
//!
//! This module contains the network-facing pieces of a run:
//! - Listing page retrieval (`HttpPageFetcher`)
//! - Login extraction (`StargazerExtractor`)
//! - Watermark-bounded pagination (`IncrementalCollector`)
//! - Profile lookups with retry (`DetailEnricher`)
//! - Output sinks (`WebhookNotifier`, `TableSink`)

pub mod collector;
pub mod enricher;
pub mod extractor;
pub mod fetcher;
pub mod notifier;
pub mod table;

pub use collector::{CollectOutcome, IncrementalCollector};
pub use enricher::{DetailEnricher, EnrichOutcome, GitHubProfileClient, LookupError, ProfileSource};
pub use extractor::StargazerExtractor;
pub use fetcher::{HttpPageFetcher, PageSource, PageUnavailable};
pub use notifier::WebhookNotifier;
pub use table::{TableCredentials, TableSink};
