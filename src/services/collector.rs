// src/services/collector.rs

//! Incremental stargazer collection.
//!
//! Walks the newest-first listing one page at a time and stops as soon as
//! it meets a login from the previous snapshot's watermark, so each run
//! costs roughly one page per page of new activity.

use std::time::Duration;

use crate::models::{CollectorConfig, Snapshot};
use crate::services::extractor::StargazerExtractor;
use crate::services::fetcher::PageSource;

/// Result of one collection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectOutcome {
    /// Logins in encounter order, newest first
    pub entries: Vec<String>,
    /// Page cap ran out before the watermark was reached
    pub cap_exhausted: bool,
    pub pages_fetched: u32,
    pub cold_start: bool,
    /// Page cap that applied to this pass
    pub cap: u32,
}

impl CollectOutcome {
    /// Whether the listing may hold entries this pass never saw.
    pub fn is_incomplete(&self) -> bool {
        self.cap_exhausted
    }
}

/// Sequential paginated collector with watermark early-stop.
pub struct IncrementalCollector<'a> {
    source: &'a dyn PageSource,
    extractor: &'a StargazerExtractor,
    config: &'a CollectorConfig,
    request_delay: Duration,
}

impl<'a> IncrementalCollector<'a> {
    pub fn new(
        source: &'a dyn PageSource,
        extractor: &'a StargazerExtractor,
        config: &'a CollectorConfig,
    ) -> Self {
        Self {
            source,
            extractor,
            config,
            request_delay: Duration::ZERO,
        }
    }

    /// Pause between consecutive page requests.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Page cap for the given previous snapshot.
    pub fn page_cap(&self, previous: &Snapshot) -> u32 {
        if previous.is_empty() {
            self.config.first_run_max_pages
        } else {
            self.config.regular_max_pages
        }
    }

    /// Collect logins for `repo_slug` until the watermark, an empty page,
    /// a failed page, or the page cap.
    ///
    /// The login that matches the watermark is kept as the last entry.
    pub async fn collect(&self, repo_slug: &str, previous: &Snapshot) -> CollectOutcome {
        let watermark = previous.watermark(self.config.watermark_size);
        let cold_start = previous.is_empty();
        let cap = self.page_cap(previous);

        log::info!(
            "Collecting stargazers of {} ({} start, cap {} pages)",
            repo_slug,
            if cold_start { "cold" } else { "warm" },
            cap
        );

        let mut entries = Vec::new();
        let mut reached_watermark = false;
        let mut pages_fetched = 0;
        let mut page = 1;

        while page <= cap && !reached_watermark {
            if page > 1 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }

            let html = match self.source.fetch_page(repo_slug, page).await {
                Ok(html) => html,
                Err(reason) => {
                    log::warn!("Listing page {} unavailable ({}), stopping", page, reason);
                    break;
                }
            };
            pages_fetched += 1;

            let logins = self.extractor.extract(&html);
            if logins.is_empty() {
                log::info!("Listing page {} is empty, end of list", page);
                break;
            }

            for login in logins {
                if watermark.contains(login.as_str()) {
                    log::info!("Reached known stargazer {} on page {}", login, page);
                    entries.push(login);
                    reached_watermark = true;
                    break;
                }
                entries.push(login);
            }

            page += 1;
        }

        let cap_exhausted = page > cap && !reached_watermark;
        if cap_exhausted {
            log::warn!(
                "Page cap of {} reached without meeting a known stargazer; result may be incomplete",
                cap
            );
        }

        CollectOutcome {
            entries,
            cap_exhausted,
            pages_fetched,
            cold_start,
            cap,
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::services::extractor::fixtures::{empty_page, listing_page};
    use crate::services::fetcher::{PageSource, PageUnavailable};

    /// In-memory listing; pages past the end render without a container.
    #[derive(Default)]
    pub struct FakeListing {
        pages: Vec<Vec<String>>,
        failing: HashMap<u32, PageUnavailable>,
        requested: Mutex<Vec<u32>>,
    }

    impl FakeListing {
        pub fn new(pages: &[&[&str]]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|page| page.iter().map(|s| s.to_string()).collect())
                    .collect(),
                ..Self::default()
            }
        }

        pub fn failing_at(mut self, page: u32, reason: PageUnavailable) -> Self {
            self.failing.insert(page, reason);
            self
        }

        pub fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for FakeListing {
        async fn fetch_page(&self, _repo_slug: &str, page: u32) -> Result<String, PageUnavailable> {
            self.requested.lock().unwrap().push(page);
            if let Some(reason) = self.failing.get(&page) {
                return Err(reason.clone());
            }
            match self.pages.get(page as usize - 1) {
                Some(logins) => {
                    let refs: Vec<&str> = logins.iter().map(String::as_str).collect();
                    Ok(listing_page(&refs))
                }
                None => Ok(empty_page()),
            }
        }
    }
}
