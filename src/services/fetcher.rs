// src/services/fetcher.rs

//! Stargazers listing page fetcher.
//!
//! Retrieves one raw listing page per call. No retries happen here: a
//! failed page ends pagination in the collector.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;

/// Why a listing page could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageUnavailable {
    /// Server answered with a non-success status
    Status(u16),
    /// Request exceeded the client timeout
    Timeout,
    /// Connection or body read failed
    Transport(String),
}

impl fmt::Display for PageUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "status {code}"),
            Self::Timeout => write!(f, "timed out"),
            Self::Transport(message) => write!(f, "transport error: {message}"),
        }
    }
}

impl From<reqwest::Error> for PageUnavailable {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Source of raw stargazers listing pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch 1-based page `page` of the listing for `repo_slug` (`owner/repo`).
    async fn fetch_page(&self, repo_slug: &str, page: u32) -> Result<String, PageUnavailable>;
}

/// Fetches listing pages from the GitHub web UI.
pub struct HttpPageFetcher {
    client: Client,
    web_base: String,
}

impl HttpPageFetcher {
    /// Create a fetcher; the client's timeout bounds every page request.
    pub fn new(client: Client, web_base: impl Into<String>) -> Self {
        Self {
            client,
            web_base: web_base.into(),
        }
    }

    /// Listing URL of one page.
    pub fn page_url(&self, repo_slug: &str, page: u32) -> String {
        format!(
            "{}/{}/stargazers?page={}",
            self.web_base.trim_end_matches('/'),
            repo_slug,
            page
        )
    }
}

#[async_trait]
impl PageSource for HttpPageFetcher {
    async fn fetch_page(&self, repo_slug: &str, page: u32) -> Result<String, PageUnavailable> {
        let url = self.page_url(repo_slug, page);
        log::debug!("Fetching listing page {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PageUnavailable::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}
