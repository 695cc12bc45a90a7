//! Stargazer login extraction from listing markup.

use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::ListingSelectors;
use crate::utils::last_path_segment;

/// Parses listing pages into logins using configured CSS selectors.
#[derive(Debug)]
pub struct StargazerExtractor {
    container: Selector,
    item: Selector,
    login: Selector,
}

impl StargazerExtractor {
    /// Compile the selectors, failing on any invalid one.
    pub fn new(selectors: &ListingSelectors) -> Result<Self> {
        Ok(Self {
            container: Self::parse_selector(&selectors.container_selector)?,
            item: Self::parse_selector(&selectors.item_selector)?,
            login: Self::parse_selector(&selectors.login_selector)?,
        })
    }

    /// Logins on one page, in page order.
    ///
    /// A page without the list container yields nothing; that is the
    /// normal shape of the page past the end of the listing.
    pub fn extract(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        let Some(container) = document.select(&self.container).next() else {
            log::debug!("Listing container not found on page");
            return Vec::new();
        };

        container
            .select(&self.item)
            .filter_map(|item| {
                let link = item.select(&self.login).next()?;
                let text = link.text().collect::<String>().trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
                link.value().attr("href").and_then(last_path_segment)
            })
            .collect()
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Listing page markup for the given logins.
    pub fn listing_page(logins: &[&str]) -> String {
        let items: String = logins
            .iter()
            .map(|login| {
                format!(
                    r#"<li class="col-md-4 mb-3">
                        <img src="https://avatars.example/{login}" />
                        <div><h2 class="h4 mb-1"><a href="/{login}"> {login} </a></h2></div>
                    </li>"#
                )
            })
            .collect();
        format!(
            r#"<html><body><main>
            <ol class="d-block d-md-flex flex-wrap gutter list-style-none">{items}</ol>
            </main></body></html>"#
        )
    }

    /// Page past the end of the listing.
    pub fn empty_page() -> String {
        r#"<html><body><main><p>This repository has no more stargazers.</p></main></body></html>"#
            .to_string()
    }
}
