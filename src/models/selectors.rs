// src/models/selectors.rs

//! CSS selectors for scraping the stargazers listing.

use serde::{Deserialize, Serialize};

/// CSS selectors for scraping one stargazers listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Selector for the list container; a page without it holds no entries
    #[serde(default = "default_container")]
    pub container_selector: String,

    /// Selector for each stargazer item within the container
    #[serde(default = "default_item")]
    pub item_selector: String,

    /// Selector for the profile link within an item
    #[serde(default = "default_login")]
    pub login_selector: String,
}

fn default_container() -> String {
    "ol.d-block.d-md-flex.flex-wrap.gutter.list-style-none".to_string()
}

fn default_item() -> String {
    "li.col-md-4.mb-3".to_string()
}

fn default_login() -> String {
    "h2.h4.mb-1 a".to_string()
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            container_selector: default_container(),
            item_selector: default_item(),
            login_selector: default_login(),
        }
    }
}
