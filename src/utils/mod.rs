//! Utility functions and helpers.

pub mod http;
pub mod retry;

/// Last non-empty path segment of a link, e.g. the login in `/octocat`.
pub fn last_path_segment(href: &str) -> Option<String> {
    href.split(['?', '#'])
        .next()?
        .split('/')
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_path_segment() {
        assert_eq!(last_path_segment("/octocat"), Some("octocat".to_string()));
        assert_eq!(
            last_path_segment("https://github.com/octocat/?tab=stars"),
            Some("octocat".to_string())
        );
        assert_eq!(last_path_segment("/"), None);
    }
}
