//! Enriched stargazer records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public profile attributes returned by a profile lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub html_url: String,

    #[serde(default)]
    pub public_repos: u64,

    #[serde(default)]
    pub followers: u64,

    #[serde(default)]
    pub following: u64,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A newly discovered stargazer with its profile attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StargazerRecord {
    pub profile: UserProfile,

    /// When this run discovered the star
    pub discovered_at: DateTime<Utc>,
}

impl StargazerRecord {
    pub fn new(profile: UserProfile, discovered_at: DateTime<Utc>) -> Self {
        Self {
            profile,
            discovered_at,
        }
    }

    pub fn login(&self) -> &str {
        &self.profile.login
    }

    /// Ranking score: following weighs ten times a follower, a repo twice.
    pub fn score(&self) -> u64 {
        self.profile.followers
            + self.profile.following.saturating_mul(10)
            + self.profile.public_repos.saturating_mul(2)
    }

    /// Profile link, falling back to the conventional URL when the lookup omitted it.
    pub fn profile_url(&self, web_base: &str) -> String {
        if self.profile.html_url.is_empty() {
            format!("{}/{}", web_base.trim_end_matches('/'), self.profile.login)
        } else {
            self.profile.html_url.clone()
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Record with the given counts and a fixed discovery time.
    pub fn record(login: &str, followers: u64, following: u64, repos: u64) -> StargazerRecord {
        StargazerRecord::new(
            UserProfile {
                login: login.to_string(),
                name: None,
                html_url: format!("https://github.com/{login}"),
                public_repos: repos,
                followers,
                following,
                created_at: None,
                updated_at: None,
            },
            DateTime::parse_from_rfc3339("2026-10-18T09:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::record;
    use super::*;

    #[test]
    fn test_score_weights() {
        assert_eq!(record("a", 1, 0, 0).score(), 1);
        assert_eq!(record("a", 0, 1, 0).score(), 10);
        assert_eq!(record("a", 0, 0, 1).score(), 2);
        assert_eq!(record("a", 5, 2, 3).score(), 5 + 20 + 6);
    }

    #[test]
    fn test_profile_deserializes_github_payload() {
        let json = r#"{
            "login": "octocat",
            "name": "The Octocat",
            "html_url": "https://github.com/octocat",
            "public_repos": 8,
            "followers": 20,
            "following": 9,
            "created_at": "2011-01-25T18:44:36Z",
            "updated_at": "2024-01-22T12:00:00Z",
            "site_admin": false
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.login, "octocat");
        assert_eq!(profile.following, 9);
        assert!(profile.created_at.is_some());
    }

    #[test]
    fn test_profile_url_fallback() {
        let mut r = record("ghost", 0, 0, 0);
        r.profile.html_url.clear();
        assert_eq!(r.profile_url("https://github.com/"), "https://github.com/ghost");
    }
}
