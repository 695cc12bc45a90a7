//! Persisted list of known stargazers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Every stargazer known as of the last successful run, oldest first.
///
/// Serialized as a bare JSON array of logins. Duplicates are dropped on
/// construction so the list stays a set with a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Snapshot {
    logins: Vec<String>,
}

impl Snapshot {
    /// Build a snapshot from logins in oldest-first order.
    pub fn new(logins: Vec<String>) -> Self {
        let mut seen = HashSet::with_capacity(logins.len());
        let logins = logins
            .into_iter()
            .filter(|login| seen.insert(login.clone()))
            .collect();
        Self { logins }
    }

    pub fn is_empty(&self) -> bool {
        self.logins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.logins.len()
    }

    pub fn logins(&self) -> &[String] {
        &self.logins
    }

    pub fn contains(&self, login: &str) -> bool {
        self.logins.iter().any(|l| l == login)
    }

    /// The last `size` logins, i.e. the most recently starred ones.
    pub fn watermark(&self, size: usize) -> HashSet<&str> {
        let start = self.logins.len().saturating_sub(size);
        self.logins[start..].iter().map(String::as_str).collect()
    }

    /// Snapshot after a run that discovered `added`, given newest first.
    ///
    /// New logins land at the end in oldest-first order so the watermark
    /// keeps tracking the most recent stargazers.
    pub fn merged_with(&self, added: &[String]) -> Snapshot {
        let mut logins = self.logins.clone();
        logins.extend(added.iter().rev().cloned());
        Snapshot::new(logins)
    }
}

impl From<Vec<String>> for Snapshot {
    fn from(logins: Vec<String>) -> Self {
        Self::new(logins)
    }
}

impl From<Snapshot> for Vec<String> {
    fn from(snapshot: Snapshot) -> Self {
        snapshot.logins
    }
}
