//! Diff calculation between the previous snapshot and a fresh collection.

use std::collections::HashSet;

use crate::models::Snapshot;

/// Logins present in the current collection but not in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StarDiff {
    /// New logins in discovery order, newest first
    pub added: Vec<String>,
}

impl StarDiff {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}

/// `current - previous` by login equality, without duplicates.
pub fn calculate_diff(previous: &Snapshot, current: &[String]) -> StarDiff {
    let known: HashSet<&str> = previous.logins().iter().map(String::as_str).collect();
    let mut seen = HashSet::new();

    let added = current
        .iter()
        .filter(|login| !known.contains(login.as_str()))
        .filter(|login| seen.insert(login.as_str()))
        .cloned()
        .collect();

    StarDiff { added }
}
