//! Ranking and summary rendering.
//!
//! Orders a run's new stargazers by influence and renders the message
//! posted to the notification sink.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::StargazerRecord;

/// A record with its score, in rank order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedStargazer {
    pub record: StargazerRecord,
    pub score: u64,
}

/// Sort records by descending score; equal scores keep input order.
pub fn rank_records(records: &[StargazerRecord]) -> Vec<RankedStargazer> {
    let mut ranked: Vec<RankedStargazer> = records
        .iter()
        .map(|record| RankedStargazer {
            score: record.score(),
            record: record.clone(),
        })
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// Human-readable summary of one run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub repo_slug: String,
    pub repo_url: String,
    /// Base URL used to build profile links missing from lookups
    pub web_base: String,
    /// Number of new stargazers discovered, enriched or not
    pub total_new: usize,
    pub ranked: Vec<RankedStargazer>,
    pub display_count: usize,
    pub incomplete: bool,
}

impl RunSummary {
    pub fn title(&self) -> String {
        format!("{} new stargazer(s) on {}", self.total_new, self.repo_slug)
    }

    fn shown(&self) -> &[RankedStargazer] {
        &self.ranked[..self.ranked.len().min(self.display_count)]
    }

    fn hidden(&self) -> usize {
        self.total_new.saturating_sub(self.shown().len())
    }

    /// Plain text body for text messages.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[{}] {}", self.date, self.title());
        let _ = writeln!(out, "{}", self.repo_url);

        if self.total_new == 0 {
            let _ = writeln!(out, "\nNo new stargazers since the last run.");
        }

        for (i, entry) in self.shown().iter().enumerate() {
            let profile = &entry.record.profile;
            let _ = writeln!(
                out,
                "\n{}. {}{} (score {})\n   {}\n   followers {} | following {} | repos {}",
                i + 1,
                profile.login,
                display_name(profile.name.as_deref()),
                entry.score,
                entry.record.profile_url(&self.web_base),
                profile.followers,
                profile.following,
                profile.public_repos
            );
        }

        if self.hidden() > 0 {
            let _ = writeln!(out, "\n... and {} more", self.hidden());
        }
        if self.incomplete {
            let _ = writeln!(
                out,
                "\nNote: the page limit was reached before known stargazers; this list may be incomplete."
            );
        }
        out.trim_end().to_string()
    }

    /// Markdown body for card messages.
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "**Date:** {}\n**Repository:** [{}]({})\n**New stargazers:** {}",
            self.date, self.repo_slug, self.repo_url, self.total_new
        );

        for (i, entry) in self.shown().iter().enumerate() {
            let profile = &entry.record.profile;
            let _ = writeln!(
                out,
                "{}. [{}]({}){} followers {}, following {}, repos {} (score {})",
                i + 1,
                profile.login,
                entry.record.profile_url(&self.web_base),
                display_name(profile.name.as_deref()),
                profile.followers,
                profile.following,
                profile.public_repos,
                entry.score
            );
        }

        if self.hidden() > 0 {
            let _ = writeln!(out, "... and {} more", self.hidden());
        }
        if self.incomplete {
            let _ = writeln!(out, "*The page limit was reached; this list may be incomplete.*");
        }
        out.trim_end().to_string()
    }
}

fn display_name(name: Option<&str>) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!(" ({name})"),
        None => String::new(),
    }
}
