//! CSV encoding for the ledger and latest-batch files.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::StargazerRecord;

/// Column order shared by the ledger and the latest-batch file.
pub const LEDGER_HEADER: [&str; 10] = [
    "login",
    "name",
    "profile_url",
    "public_repos",
    "followers",
    "following",
    "score",
    "created_at",
    "updated_at",
    "discovered_at",
];

#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    login: &'a str,
    name: &'a str,
    profile_url: String,
    public_repos: u64,
    followers: u64,
    following: u64,
    score: u64,
    created_at: String,
    updated_at: String,
    discovered_at: String,
}

impl<'a> LedgerRow<'a> {
    fn new(record: &'a StargazerRecord, web_base: &str) -> Self {
        let profile = &record.profile;
        Self {
            login: &profile.login,
            name: profile.name.as_deref().unwrap_or_default(),
            profile_url: record.profile_url(web_base),
            public_repos: profile.public_repos,
            followers: profile.followers,
            following: profile.following,
            score: record.score(),
            created_at: profile.created_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            updated_at: profile.updated_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            discovered_at: record.discovered_at.to_rfc3339(),
        }
    }
}

/// Encode records as CSV rows, preceded by the header when `with_header`.
pub fn encode_rows(
    records: &[StargazerRecord],
    web_base: &str,
    with_header: bool,
) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    if with_header {
        writer.write_record(LEDGER_HEADER)?;
    }
    for record in records {
        writer.serialize(LedgerRow::new(record, web_base))?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))
}

/// Logins already recorded in ledger bytes (first column, header skipped).
pub fn recorded_logins(bytes: &[u8]) -> Result<HashSet<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut logins = HashSet::new();
    for row in reader.records() {
        if let Some(login) = row?.get(0).filter(|l| !l.is_empty()) {
            logins.insert(login.to_string());
        }
    }
    Ok(logins)
}

/// Append rows to existing ledger bytes, starting a new ledger when absent.
///
/// Records whose login is already in the ledger are skipped, so replaying a
/// batch after a failed snapshot write does not duplicate rows. Returns the
/// new bytes and the number of rows appended.
pub fn append_rows(
    existing: Option<Vec<u8>>,
    records: &[StargazerRecord],
    web_base: &str,
) -> Result<(Vec<u8>, usize)> {
    let Some(mut bytes) = existing.filter(|bytes| !bytes.is_empty()) else {
        return Ok((encode_rows(records, web_base, true)?, records.len()));
    };

    let known = recorded_logins(&bytes)?;
    let fresh: Vec<StargazerRecord> = records
        .iter()
        .filter(|r| !known.contains(r.login()))
        .cloned()
        .collect();
    if fresh.is_empty() {
        return Ok((bytes, 0));
    }

    if bytes.last() != Some(&b'\n') {
        bytes.push(b'\n');
    }
    bytes.extend(encode_rows(&fresh, web_base, false)?);
    Ok((bytes, fresh.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::record;

    fn lines(bytes: &[u8]) -> Vec<String> {
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn header_only_when_empty() {
        let bytes = encode_rows(&[], "https://github.com", true).unwrap();
        assert_eq!(lines(&bytes), vec![LEDGER_HEADER.join(",")]);
    }

    #[test]
    fn row_columns_follow_header() {
        let mut r = record("amy", 3, 1, 2);
        r.profile.name = Some("Amy, Jr.".to_string());
        let bytes = encode_rows(&[r], "https://github.com", false).unwrap();

        assert_eq!(
            lines(&bytes),
            vec![
                "amy,\"Amy, Jr.\",https://github.com/amy,2,3,1,17,,,2026-10-18T09:00:00+00:00"
                    .to_string()
            ]
        );
    }

    #[test]
    fn append_writes_header_once() {
        let (first, _) =
            append_rows(None, &[record("amy", 0, 0, 0)], "https://github.com").unwrap();
        let (second, appended) =
            append_rows(Some(first), &[record("bob", 0, 0, 0)], "https://github.com").unwrap();
        assert_eq!(appended, 1);

        let lines = lines(&second);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], LEDGER_HEADER.join(","));
        assert!(lines[1].starts_with("amy,"));
        assert!(lines[2].starts_with("bob,"));
    }

    #[test]
    fn append_repairs_missing_trailing_newline() {
        let existing = format!("{}\namy,,x,0,0,0,0,,,t", LEDGER_HEADER.join(",")).into_bytes();
        let (merged, _) =
            append_rows(Some(existing), &[record("bob", 0, 0, 0)], "https://github.com").unwrap();
        assert_eq!(lines(&merged).len(), 3);
    }

    #[test]
    fn replayed_batch_skips_recorded_logins() {
        let web = "https://github.com";
        let (first, _) = append_rows(None, &[record("amy", 0, 0, 0)], web).unwrap();

        let (second, appended) = append_rows(
            Some(first.clone()),
            &[record("amy", 0, 0, 0), record("bob", 0, 0, 0)],
            web,
        )
        .unwrap();
        assert_eq!(appended, 1);
        let lines = lines(&second);
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("bob,"));

        let (unchanged, appended) =
            append_rows(Some(first.clone()), &[record("amy", 0, 0, 0)], web).unwrap();
        assert_eq!(appended, 0);
        assert_eq!(unchanged, first);
    }

    #[test]
    fn recorded_logins_reads_first_column() {
        let (bytes, _) = append_rows(
            None,
            &[record("amy", 0, 0, 0), record("bob", 0, 0, 0)],
            "https://github.com",
        )
        .unwrap();
        let logins = recorded_logins(&bytes).unwrap();
        assert_eq!(logins.len(), 2);
        assert!(logins.contains("amy") && logins.contains("bob"));
    }
}
