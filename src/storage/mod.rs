//! Storage abstractions for tracker state and artifacts.
//!
//! Three objects live under one root (a directory or an S3 prefix):
//!
//! ```text
//! {root}/
//! ├── {repo}_stargazers.json         # Snapshot: every known login, oldest first
//! ├── {repo}_stargazers_ledger.csv   # Ledger: every record ever discovered (append-only)
//! └── {repo}_stargazers_latest.csv   # Latest batch: this run's records (overwritten)
//! ```

pub mod ledger;
pub mod local;
#[cfg(test)]
pub(crate) mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Snapshot, StargazerRecord};

// Re-export for convenience
pub use local::LocalStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

/// Byte-level backend with snapshot and ledger operations layered on top.
///
/// Every write replaces a whole object, so a failed run never leaves a
/// partially written file behind.
#[async_trait]
pub trait StarStorage: Send + Sync {
    /// Read an object, returning `None` if it doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace an object in one step.
    async fn write_bytes(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Human-readable location of a key, for logs.
    fn location(&self, key: &str) -> String;

    /// Load the snapshot; a missing, empty or corrupt object is an empty snapshot.
    ///
    /// Errors other than absence (permissions, network) are returned so the
    /// run stops before it can overwrite history.
    async fn load_snapshot(&self, key: &str) -> Result<Snapshot> {
        let Some(bytes) = self.read_bytes(key).await? else {
            log::info!("No snapshot at {}, starting cold", self.location(key));
            return Ok(Snapshot::default());
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            log::warn!("Snapshot at {} is empty, starting cold", self.location(key));
            return Ok(Snapshot::default());
        }

        match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snapshot) => {
                log::info!(
                    "Loaded {} known stargazers from {}",
                    snapshot.len(),
                    self.location(key)
                );
                Ok(snapshot)
            }
            Err(e) => {
                log::warn!(
                    "Snapshot at {} is corrupt ({}), starting cold",
                    self.location(key),
                    e
                );
                Ok(Snapshot::default())
            }
        }
    }

    async fn write_snapshot(&self, key: &str, snapshot: &Snapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        self.write_bytes(key, bytes, "application/json").await?;
        log::info!(
            "Wrote snapshot of {} stargazers to {}",
            snapshot.len(),
            self.location(key)
        );
        Ok(())
    }

    /// Append records to the ledger, creating it with a header on first write.
    ///
    /// Logins the ledger already holds are skipped. Returns the number of rows
    /// appended; nothing is written when that is zero.
    async fn append_ledger(
        &self,
        key: &str,
        records: &[StargazerRecord],
        web_base: &str,
    ) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let existing = self.read_bytes(key).await?;
        let (bytes, appended) = ledger::append_rows(existing, records, web_base)?;
        if appended == 0 {
            log::info!("Ledger {} already holds this batch", self.location(key));
            return Ok(0);
        }
        self.write_bytes(key, bytes, "text/csv").await?;
        log::info!(
            "Appended {} row(s) to ledger {}",
            appended,
            self.location(key)
        );
        Ok(appended)
    }

    /// Overwrite the latest-batch file with exactly these records.
    async fn write_latest(
        &self,
        key: &str,
        records: &[StargazerRecord],
        web_base: &str,
    ) -> Result<()> {
        let bytes = ledger::encode_rows(records, web_base, true)?;
        self.write_bytes(key, bytes, "text/csv").await?;
        log::info!(
            "Wrote {} row(s) to latest batch {}",
            records.len(),
            self.location(key)
        );
        Ok(())
    }
}
