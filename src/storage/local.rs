//! Local filesystem storage implementation.
//!
//! Used by the CLI. Objects are files under a root directory, each written
//! through a temporary sibling and renamed into place.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::StarStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }
}

#[async_trait]
impl StarStorage for LocalStorage {
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write to `<key>.tmp`, then rename over the target.
    async fn write_bytes(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        self.path(key).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::Snapshot;
    use crate::models::fixtures::record;
    use crate::storage::ledger::LEDGER_HEADER;

    fn snapshot(logins: &[&str]) -> Snapshot {
        Snapshot::new(logins.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn missing_snapshot_is_empty() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let loaded = storage.load_snapshot("hello_stargazers.json").await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("s.json"), b"{not json").unwrap();
        let storage = LocalStorage::new(dir.path());

        assert!(storage.load_snapshot("s.json").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_snapshot_is_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("s.json"), b"  \n").unwrap();
        let storage = LocalStorage::new(dir.path());

        assert!(storage.load_snapshot("s.json").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn snapshot_roundtrips_as_json_array() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("nested"));
        let written = snapshot(&["a", "b", "c"]);

        storage.write_snapshot("s.json", &written).await.unwrap();

        let raw: Vec<String> =
            serde_json::from_slice(&std::fs::read(dir.path().join("nested/s.json")).unwrap())
                .unwrap();
        assert_eq!(raw, vec!["a", "b", "c"]);
        assert_eq!(storage.load_snapshot("s.json").await.unwrap(), written);
        assert!(!dir.path().join("nested/s.json.tmp").exists());
    }

    #[tokio::test]
    async fn ledger_accumulates_latest_overwrites() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let web = "https://github.com";

        storage
            .append_ledger("l.csv", &[record("amy", 0, 0, 0)], web)
            .await
            .unwrap();
        storage
            .append_ledger("l.csv", &[record("bob", 0, 0, 0)], web)
            .await
            .unwrap();
        storage
            .write_latest("n.csv", &[record("amy", 0, 0, 0)], web)
            .await
            .unwrap();
        storage
            .write_latest("n.csv", &[record("bob", 0, 0, 0)], web)
            .await
            .unwrap();

        let ledger = std::fs::read_to_string(dir.path().join("l.csv")).unwrap();
        let header = LEDGER_HEADER.join(",");
        assert_eq!(ledger.matches(&header).count(), 1);
        assert_eq!(ledger.lines().count(), 3);

        let latest = std::fs::read_to_string(dir.path().join("n.csv")).unwrap();
        assert_eq!(latest.lines().count(), 2);
        assert!(latest.contains("bob"));
        assert!(!latest.contains("amy"));
    }

    #[tokio::test]
    async fn empty_batch_leaves_ledger_absent() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        assert_eq!(
            storage
                .append_ledger("l.csv", &[], "https://github.com")
                .await
                .unwrap(),
            0
        );
        assert!(!dir.path().join("l.csv").exists());
    }
}
