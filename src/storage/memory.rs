//! In-memory storage for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::storage::StarStorage;

/// Object map with injectable read and write failures.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    writes: Mutex<Vec<String>>,
    fail_reads: bool,
    fail_writes_suffix: Option<String>,
}

impl MemoryStorage {
    pub fn with_object(self, key: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.into());
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_writes_to(mut self, suffix: &str) -> Self {
        self.fail_writes_suffix = Some(suffix.to_string());
        self
    }

    pub fn object(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Keys in write order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl StarStorage for MemoryStorage {
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.fail_reads {
            return Err(AppError::s3("service unavailable"));
        }
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    async fn write_bytes(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        if let Some(suffix) = &self.fail_writes_suffix {
            if key.ends_with(suffix.as_str()) {
                return Err(AppError::s3(format!("access denied: {key}")));
            }
        }
        self.writes.lock().unwrap().push(key.to_string());
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("memory://{key}")
    }
}
