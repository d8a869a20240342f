//! In-memory [`ObjectStore`] for tests

use super::ObjectStore;
use crate::error::{Result, SdlError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    bucket: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    put_count: Mutex<usize>,
    fail_puts: AtomicBool,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn with_objects<K, V>(bucket: impl Into<String>, objects: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let store = Self::new(bucket);
        if let Ok(mut map) = store.objects.lock() {
            for (key, data) in objects {
                map.insert(
                    key.into(),
                    StoredObject {
                        data: data.into(),
                        content_type: None,
                    },
                );
            }
        }
        store
    }

    /// Make every subsequent `put` fail
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().ok()?.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of successful writes, counting overwrites
    pub fn put_count(&self) -> usize {
        self.put_count.lock().map(|count| *count).unwrap_or(0)
    }

    fn poisoned() -> SdlError {
        SdlError::storage("memory store lock poisoned")
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn location(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(SdlError::storage(format!(
                "Failed to upload s3://{}/{}: simulated outage",
                self.bucket, key
            )));
        }

        self.objects.lock().map_err(|_| Self::poisoned())?.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.map(str::to_string),
            },
        );
        *self.put_count.lock().map_err(|_| Self::poisoned())? += 1;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .map_err(|_| Self::poisoned())?
            .get(key)
            .map(|object| object.data.clone())
            .ok_or_else(|| SdlError::storage(format!("No such key: s3://{}/{}", self.bucket, key)))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .objects
            .lock()
            .map_err(|_| Self::poisoned())?
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
