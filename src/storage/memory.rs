//! In-memory content store for tests and local development

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{ContentStore, Result, StorageError, StoreKey};

/// Map-backed store; `set_unavailable(true)` makes every read fail
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    documents: RwLock<HashMap<String, Bytes>>,
    unavailable: AtomicBool,
    reads: AtomicUsize,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &StoreKey, data: impl Into<Bytes>) {
        self.documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.as_str().to_string(), data.into());
    }

    pub fn insert_json<T: Serialize>(&self, key: &StoreKey, value: &T) {
        let data = serde_json::to_vec(value).unwrap_or_default();
        self.insert(key, data);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `get` calls served so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn get(&self, key: &StoreKey) -> Result<Option<Bytes>> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(key.to_string()));
        }

        let documents = self
            .documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(documents.get(key.as_str()).cloned())
    }

    fn url_for(&self, key: &StoreKey) -> String {
        format!("memory://{}", key)
    }
}
