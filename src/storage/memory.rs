//! In-process storage backend

use crate::error::RestifyResult;
use crate::response::CacheEntry;
use crate::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Storage backed by a map guarded by an async lock
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> RestifyResult<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, entry: &CacheEntry) -> RestifyResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), entry.clone());
        debug!("Stored entry {} until {}", key, entry.expires_at);
        Ok(())
    }

    async fn remove(&self, key: &str) -> RestifyResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> RestifyResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
