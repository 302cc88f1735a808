//! Storage collaborators for cache entries
//!
//! The orchestrator only ever calls `get` and `set`. `remove` and `clear`
//! are exposed for callers that manage the cache themselves.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::config::schema::{CacheConfig, StorageBackend};
use crate::config::ConfigManager;
use crate::error::RestifyResult;
use crate::response::CacheEntry;
use async_trait::async_trait;
use std::sync::Arc;

/// Abstract key/value store for cache entries
///
/// Implementations must be safe to share across concurrent requests; the
/// core adds no locking of its own around a key.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the entry stored under `key`, if any
    async fn get(&self, key: &str) -> RestifyResult<Option<CacheEntry>>;

    /// Replace the entry stored under `key`
    async fn set(&self, key: &str, entry: &CacheEntry) -> RestifyResult<()>;

    /// Remove the entry stored under `key`
    async fn remove(&self, key: &str) -> RestifyResult<()>;

    /// Remove every entry
    async fn clear(&self) -> RestifyResult<()>;

    /// Human-readable backend name for display
    fn backend_name(&self) -> &'static str;
}

/// Create the storage backend selected by the cache configuration
pub async fn create_storage(config: &CacheConfig) -> RestifyResult<Arc<dyn Storage>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
        StorageBackend::File => {
            let dir = config.dir.clone().unwrap_or_else(ConfigManager::cache_dir);
            Ok(Arc::new(FileStorage::new(dir).await?))
        }
    }
}
