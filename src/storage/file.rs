//! File-backed storage with one JSON document per key

use crate::error::{RestifyError, RestifyResult};
use crate::response::CacheEntry;
use crate::storage::Storage;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Cache entries stored as `<sha256(key)>.json` inside a directory
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `dir`, creating it if needed
    pub async fn new(dir: impl Into<PathBuf>) -> RestifyResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            RestifyError::io(format!("creating cache directory {}", dir.display()), e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(&dir, perms)
                .map_err(|e| RestifyError::io("setting cache dir permissions", e))?;
        }

        Ok(Self { dir })
    }

    /// Directory holding the entries
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get(&self, key: &str) -> RestifyResult<Option<CacheEntry>> {
        let path = self.entry_path(key);

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| RestifyError::io(format!("reading cache file {}", path.display()), e))?;

        let entry: CacheEntry = serde_json::from_str(&content)
            .map_err(|e| RestifyError::storage(key, format!("corrupt entry: {}", e)))?;

        Ok(Some(entry))
    }

    async fn set(&self, key: &str, entry: &CacheEntry) -> RestifyResult<()> {
        let path = self.entry_path(key);
        let content = serde_json::to_string(entry)
            .map_err(|e| RestifyError::storage(key, format!("unserializable entry: {}", e)))?;

        // Each writer stages its own file; rename replaces the entry atomically
        let staging = path.with_extension(format!("json.{}.tmp", Uuid::new_v4()));
        fs::write(&staging, content)
            .await
            .map_err(|e| RestifyError::io(format!("writing cache file {}", staging.display()), e))?;

        if let Err(e) = fs::rename(&staging, &path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(RestifyError::io(
                format!("replacing cache file {}", path.display()),
                e,
            ));
        }

        debug!("Cached {} until {}", key, entry.expires_at);
        Ok(())
    }

    async fn remove(&self, key: &str) -> RestifyResult<()> {
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(&path).await.map_err(|e| {
                RestifyError::io(format!("removing cache file {}", path.display()), e)
            })?;
        }
        Ok(())
    }

    async fn clear(&self) -> RestifyResult<()> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| RestifyError::io("reading cache directory", e))?;

        let mut removed = 0usize;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RestifyError::io("reading cache entry", e))?
        {
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(entry.path())
                    .await
                    .map_err(|e| RestifyError::io("removing cache file", e))?;
                removed += 1;
            }
        }

        info!("Cleared {} cache entries from {}", removed, self.dir.display());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
