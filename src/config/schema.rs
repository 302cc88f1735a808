//! Configuration schema for Restify
//!
//! Configuration is stored at `~/.config/restify/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Remote endpoint and transport settings
    pub client: ClientConfig,

    /// Cache storage settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Remote endpoint and transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL prepended to every request path
    pub endpoint: String,

    /// Global request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent with each request
    pub user_agent: String,

    /// Share one network fetch between concurrent reads of the same key
    pub coalesce: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_secs: 30,
            user_agent: format!("restify/{}", env!("CARGO_PKG_VERSION")),
            coalesce: false,
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per key on disk
    #[default]
    File,
    /// Process memory, lost on exit
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(format!("Unknown cache backend '{}'. Valid: file, memory", other)),
        }
    }
}

/// Cache storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Storage backend
    pub backend: StorageBackend,

    /// Directory for the file backend (default: platform cache dir)
    pub dir: Option<PathBuf>,

    /// TTL applied when a request does not set one
    pub default_ttl_secs: u64,
}
