//! Error types for Restify
//!
//! All modules use `RestifyResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Restify operations
pub type RestifyResult<T> = Result<T, RestifyError>;

/// All errors that can occur in Restify
#[derive(Error, Debug)]
pub enum RestifyError {
    // Construction errors
    #[error("Endpoint needed: set a base URL before issuing requests")]
    MissingEndpoint,

    #[error("Missing storage instance")]
    MissingStorage,

    #[error("Missing transport instance")]
    MissingTransport,

    // Configuration file errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Transport errors
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Connection error for {url}: {reason}")]
    Connection { url: String, reason: String },

    #[error("Failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("Shared fetch failed: {0}")]
    Coalesced(String),

    // Storage errors
    #[error("Storage error for key {key}: {reason}")]
    Storage { key: String, reason: String },

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl RestifyError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a storage error for a key
    pub fn storage(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Storage {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error came from the transport collaborator
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Connection { .. } | Self::Decode { .. } | Self::Coalesced(_)
        )
    }

    /// Check if the error came from the storage collaborator
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Io { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingEndpoint => {
                Some("Run: restify config set client.endpoint https://api.example.com/")
            }
            Self::MissingStorage => Some("Pass a Storage implementation to the builder"),
            Self::MissingTransport => Some("Pass a Transport implementation to the builder"),
            Self::ConfigInvalid { .. } => Some("Run: restify config init --force"),
            _ => None,
        }
    }
}
