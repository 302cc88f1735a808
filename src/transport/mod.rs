//! Transport collaborators
//!
//! A transport issues one request per call and resolves to a single
//! [`Response`] or an error. Retries and timeouts belong to the transport;
//! the orchestrator never retries.

mod http;

pub use http::HttpTransport;

use crate::config::schema::ClientConfig;
use crate::error::RestifyResult;
use crate::response::Response;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Request verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Delete => "delete",
        }
    }

    /// Whether the verb carries a request body
    pub fn has_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Abstract request transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `method` against the full `url` with an optional JSON payload
    async fn request(
        &self,
        method: Method,
        url: &str,
        payload: Option<&Value>,
    ) -> RestifyResult<Response>;
}

/// Create the HTTP transport described by the client configuration
pub fn create_transport(config: &ClientConfig) -> Arc<dyn Transport> {
    Arc::new(HttpTransport::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_display_and_body() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Delete.as_str(), "delete");
        assert!(Method::Put.has_body());
        assert!(!Method::Get.has_body());
    }

    #[test]
    fn method_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Method::Post).unwrap(), "\"post\"");
    }
}
