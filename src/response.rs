//! Response envelope and persisted cache entries
//!
//! The core only understands the `data` field of a response. Everything
//! else a transport attaches is carried along opaquely, except the
//! transport-internal fields listed in [`TRANSPORT_FIELDS`], which are
//! stripped before anything is persisted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RestifyResult;

/// Top-level fields a transport may attach that must never be persisted
pub const TRANSPORT_FIELDS: &[&str] = &["config", "request"];

/// Fields stripped from a nested `response` object before persistence
pub const NESTED_RESPONSE_FIELDS: &[&str] = &["config", "data", "request"];

/// A transport response: the `data` payload plus opaque transport fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response body
    #[serde(default)]
    pub data: Value,

    /// Anything else the transport attached (status, headers, ...)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Response {
    /// Create a response carrying only a payload
    pub fn new(data: Value) -> Self {
        Self {
            data,
            fields: Map::new(),
        }
    }

    /// Attach an opaque field
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Look up an opaque field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether the payload counts as empty
    pub fn is_empty(&self) -> bool {
        is_empty_payload(&self.data)
    }

    /// Deserialize the payload into a caller type
    pub fn data_as<T: DeserializeOwned>(&self) -> RestifyResult<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    /// Strip transport-internal fields
    pub fn sanitize(mut self) -> Self {
        for name in TRANSPORT_FIELDS {
            self.fields.remove(*name);
        }
        if let Some(Value::Object(nested)) = self.fields.get_mut("response") {
            for name in NESTED_RESPONSE_FIELDS {
                nested.remove(*name);
            }
        }
        self
    }
}

/// A persisted cache entry, replaced wholesale on every write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Previously stored response body
    #[serde(default)]
    pub data: Value,

    /// Absolute expiry in whole seconds since the epoch (write time + TTL)
    #[serde(rename = "ttl")]
    pub expires_at: i64,

    /// Sanitized opaque fields stored alongside the payload
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CacheEntry {
    /// Build an entry from an already sanitized response
    pub fn new(response: Response, expires_at: i64) -> Self {
        Self {
            data: response.data,
            expires_at,
            fields: response.fields,
        }
    }

    /// Whether the entry is still fresh at `now`
    pub fn is_fresh(&self, now: i64) -> bool {
        now < self.expires_at
    }

    /// Whether the stored payload is non-empty
    pub fn has_data(&self) -> bool {
        !is_empty_payload(&self.data)
    }

    /// View the entry as a response for emission
    pub fn to_response(&self) -> Response {
        Response {
            data: self.data.clone(),
            fields: self.fields.clone(),
        }
    }
}

/// Emptiness rule shared by the orchestrator and the reconciler.
///
/// `null`, `""`, `[]` and `{}` are empty. Numbers and booleans are values.
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
