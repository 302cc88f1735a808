//! Per-request options and the pending option store
//!
//! Options accumulate on the store through chained setters and are taken
//! as a snapshot by the next verb call, which leaves the store at its
//! defaults again. Chained configuration therefore applies to exactly one
//! request.

use crate::response::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Payload transform applied before emission or persistence
pub type Transform = Arc<dyn Fn(Response) -> Response + Send + Sync>;

/// Query predicate sent with find-style requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: String,
    pub value: Value,
}

impl Filter {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

/// Options for a single request
#[derive(Clone)]
pub struct RequestOptions {
    /// Seconds an entry stays fresh after it is written
    pub time_to_live: Option<u64>,
    /// Explicit cache key, derived when absent
    pub key: Option<String>,
    /// Query predicates, in insertion order
    pub filters: Vec<Filter>,
    /// Emit a stored entry before (or instead of) the network
    pub use_cache: Option<bool>,
    /// Skip the cache read and go straight to the network
    pub use_network: Option<bool>,
    /// Persist successful network responses
    pub save_network: bool,
    /// Applied to a sanitized response right before it is persisted
    pub transform_cache: Option<Transform>,
    /// Applied to every response right before it is emitted
    pub transform_network: Option<Transform>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            time_to_live: None,
            key: None,
            filters: Vec::new(),
            use_cache: None,
            use_network: None,
            save_network: true,
            transform_cache: None,
            transform_network: None,
        }
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("time_to_live", &self.time_to_live)
            .field("key", &self.key)
            .field("filters", &self.filters)
            .field("use_cache", &self.use_cache)
            .field("use_network", &self.use_network)
            .field("save_network", &self.save_network)
            .field("transform_cache", &self.transform_cache.is_some())
            .field("transform_network", &self.transform_network.is_some())
            .finish()
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_use_network(mut self, active: bool) -> Self {
        self.use_network = Some(active);
        self
    }

    pub fn with_save_network(mut self, active: bool) -> Self {
        self.save_network = active;
        self
    }

    pub fn with_use_cache(mut self, active: bool) -> Self {
        self.use_cache = Some(active);
        self
    }

    pub fn with_time_to_live(mut self, seconds: u64) -> Self {
        self.time_to_live = Some(seconds);
        self
    }

    pub fn with_key(mut self, name: impl Into<String>) -> Self {
        self.key = Some(name.into());
        self
    }

    pub fn with_filter(
        mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.filters.push(Filter::new(field, operator, value));
        self
    }

    pub fn with_transform_network<F>(mut self, transform: F) -> Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.transform_network = Some(Arc::new(transform));
        self
    }

    pub fn with_transform_cache<F>(mut self, transform: F) -> Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.transform_cache = Some(Arc::new(transform));
        self
    }

    /// Effective network-first flag
    pub fn network_first(&self) -> bool {
        self.use_network.unwrap_or(false)
    }

    /// Effective cache-emission flag
    pub fn cache_enabled(&self) -> bool {
        self.use_cache.unwrap_or(false)
    }

    /// Mutation verbs must neither read the cache nor be served from it
    pub fn force_network(&mut self) {
        self.use_network = Some(true);
        self.use_cache = Some(false);
    }

    /// Explicit key, if one was set and is non-empty
    pub fn explicit_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.is_empty())
    }

    pub(crate) fn shape_for_caller(&self, response: Response) -> Response {
        match &self.transform_network {
            Some(transform) => transform(response),
            None => response,
        }
    }

    pub(crate) fn shape_for_storage(&self, response: Response) -> Response {
        match &self.transform_cache {
            Some(transform) => transform(response),
            None => response,
        }
    }
}

/// Mutable accumulation point for the next request's options
#[derive(Debug, Default)]
pub struct OptionStore {
    pending: RequestOptions,
}

impl OptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the pending options and reset the store to defaults
    pub fn take(&mut self) -> RequestOptions {
        std::mem::take(&mut self.pending)
    }

    /// Options that the next request would use
    pub fn pending(&self) -> &RequestOptions {
        &self.pending
    }

    /// Replace the pending options wholesale
    pub fn replace(&mut self, options: RequestOptions) -> &mut Self {
        self.pending = options;
        self
    }

    pub fn use_network(&mut self, active: bool) -> &mut Self {
        self.pending.use_network = Some(active);
        self
    }

    pub fn save_network(&mut self, active: bool) -> &mut Self {
        self.pending.save_network = active;
        self
    }

    pub fn use_cache(&mut self, active: bool) -> &mut Self {
        self.pending.use_cache = Some(active);
        self
    }

    pub fn time_to_live(&mut self, seconds: u64) -> &mut Self {
        self.pending.time_to_live = Some(seconds);
        self
    }

    pub fn key(&mut self, name: impl Into<String>) -> &mut Self {
        self.pending.key = Some(name.into());
        self
    }

    pub fn filter(
        &mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.pending.filters.push(Filter::new(field, operator, value));
        self
    }

    pub fn transform_network(&mut self, transform: Transform) -> &mut Self {
        self.pending.transform_network = Some(transform);
        self
    }

    pub fn transform_cache(&mut self, transform: Transform) -> &mut Self {
        self.pending.transform_cache = Some(transform);
        self
    }
}
