//! Scripted collaborators for unit tests

use crate::error::{RestifyError, RestifyResult};
use crate::response::{CacheEntry, Response};
use crate::storage::Storage;
use crate::transport::{Method, Transport};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub url: String,
    pub payload: Option<Value>,
}

/// Transport that replays queued results and records every call
#[derive(Default)]
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<RestifyResult<Response>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, result: RestifyResult<Response>) {
        self.queue.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        payload: Option<&Value>,
    ) -> RestifyResult<Response> {
        self.calls.lock().unwrap().push(Call {
            method,
            url: url.to_string(),
            payload: payload.cloned(),
        });
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Response::new(Value::Null)))
    }
}

/// Transport that answers with the requested url after a few scheduler turns
#[derive(Default)]
pub struct EchoTransport {
    calls: AtomicUsize,
}

impl EchoTransport {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for EchoTransport {
    async fn request(
        &self,
        _method: Method,
        url: &str,
        _payload: Option<&Value>,
    ) -> RestifyResult<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        Ok(Response::new(Value::String(url.to_string())))
    }
}

/// Storage whose every operation fails
pub struct FailingStorage;

#[async_trait]
impl Storage for FailingStorage {
    async fn get(&self, key: &str) -> RestifyResult<Option<CacheEntry>> {
        Err(RestifyError::storage(key, "disk unavailable"))
    }

    async fn set(&self, key: &str, _entry: &CacheEntry) -> RestifyResult<()> {
        Err(RestifyError::storage(key, "disk unavailable"))
    }

    async fn remove(&self, key: &str) -> RestifyResult<()> {
        Err(RestifyError::storage(key, "disk unavailable"))
    }

    async fn clear(&self) -> RestifyResult<()> {
        Err(RestifyError::storage("*", "disk unavailable"))
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}
